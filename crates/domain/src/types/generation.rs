//! Schema generation of the remote control API

use crate::impl_wire_enum;

/// The two incompatible schema tiers the control API has shipped.
///
/// `Current` keys variable and task operations by project/environment
/// *name*; `Legacy` keys them by numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiGeneration {
    Legacy,
    Current,
}

impl_wire_enum!(ApiGeneration {
    Legacy => "legacy" / "LEGACY",
    Current => "current" / "CURRENT",
});

impl ApiGeneration {
    pub const fn is_current(self) -> bool {
        matches!(self, Self::Current)
    }
}
