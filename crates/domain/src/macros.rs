//! Macro for the enum-like string values the control API exchanges
//!
//! Scope, deploy type, environment type, task type and notification type are
//! all transmitted as upper-case GraphQL enum literals but written by users in
//! any case. The macro gives each type one canonical lower-case spelling for
//! `Display`/serde, a case-insensitive `FromStr`, and the upper-case wire
//! literal.
//!
//! # Example
//!
//! ```rust
//! use berth_domain::impl_wire_enum;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! pub enum Channel {
//!     Stable,
//!     Beta,
//! }
//!
//! impl_wire_enum!(Channel {
//!     Stable => "stable" / "STABLE",
//!     Beta => "beta" / "BETA",
//! });
//!
//! assert_eq!("BETA".parse::<Channel>(), Ok(Channel::Beta));
//! assert_eq!(Channel::Stable.as_wire(), "STABLE");
//! ```

/// Implements `Display`, `FromStr`, serde and wire-literal conversions for
/// enum-like values.
///
/// Parsing is case-insensitive and accepts either the canonical spelling or
/// the wire literal. Serialization always emits the canonical spelling.
#[macro_export]
macro_rules! impl_wire_enum {
    ($enum_name:ident { $($variant:ident => $str:literal / $wire:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$enum_name] = &[$($enum_name::$variant),+];

            /// Canonical lower-case spelling.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }

            /// Canonical spelling of `raw`, if it names a variant in any
            /// accepted spelling.
            pub fn canonical(raw: &str) -> ::core::option::Option<&'static str> {
                raw.parse::<Self>().ok().map(|value| value.as_str())
            }

            /// Literal the GraphQL schema expects.
            pub const fn as_wire(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                let lowered = s.trim().to_lowercase();
                $(
                    if lowered == $str || lowered == $wire.to_lowercase() {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }

        impl serde::Serialize for $enum_name {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::core::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $enum_name {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::core::result::Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}
