//! Application constants
//!
//! Centralized location for the defaults shared by the client layers.

// Transport
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 1_000;

// Token lifecycle
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3_600;
pub const DEFAULT_REFRESH_THRESHOLD_SECS: u64 = 300;

// Composite import keys
pub const IMPORT_KEY_SEPARATOR: char = ':';
