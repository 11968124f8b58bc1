//! Standard exit codes (BSD sysexits.h compatible)

/// Successful termination
pub const OK: i32 = 0;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error (bad module configuration or broken contract)
pub const DATAERR: i32 = 65;

/// Cannot open input (no configuration files)
pub const NOINPUT: i32 = 66;

/// Service unavailable (module could not be downloaded or located)
pub const UNAVAILABLE: i32 = 69;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
