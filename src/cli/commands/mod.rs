//! CLI command implementations
//!
//! Commands return a process exit code: 0 on success, 2 for configuration
//! errors, 4 for checkpoint storage errors and 5 for anything fatal.

pub mod init;
pub mod replay;
pub mod status;
pub mod validate;

/// Successful run
pub const EXIT_OK: i32 = 0;
/// Configuration missing or invalid
pub const EXIT_CONFIG: i32 = 2;
/// Checkpoint storage unreachable or unreadable
pub const EXIT_STORAGE: i32 = 4;
/// Any other failure
pub const EXIT_FATAL: i32 = 5;
