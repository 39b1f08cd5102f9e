//! CLI command implementations
//!
//! Every command returns the process exit code:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Completed with record-level failures |
//! | 2 | Configuration error |
//! | 4 | Store connection or setup error |
//! | 5 | Fatal run error |
//! | 130 | Interrupted by a shutdown signal |

pub mod init;
pub mod sync;
pub mod validate;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_RECORD_FAILURES: i32 = 1;
pub const EXIT_CONFIG_ERROR: i32 = 2;
pub const EXIT_STORE_ERROR: i32 = 4;
pub const EXIT_FATAL: i32 = 5;
pub const EXIT_INTERRUPTED: i32 = 130;
