//! Exit code constants for the bddap CLI.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments |
//! | 3 | `CONFIG` | Configuration file or backend construction error |
//! | 4 | `SPEC_NOT_FOUND` | Specification path missing or unreadable |
//! | 5 | `FEATURE_NOT_FOUND` | No feature with the requested name and category |
//! | 10 | `TIMEOUT` | A per-call timeout elapsed |
//! | 70 | `BACKEND_FAILURE` | Chat backend invocation failed |
//! | 71 | `CALLBACK_FAILURE` | Application callback failed |
//! | 130 | `CANCELLED` | Run cancelled |

/// Exit codes matching the documented exit code table.
///
/// Use the named constants, or [`as_i32()`](Self::as_i32) to get the numeric
/// value for `std::process::exit()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid or missing command-line arguments
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Configuration error - invalid file or missing backend configuration
    pub const CONFIG: ExitCode = ExitCode(3);

    /// Specification path missing or unreadable
    pub const SPEC_NOT_FOUND: ExitCode = ExitCode(4);

    /// Feature lookup miss
    pub const FEATURE_NOT_FOUND: ExitCode = ExitCode(5);

    /// Per-call timeout elapsed
    pub const TIMEOUT: ExitCode = ExitCode(10);

    /// Chat backend failure
    pub const BACKEND_FAILURE: ExitCode = ExitCode(70);

    /// Application callback failure
    pub const CALLBACK_FAILURE: ExitCode = ExitCode(71);

    /// Cancelled
    pub const CANCELLED: ExitCode = ExitCode(130);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}
