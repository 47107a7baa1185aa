pub mod operation;

pub use operation::JBangOperation;

use thiserror::Error;

/// Status reported when the operation succeeded.
pub const EXIT_SUCCESS: i32 = 0;

/// Status reported when no real exit code is available: precondition
/// failures and errors while launching or waiting on the child.
pub const EXIT_FAILURE: i32 = 1;

/// Failure raised by [`JBangOperation::execute`], carrying a process-style
/// exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("exit status {status}")]
pub struct ExitStatusError {
    status: i32,
}

impl ExitStatusError {
    pub fn new(status: i32) -> Self {
        Self { status }
    }

    pub fn failure() -> Self {
        Self::new(EXIT_FAILURE)
    }

    pub fn status(&self) -> i32 {
        self.status
    }

    /// `Err` for any non-zero status.
    pub fn throw_on_failure(status: i32) -> Result<(), Self> {
        if status == EXIT_SUCCESS {
            Ok(())
        } else {
            Err(Self::new(status))
        }
    }
}

impl From<ExitStatusError> for i32 {
    fn from(err: ExitStatusError) -> Self {
        err.status
    }
}
