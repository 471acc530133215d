//! Verification errors

use std::time::Duration;
use thiserror::Error;

/// Why a verification did not pass
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// A step saw a different signal than it expected
    #[error("step {step}: expected {expected}, got {actual}")]
    UnexpectedSignal {
        step: usize,
        expected: String,
        actual: String,
    },

    /// The sequence did not reach the expected signals in time
    #[error("verification timed out after {after:?}")]
    Timeout { after: Duration },
}

impl VerifyError {
    pub(crate) fn unexpected(
        step: usize,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::UnexpectedSignal {
            step,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}
