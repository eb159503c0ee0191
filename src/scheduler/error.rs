//! Error types for the scheduler module

use crate::error::AppError;

/// Result type for scheduler operations
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;

/// Errors raised when building the scheduler or resolving a job name
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// No tokio runtime was available when the scheduler was built
    #[error("Scheduler requires a tokio runtime: {0}")]
    NoRuntime(String),

    /// Name that is not one of the three job identifiers
    #[error("Unknown monitoring job: {0}")]
    UnknownJobKind(String),
}

impl From<SchedulerError> for AppError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::UnknownJobKind(_) => AppError::NotFound(err.to_string()),
            SchedulerError::NoRuntime(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<tokio::runtime::TryCurrentError> for SchedulerError {
    fn from(err: tokio::runtime::TryCurrentError) -> Self {
        SchedulerError::NoRuntime(err.to_string())
    }
}

/// Failure reported by a monitoring check
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    /// The check ran and reported a failure
    #[error("Check failed: {0}")]
    Failed(String),

    /// The delegated endpoint answered with a non-success status
    #[error("Check endpoint {url} returned HTTP {status}")]
    Http { status: u16, url: String },

    /// The delegated endpoint could not be reached
    #[error("Check transport error: {0}")]
    Transport(String),

    /// The check did not finish in time
    #[error("Check timed out")]
    Timeout,
}

impl From<reqwest::Error> for CheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CheckError::Timeout
        } else {
            CheckError::Transport(err.to_string())
        }
    }
}
