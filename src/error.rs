//! Error types for the modifier tap.

use thiserror::Error;

/// Result type alias for flagtap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while installing or running the tap.
#[derive(Debug, Error)]
pub enum Error {
    /// The platform refused to create the event tap.
    ///
    /// Usually missing privileges or Accessibility permission. Fatal at startup.
    #[error("failed to create event tap: {0}")]
    RegistrationDenied(String),

    /// The run loop or its source could not be set up.
    #[error("run loop error: {0}")]
    RunLoop(String),

    /// Failed to inject a synthetic key event.
    #[error("failed to inject key event: {0}")]
    InjectFailed(String),

    /// A tap is already installed in this process.
    #[error("event tap is already running")]
    AlreadyRunning,

    /// The requested feature is not supported on this platform.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Thread-related error.
    #[error("thread error: {0}")]
    ThreadError(String),
}

impl Error {
    /// Process exit status to report for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
