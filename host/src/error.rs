use engine::common::{ControllerError, PreferenceError, ResolveError};

/// Application-wide error types for the headless runner.
///
/// The engine recovers from almost everything on its own (failed loads fall
/// back to the image background, broken storage to the default mode), so
/// these only cover start-up and the command loop.
///
/// # Error Categories
///
/// - [`Config`] - Configuration loading and validation errors
/// - [`Setup`] - Collaborators that could not be built (HTTP client, storage)
/// - [`Controller`] - The controller task stopped unexpectedly
/// - [`Io`] - Reading commands from stdin failed
///
/// [`Config`]: AppError::Config
/// [`Setup`]: AppError::Setup
/// [`Controller`]: AppError::Controller
/// [`Io`]: AppError::Io
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration file missing, malformed or out of range.
    ///
    /// Fatal at start-up; the message is already formatted for the user.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// A collaborator could not be constructed.
    #[error("Setup Error: {0}")]
    Setup(String),

    /// The controller no longer accepts commands.
    #[error("Controller Error: {0}")]
    Controller(#[from] ControllerError),

    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        AppError::Setup(err.to_string())
    }
}

impl From<PreferenceError> for AppError {
    fn from(err: PreferenceError) -> Self {
        AppError::Setup(err.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_convert() {
        let err: AppError = ResolveError::ClientCreation {
            reason: "no TLS backend".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Setup Error: HTTP client creation failed: no TLS backend"
        );

        let err: AppError = ControllerError::Stopped.into();
        assert!(matches!(err, AppError::Controller(ControllerError::Stopped)));
    }
}
