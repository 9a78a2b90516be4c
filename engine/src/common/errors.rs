use crate::model::{LoadStatus, Theme};
use thiserror::Error;

/// Errors raised while resolving a theme's video locator through the remote
/// indirection service.
///
/// None of these ever reach the user. The [`ResourceResolver`] catches every
/// variant and answers with the deterministic fallback locator instead; the
/// variants exist so the fallback can be logged with a precise reason.
///
/// # Error Categories
///
/// ## Transport Errors
/// - [`ClientCreation`] - The HTTP client could not be configured
/// - [`RequestFailed`] - The request never produced a response
/// - [`Status`] - The service answered with a non-success HTTP status
///
/// ## Payload Errors
/// - [`InvalidResponse`] - Body is not the expected JSON structure
/// - [`Unsuccessful`] - Body parsed but carries `success: false`
/// - [`MissingUrl`] - Body parsed, `success: true`, but no usable `data.url`
///
/// # Examples
///
/// ```no_run
/// use engine::common::errors::ResolveError;
///
/// fn describe(error: &ResolveError) -> &'static str {
///     match error {
///         ResolveError::RequestFailed { .. } | ResolveError::Status { .. } => "transport",
///         _ => "payload",
///     }
/// }
/// ```
///
/// [`ResourceResolver`]: crate::resolver::ResourceResolver
/// [`ClientCreation`]: ResolveError::ClientCreation
/// [`RequestFailed`]: ResolveError::RequestFailed
/// [`Status`]: ResolveError::Status
/// [`InvalidResponse`]: ResolveError::InvalidResponse
/// [`Unsuccessful`]: ResolveError::Unsuccessful
/// [`MissingUrl`]: ResolveError::MissingUrl
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The HTTP client could not be built.
    #[error("HTTP client creation failed: {reason}")]
    ClientCreation { reason: String },

    /// The request could not be sent or no response arrived.
    ///
    /// Covers DNS failures, refused connections and client-side timeouts.
    #[error("Request failed: {url} - {reason}")]
    RequestFailed { url: String, reason: String },

    /// The service answered with a non-success status code.
    #[error("Indirection service returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// The body is not the `{success, data: {url}}` structure.
    #[error("Invalid response: expected {expected}, got {actual}")]
    InvalidResponse { expected: String, actual: String },

    /// The body reports `success: false`.
    #[error("Indirection service reported failure for {path}")]
    Unsuccessful { path: String },

    /// `success: true` without a non-empty `data.url`.
    #[error("Indirection response for {path} carries no usable url")]
    MissingUrl { path: String },
}

/// Errors from the lightweight existence check used by pre-warming.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("Existence check failed: {url} - {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Existence check for {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Preference storage failures.
///
/// The [`PreferenceStore`](crate::preference::PreferenceStore) swallows these
/// after logging them: a broken storage backend degrades to the default mode
/// and never blocks a transition.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Preference storage unavailable: {0}")]
    Unavailable(String),

    #[error("Preference storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference record is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A status change that the tracker refused because it would break the
/// per-attempt transition order.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Invalid load status transition for {theme}: {from} -> {to}")]
pub struct StatusTransitionError {
    pub theme: Theme,
    pub from: LoadStatus,
    pub to: LoadStatus,
}

/// The external theme signal could not be read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ObserverError {
    #[error("Theme signal unreadable: {0}")]
    Unreadable(String),
}

/// Failures reported by a media player collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlayerError {
    #[error("Media load failed: {0}")]
    Load(String),

    #[error("Playback refused: {0}")]
    Playback(String),

    #[error("No source attached to the player")]
    NoSource,
}

/// Errors surfaced by the controller handle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControllerError {
    /// The controller task has stopped and no longer accepts commands.
    #[error("Background controller is no longer running")]
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_messages_name_the_target() {
        let err = ResolveError::Status {
            url: "https://pan.example/api/fs/link".to_string(),
            status: 502,
        };
        assert_eq!(
            err.to_string(),
            "Indirection service returned HTTP 502 for https://pan.example/api/fs/link"
        );

        let err = ResolveError::MissingUrl {
            path: "/videos/dark.mp4".to_string(),
        };
        assert!(err.to_string().contains("/videos/dark.mp4"));
    }

    #[test]
    fn test_transition_error_message() {
        let err = StatusTransitionError {
            theme: Theme::Dark,
            from: LoadStatus::Loaded,
            to: LoadStatus::Loading,
        };
        assert_eq!(
            err.to_string(),
            "Invalid load status transition for dark: loaded -> loading"
        );
    }

    #[test]
    fn test_preference_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PreferenceError = serde_err.into();
        assert!(matches!(err, PreferenceError::Malformed(_)));
    }
}
