use super::app::AppConfig;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid load_timeout_secs: {configured} (min: {min_limit}, max: {max_limit})")]
    LoadTimeout {
        configured: u64,
        min_limit: u64,
        max_limit: u64,
    },
    #[error("Invalid revert_delay_ms: {configured} (limit: {limit})")]
    RevertDelay { configured: u64, limit: u64 },
    #[error(
        "Invalid notification_visible_ms: {configured} (min: {min_limit}, max: {max_limit})"
    )]
    NotificationVisible {
        configured: u64,
        min_limit: u64,
        max_limit: u64,
    },
    #[error("Invalid request_timeout_secs: {configured} (min: 1, max: {limit})")]
    RequestTimeout { configured: u64, limit: u64 },
    #[error("Invalid poll_interval_ms: {configured} (min: {min_limit}, max: {max_limit})")]
    ThemePollInterval {
        configured: u64,
        min_limit: u64,
        max_limit: u64,
    },
    #[error("Empty video path for {theme} theme")]
    EmptyVideoPath { theme: String },
    #[error("Invalid {field}: '{value}' is not an http(s) URL")]
    InvalidUrl { field: String, value: String },
}

impl ConfigValidationError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigValidationError::LoadTimeout {
                configured,
                min_limit,
                max_limit,
            } => {
                format!(
                    "Video load timeout out of range!\n\n\
                    Your configured value: {configured} seconds\n\
                    Valid range: {min_limit} - {max_limit} seconds\n\n\
                    Please update background.load_timeout_secs in config.toml."
                )
            }
            ConfigValidationError::RevertDelay { configured, limit } => {
                format!(
                    "Revert delay too long!\n\n\
                    Your configured value: {configured} ms\n\
                    Recommended maximum: {limit} ms\n\n\
                    Please update background.revert_delay_ms in config.toml."
                )
            }
            ConfigValidationError::NotificationVisible {
                configured,
                min_limit,
                max_limit,
            } => {
                format!(
                    "Notification duration out of range!\n\n\
                    Your configured value: {configured} ms\n\
                    Valid range: {min_limit} - {max_limit} ms\n\n\
                    Please update background.notification_visible_ms in config.toml."
                )
            }
            ConfigValidationError::RequestTimeout { configured, limit } => {
                format!(
                    "Request timeout out of range!\n\n\
                    Your configured value: {configured} seconds\n\
                    Valid range: 1 - {limit} seconds\n\n\
                    Please update resolver.request_timeout_secs in config.toml."
                )
            }
            ConfigValidationError::ThemePollInterval {
                configured,
                min_limit,
                max_limit,
            } => {
                format!(
                    "Theme poll interval out of range!\n\n\
                    Your configured value: {configured} ms\n\
                    Valid range: {min_limit} - {max_limit} ms\n\n\
                    Please update theme.poll_interval_ms in config.toml."
                )
            }
            ConfigValidationError::EmptyVideoPath { theme } => {
                format!(
                    "Missing video path!\n\n\
                    The {theme} theme has no video configured.\n\n\
                    Please set videos.{theme}.path in config.toml."
                )
            }
            ConfigValidationError::InvalidUrl { field, value } => {
                format!(
                    "Invalid URL!\n\n\
                    Your configured value: {value}\n\n\
                    Please set {field} in config.toml to an http:// or https:// URL."
                )
            }
        }
    }
}

/// Configuration loading result
#[derive(Debug)]
pub enum ConfigLoadResult {
    Success(Box<AppConfig>),
    LoadError(String),
    DeserializeError(String),
}
