use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

pub mod app;
pub mod limits;
pub mod validation;

pub use app::AppConfig;
pub use validation::{ConfigLoadResult, ConfigValidationError};

/// Prefix of environment overrides, e.g. `BACKDROP__BACKGROUND__PREWARM=false`
pub const ENV_PREFIX: &str = "BACKDROP";

/// Global configuration, loaded once at start-up
static CONFIG: std::sync::OnceLock<ConfigLoadResult> = std::sync::OnceLock::new();

/// Loads `path` layered with `.env` and `BACKDROP__*` environment variables,
/// then validates the result.
pub fn load_config(path: &Path) -> ConfigLoadResult {
    dotenv::dotenv().ok();
    let env_source = Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true);

    // The file is mandatory so a typo in --config is reported instead of
    // silently running on defaults
    let file_source = File::from(path).required(true);

    let config = match Config::builder()
        .add_source(file_source)
        .add_source(env_source) // environment entries override file values when present
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            return ConfigLoadResult::LoadError(format!(
                "Configuration loading failed: {e}. Please check {} and environment variables.",
                path.display()
            ));
        }
    };

    match config.try_deserialize::<AppConfig>() {
        Ok(app_config) => {
            if let Err(validation_errors) = app_config.validate() {
                let error_messages: Vec<String> =
                    validation_errors.iter().map(|e| e.user_message()).collect();
                return ConfigLoadResult::DeserializeError(format!(
                    "Configuration validation failed:\n{}",
                    error_messages.join("\n\n")
                ));
            }
            ConfigLoadResult::Success(Box::new(app_config))
        }
        Err(e) => ConfigLoadResult::DeserializeError(format!("Failed to deserialize config: {e}")),
    }
}

/// Loads the global configuration from `path` on first call.
///
/// Later calls return the first result regardless of `path`.
pub fn init_config(path: &Path) -> &'static ConfigLoadResult {
    CONFIG.get_or_init(|| load_config(path))
}

/// The global configuration, if it was loaded successfully.
pub fn get_config() -> Option<&'static AppConfig> {
    match CONFIG.get() {
        Some(ConfigLoadResult::Success(config)) => Some(config),
        _ => None,
    }
}

/// Additional logging configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct LoggingConfig {
    level: Option<String>,
    file: Option<String>,
}

impl LoggingConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or("info")
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }
}
