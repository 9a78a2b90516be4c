use backdrop::config::{AppConfig, ConfigLoadResult, ConfigValidationError, load_config};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

mod config_helpers {
    use super::*;

    /// Writes `content` to `config.toml` in a fresh directory.
    pub fn write_config(content: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    pub fn load_ok(content: &str) -> Box<AppConfig> {
        let (_dir, path) = write_config(content);
        match load_config(&path) {
            ConfigLoadResult::Success(config) => config,
            ConfigLoadResult::LoadError(e) | ConfigLoadResult::DeserializeError(e) => {
                panic!("expected a valid config, got: {e}")
            }
        }
    }

    pub fn load_err(content: &str) -> String {
        let (_dir, path) = write_config(content);
        match load_config(&path) {
            ConfigLoadResult::Success(_) => panic!("expected the config to be rejected"),
            ConfigLoadResult::LoadError(e) | ConfigLoadResult::DeserializeError(e) => e,
        }
    }
}

use config_helpers::*;

mod loading {
    use super::*;

    #[test]
    fn test_full_config_is_read() {
        let config = load_ok(
            r#"
            [videos.light]
            path = "/media/sky-light.mp4"
            description = "Morning clouds"

            [videos.dark]
            path = "/media/sky-dark.mp4"

            [resolver]
            endpoint = "https://api.example.com/resolve"
            direct_base = "https://cdn.example.com"
            request_timeout_secs = 5

            [background]
            load_timeout_secs = 30
            revert_delay_ms = 2000
            notification_visible_ms = 4000
            prewarm = false

            [theme]
            file = "/tmp/theme"
            light_class = "theme-light"
            poll_interval_ms = 100

            [logging]
            level = "debug"
            file = "custom.log"
            "#,
        );

        let videos = config.videos();
        assert_eq!(videos.light.path, "/media/sky-light.mp4");
        assert_eq!(videos.light.description(), "Morning clouds");
        assert_eq!(videos.dark.description(), "Video background");

        assert_eq!(
            config.resolver().endpoint(),
            Some("https://api.example.com/resolve")
        );
        assert_eq!(config.resolver().direct_base(), "https://cdn.example.com");
        assert_eq!(config.resolver().request_timeout(), Duration::from_secs(5));

        let settings = config.controller_settings();
        assert_eq!(settings.load_timeout, Duration::from_secs(30));
        assert_eq!(settings.revert_delay, Duration::from_millis(2000));
        assert_eq!(settings.notification.visible_for, Duration::from_secs(4));
        assert!(!settings.prewarm);

        assert_eq!(config.theme().file(), Some(&PathBuf::from("/tmp/theme")));
        assert_eq!(config.theme().light_class(), "theme-light");
        assert_eq!(config.theme().poll_interval(), Duration::from_millis(100));
        assert_eq!(config.logging().level(), "debug");
        assert_eq!(config.logging().file(), Some("custom.log"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = load_ok("");

        assert!(config.resolver().endpoint().is_none());
        assert_eq!(config.background().load_timeout_secs(), 20);
        assert_eq!(config.background().revert_delay_ms(), 1500);
        assert!(config.background().prewarm());
        assert_eq!(config.logging().level(), "info");
        assert!(config.logging().file().is_none());
        assert!(config.preference().dir().is_none());
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(&dir.path().join("absent.toml"));
        assert!(matches!(result, ConfigLoadResult::LoadError(_)));
    }

    #[test]
    fn test_wrong_type_is_a_deserialize_error() {
        let message = load_err(
            r#"
            [background]
            prewarm = "sometimes"
            "#,
        );
        assert!(message.starts_with("Failed to deserialize config"));
    }
}

mod validation {
    use super::*;

    #[test]
    fn test_out_of_range_values_are_all_reported() {
        let message = load_err(
            r#"
            [background]
            load_timeout_secs = 0
            notification_visible_ms = 10

            [resolver]
            direct_base = "cdn.example.com"
            "#,
        );

        assert!(message.starts_with("Configuration validation failed"));
        assert!(message.contains("Video load timeout out of range!"));
        assert!(message.contains("Notification duration out of range!"));
        assert!(message.contains("resolver.direct_base"));
    }

    #[test]
    fn test_validate_lists_every_error() {
        let (_dir, path) = write_config(
            r#"
            [videos.light]
            path = "  "

            [theme]
            poll_interval_ms = 1

            [resolver]
            endpoint = "ftp://example.com"
            request_timeout_secs = 0
            "#,
        );
        let config: AppConfig = ::config::Config::builder()
            .add_source(::config::File::from(path.as_path()))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ConfigValidationError::EmptyVideoPath {
            theme: "light".to_string()
        }));
        assert!(errors.contains(&ConfigValidationError::RequestTimeout {
            configured: 0,
            limit: 60
        }));
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigValidationError::ThemePollInterval { configured: 1, .. }
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigValidationError::InvalidUrl { field, .. } if field == "resolver.endpoint"
        )));
    }
}
