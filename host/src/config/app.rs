use super::{LoggingConfig, limits::*, validation::ConfigValidationError};
use engine::controller::ControllerSettings;
use engine::model::{ThemeVideos, VideoTemplate};
use engine::notification::NotificationTiming;
use engine::theme_source::DEFAULT_LIGHT_CLASS;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    videos: VideosConfig,
    #[serde(default)]
    resolver: ResolverConfig,
    #[serde(default)]
    background: BackgroundConfig,
    #[serde(default)]
    theme: ThemeConfig,
    #[serde(default)]
    preference: PreferenceConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl AppConfig {
    /// Validate the configuration against defined limits
    pub fn validate(&self) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        let load_timeout = self.background.load_timeout_secs();
        if !(MIN_LOAD_TIMEOUT_SECS..=MAX_LOAD_TIMEOUT_SECS).contains(&load_timeout) {
            errors.push(ConfigValidationError::LoadTimeout {
                configured: load_timeout,
                min_limit: MIN_LOAD_TIMEOUT_SECS,
                max_limit: MAX_LOAD_TIMEOUT_SECS,
            });
        }

        if self.background.revert_delay_ms() > MAX_REVERT_DELAY_MS {
            errors.push(ConfigValidationError::RevertDelay {
                configured: self.background.revert_delay_ms(),
                limit: MAX_REVERT_DELAY_MS,
            });
        }

        let visible = self.background.notification_visible_ms();
        if !(MIN_NOTIFICATION_VISIBLE_MS..=MAX_NOTIFICATION_VISIBLE_MS).contains(&visible) {
            errors.push(ConfigValidationError::NotificationVisible {
                configured: visible,
                min_limit: MIN_NOTIFICATION_VISIBLE_MS,
                max_limit: MAX_NOTIFICATION_VISIBLE_MS,
            });
        }

        let request_timeout = self.resolver.request_timeout_secs();
        if request_timeout == 0 || request_timeout > MAX_REQUEST_TIMEOUT_SECS {
            errors.push(ConfigValidationError::RequestTimeout {
                configured: request_timeout,
                limit: MAX_REQUEST_TIMEOUT_SECS,
            });
        }

        let poll = self.theme.poll_interval_ms();
        if !(MIN_THEME_POLL_INTERVAL_MS..=MAX_THEME_POLL_INTERVAL_MS).contains(&poll) {
            errors.push(ConfigValidationError::ThemePollInterval {
                configured: poll,
                min_limit: MIN_THEME_POLL_INTERVAL_MS,
                max_limit: MAX_THEME_POLL_INTERVAL_MS,
            });
        }

        for (theme, video) in [("light", &self.videos.light), ("dark", &self.videos.dark)] {
            if video.path.as_deref().is_some_and(|p| p.trim().is_empty()) {
                errors.push(ConfigValidationError::EmptyVideoPath {
                    theme: theme.to_string(),
                });
            }
        }

        if let Some(endpoint) = self.resolver.endpoint() {
            if !is_http_url(endpoint) {
                errors.push(ConfigValidationError::InvalidUrl {
                    field: "resolver.endpoint".to_string(),
                    value: endpoint.to_string(),
                });
            }
        }
        if !is_http_url(self.resolver.direct_base()) {
            errors.push(ConfigValidationError::InvalidUrl {
                field: "resolver.direct_base".to_string(),
                value: self.resolver.direct_base().to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn videos(&self) -> ThemeVideos {
        ThemeVideos {
            light: self.videos.light.template(DEFAULT_LIGHT_VIDEO),
            dark: self.videos.dark.template(DEFAULT_DARK_VIDEO),
        }
    }

    pub fn resolver(&self) -> &ResolverConfig {
        &self.resolver
    }

    pub fn background(&self) -> &BackgroundConfig {
        &self.background
    }

    pub fn theme(&self) -> &ThemeConfig {
        &self.theme
    }

    pub fn preference(&self) -> &PreferenceConfig {
        &self.preference
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    /// Controller settings derived from the `[background]` table.
    pub fn controller_settings(&self) -> ControllerSettings {
        let defaults = NotificationTiming::default();
        ControllerSettings {
            load_timeout: self.background.load_timeout(),
            revert_delay: self.background.revert_delay(),
            prewarm: self.background.prewarm(),
            notification: NotificationTiming {
                visible_for: self.background.notification_visible(),
                ..defaults
            },
        }
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

const DEFAULT_LIGHT_VIDEO: &str = "/videos/background-light.mp4";
const DEFAULT_DARK_VIDEO: &str = "/videos/background-dark.mp4";

/// `[videos]` table: one entry per theme
#[derive(Debug, Default, Deserialize)]
pub struct VideosConfig {
    #[serde(default)]
    light: VideoConfig,
    #[serde(default)]
    dark: VideoConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoConfig {
    path: Option<String>,
    description: Option<String>,
}

impl VideoConfig {
    fn template(&self, default_path: &str) -> VideoTemplate {
        let template = VideoTemplate::new(self.path.as_deref().unwrap_or(default_path));
        match &self.description {
            Some(description) => template.with_description(description.clone()),
            None => template,
        }
    }
}

/// `[resolver]` table
#[derive(Debug, Default, Deserialize)]
pub struct ResolverConfig {
    /// Indirection service; direct locators only when absent
    endpoint: Option<String>,
    direct_base: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl ResolverConfig {
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref().filter(|e| !e.trim().is_empty())
    }

    pub fn direct_base(&self) -> &str {
        self.direct_base
            .as_deref()
            .unwrap_or("http://localhost:8080")
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs.unwrap_or(10)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs())
    }
}

/// `[background]` table
#[derive(Debug, Default, Deserialize)]
pub struct BackgroundConfig {
    load_timeout_secs: Option<u64>,
    revert_delay_ms: Option<u64>,
    notification_visible_ms: Option<u64>,
    prewarm: Option<bool>,
}

impl BackgroundConfig {
    pub fn load_timeout_secs(&self) -> u64 {
        self.load_timeout_secs.unwrap_or(20)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs())
    }

    pub fn revert_delay_ms(&self) -> u64 {
        self.revert_delay_ms.unwrap_or(1500)
    }

    pub fn revert_delay(&self) -> Duration {
        Duration::from_millis(self.revert_delay_ms())
    }

    pub fn notification_visible_ms(&self) -> u64 {
        self.notification_visible_ms.unwrap_or(3000)
    }

    pub fn notification_visible(&self) -> Duration {
        Duration::from_millis(self.notification_visible_ms())
    }

    pub fn prewarm(&self) -> bool {
        self.prewarm.unwrap_or(true)
    }
}

/// `[theme]` table
#[derive(Debug, Default, Deserialize)]
pub struct ThemeConfig {
    /// File holding the page's class attribute (or just `light`/`dark`)
    file: Option<PathBuf>,
    /// Class list used when no file is configured
    classes: Option<String>,
    light_class: Option<String>,
    poll_interval_ms: Option<u64>,
}

impl ThemeConfig {
    pub fn file(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }

    pub fn classes(&self) -> &str {
        self.classes.as_deref().unwrap_or(DEFAULT_LIGHT_CLASS)
    }

    pub fn light_class(&self) -> &str {
        self.light_class.as_deref().unwrap_or(DEFAULT_LIGHT_CLASS)
    }

    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms.unwrap_or(250)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms())
    }
}

/// `[preference]` table
#[derive(Debug, Default, Deserialize)]
pub struct PreferenceConfig {
    /// Directory for the preference record; platform data dir when absent
    dir: Option<PathBuf>,
}

impl PreferenceConfig {
    pub fn dir(&self) -> Option<&PathBuf> {
        self.dir.as_ref()
    }
}
