use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Light/dark visual mode of the host page.
///
/// Produced by the [`ThemeSource`](crate::theme_source::ThemeSource) and
/// read-only to every other component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// Both themes, in a stable order.
    pub const ALL: [Theme; 2] = [Theme::Light, Theme::Dark];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Theme::Light => 0,
            Theme::Dark => 1,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the page shows a static image or a video as its background.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMode {
    #[default]
    Image,
    Video,
}

impl fmt::Display for BackgroundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackgroundMode::Image => f.write_str("image"),
            BackgroundMode::Video => f.write_str("video"),
        }
    }
}

/// The persisted preference record: `{"mode": "image" | "video"}`.
///
/// Records written under the legacy `type` field name are still accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preference {
    #[serde(alias = "type")]
    pub mode: BackgroundMode,
}

/// Per-theme load status.
///
/// Transitions are monotonic within one attempt:
/// `Unloaded | Error -> Loading -> Loaded | Error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Error,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoadStatus::Unloaded => "unloaded",
            LoadStatus::Loading => "loading",
            LoadStatus::Loaded => "loaded",
            LoadStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// Static description of one theme's video: the path the locator is built
/// from and the text shown once it starts playing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoTemplate {
    /// Resource path, e.g. `/videos/sky-light.mp4`
    pub path: String,
    /// Human readable description shown in the "now playing" notification
    #[serde(default)]
    pub description: Option<String>,
}

impl VideoTemplate {
    pub const DEFAULT_DESCRIPTION: &'static str = "Video background";

    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn description(&self) -> &str {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(Self::DEFAULT_DESCRIPTION)
    }
}

/// One video template per theme.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeVideos {
    pub light: VideoTemplate,
    pub dark: VideoTemplate,
}

impl ThemeVideos {
    pub fn get(&self, theme: Theme) -> &VideoTemplate {
        match theme {
            Theme::Light => &self.light,
            Theme::Dark => &self.dark,
        }
    }
}

/// Snapshot of one theme's video resource as seen by the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoResource {
    pub theme: Theme,
    pub template: VideoTemplate,
    /// Locator cached for this session, if any
    pub resolved_url: Option<String>,
    pub status: LoadStatus,
}

/// The notification currently on screen.
#[derive(Clone, Debug)]
pub struct PendingNotification {
    pub id: u64,
    pub message: String,
    pub is_error: bool,
    pub created_at: Instant,
}
