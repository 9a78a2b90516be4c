use crate::common::ObserverError;
use crate::model::Theme;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Class the page puts on its root element in light mode.
pub const DEFAULT_LIGHT_CLASS: &str = "hope-ui-light";

/// Raw, external theme signal (a class attribute, a file, a system setting).
pub trait ThemeSignal: Send + Sync {
    fn read(&self) -> Result<Theme, ObserverError>;
}

/// Callback invoked with the new theme after a real change.
pub type ThemeChangeHandler = Arc<dyn Fn(Theme) + Send + Sync>;

struct SourceState {
    last_reported: Theme,
    handler: Option<ThemeChangeHandler>,
}

/// Deduplicating view over a [`ThemeSignal`].
///
/// The underlying signal mutates far more often than the theme changes, so
/// [`notify_mutation`](Self::notify_mutation) re-reads it and only calls the
/// handler when the theme differs from the last one reported. One handler is
/// active at a time.
pub struct ThemeSource {
    signal: Arc<dyn ThemeSignal>,
    state: Mutex<SourceState>,
}

impl std::fmt::Debug for ThemeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeSource")
            .field("last_reported", &self.last_reported())
            .finish()
    }
}

impl ThemeSource {
    /// Creates a source, taking the initial theme from the signal.
    ///
    /// An unreadable signal at start-up falls back to [`Theme::Dark`], which
    /// is what the page shows when the light class is missing.
    pub fn new(signal: Arc<dyn ThemeSignal>) -> Self {
        let initial = signal.read().unwrap_or_else(|e| {
            log::error!("Theme signal unreadable at start-up, assuming dark: {e}");
            Theme::Dark
        });
        Self {
            signal,
            state: Mutex::new(SourceState {
                last_reported: initial,
                handler: None,
            }),
        }
    }

    /// Current theme, read straight from the signal. Falls back to the last
    /// reported theme when the signal cannot be read.
    pub fn current(&self) -> Theme {
        match self.signal.read() {
            Ok(theme) => theme,
            Err(e) => {
                log::error!("Theme signal unreadable, keeping last known theme: {e}");
                self.last_reported()
            }
        }
    }

    /// Registers `handler`, disposing of any previously registered one.
    pub fn on_change<F>(&self, handler: F)
    where
        F: Fn(Theme) + Send + Sync + 'static,
    {
        let Ok(mut state) = self.state.lock() else {
            log::error!("Theme source state poisoned, handler not registered");
            return;
        };
        if state.handler.is_some() {
            log::debug!("Replacing previous theme change handler");
        }
        state.handler = Some(Arc::new(handler));
    }

    /// Drops the registered handler, if any.
    pub fn unsubscribe(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.handler = None;
        }
    }

    /// Called whenever the watched signal may have mutated.
    ///
    /// Returns the new theme when it changed and a handler was invoked or
    /// would have been.
    pub fn notify_mutation(&self) -> Option<Theme> {
        let theme = match self.signal.read() {
            Ok(theme) => theme,
            Err(e) => {
                log::error!("Theme signal unreadable, ignoring mutation: {e}");
                return None;
            }
        };

        let handler = {
            let Ok(mut state) = self.state.lock() else {
                log::error!("Theme source state poisoned, ignoring mutation");
                return None;
            };
            if state.last_reported == theme {
                return None;
            }
            log::info!("Theme changed: {} -> {theme}", state.last_reported);
            state.last_reported = theme;
            state.handler.clone()
        };

        // Invoke outside the lock so the handler may call back into the source
        if let Some(handler) = handler {
            handler(theme);
        }
        Some(theme)
    }

    /// Polls the signal every `interval` until `cancel` fires.
    pub fn watch(self: Arc<Self>, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.notify_mutation();
                    }
                    () = cancel.cancelled() => {
                        log::debug!("Theme watcher stopped");
                        break;
                    }
                }
            }
        })
    }

    fn last_reported(&self) -> Theme {
        self.state
            .lock()
            .map(|state| state.last_reported)
            .unwrap_or(Theme::Dark)
    }
}

/// Theme signal backed by a class attribute value such as
/// `"hope-ui hope-ui-light"`.
///
/// The theme is light when the class list contains the light class and dark
/// otherwise.
#[derive(Debug, Clone)]
pub struct ClassListSignal {
    classes: Arc<RwLock<String>>,
    light_class: String,
}

impl ClassListSignal {
    pub fn new(initial: impl Into<String>) -> Self {
        Self::with_light_class(initial, DEFAULT_LIGHT_CLASS)
    }

    pub fn with_light_class(initial: impl Into<String>, light_class: impl Into<String>) -> Self {
        Self {
            classes: Arc::new(RwLock::new(initial.into())),
            light_class: light_class.into(),
        }
    }

    /// Replaces the class attribute value.
    pub fn set(&self, classes: impl Into<String>) {
        if let Ok(mut current) = self.classes.write() {
            *current = classes.into();
        }
    }

    /// Maps a class attribute value to a theme.
    pub fn classify(classes: &str, light_class: &str) -> Theme {
        if classes.split_whitespace().any(|c| c == light_class) {
            Theme::Light
        } else {
            Theme::Dark
        }
    }
}

impl ThemeSignal for ClassListSignal {
    fn read(&self) -> Result<Theme, ObserverError> {
        let classes = self
            .classes
            .read()
            .map_err(|e| ObserverError::Unreadable(e.to_string()))?;
        Ok(Self::classify(&classes, &self.light_class))
    }
}
