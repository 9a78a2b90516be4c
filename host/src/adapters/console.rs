use engine::model::{BackgroundMode, PendingNotification};
use engine::notification::NotificationDisplay;
use engine::player::{BackgroundSurface, toggle_label};
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Notifications printed to stdout as they appear.
///
/// Fades are logged only; the terminal has no notion of opacity.
#[derive(Debug, Default)]
pub struct ConsoleNotificationDisplay {
    visible: Mutex<HashMap<u64, String>>,
    out: Option<Arc<Mutex<Vec<u8>>>>,
}

impl ConsoleNotificationDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display writing into `buffer` instead of stdout.
    pub fn buffered(buffer: Arc<Mutex<Vec<u8>>>) -> Self {
        Self {
            visible: Mutex::new(HashMap::new()),
            out: Some(buffer),
        }
    }

    /// Messages currently on screen.
    pub fn visible(&self) -> Vec<String> {
        self.visible
            .lock()
            .map(|visible| visible.values().cloned().collect())
            .unwrap_or_default()
    }

    fn print(&self, line: &str) {
        match &self.out {
            Some(buffer) => {
                if let Ok(mut buffer) = buffer.lock() {
                    let _ = writeln!(buffer, "{line}");
                }
            }
            None => println!("{line}"),
        }
    }
}

impl NotificationDisplay for ConsoleNotificationDisplay {
    fn insert(&self, notification: &PendingNotification) {
        let marker = if notification.is_error { "!" } else { "*" };
        self.print(&format!("[{marker}] {}", notification.message));
        if let Ok(mut visible) = self.visible.lock() {
            visible.insert(notification.id, notification.message.clone());
        }
    }

    fn fade_in(&self, id: u64) {
        log::trace!("Notification {id} faded in");
    }

    fn fade_out(&self, id: u64) {
        log::trace!("Notification {id} fading out");
    }

    fn remove(&self, id: u64) {
        if let Ok(mut visible) = self.visible.lock() {
            visible.remove(&id);
        }
    }
}

/// Page surface reduced to log lines: the shown mode, the toggle label and
/// the loading indicator.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSurface {
    state: Arc<Mutex<SurfaceState>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceState {
    pub mode: BackgroundMode,
    pub loading: bool,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SurfaceState {
        self.state.lock().map(|s| *s).unwrap_or_default()
    }
}

impl BackgroundSurface for ConsoleSurface {
    fn show_mode(&mut self, mode: BackgroundMode) {
        if let Ok(mut state) = self.state.lock() {
            state.mode = mode;
        }
        log::info!("Showing {mode} background, toggle reads '{}'", toggle_label(mode));
    }

    fn set_loading(&mut self, loading: bool) {
        let changed = self
            .state
            .lock()
            .map(|mut state| std::mem::replace(&mut state.loading, loading) != loading)
            .unwrap_or(false);
        if changed {
            log::info!("Loading indicator {}", if loading { "shown" } else { "hidden" });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_notifications_are_printed_and_tracked() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let display = ConsoleNotificationDisplay::buffered(buffer.clone());

        display.insert(&PendingNotification {
            id: 7,
            message: "Video load timed out, switched back to static background".to_string(),
            is_error: true,
            created_at: Instant::now(),
        });
        assert_eq!(display.visible().len(), 1);

        display.remove(7);
        display.remove(7);
        assert!(display.visible().is_empty());

        let printed = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert_eq!(
            printed,
            "[!] Video load timed out, switched back to static background\n"
        );
    }

    #[test]
    fn test_surface_tracks_mode_and_loading() {
        let mut surface = ConsoleSurface::new();
        let observer = surface.clone();

        surface.show_mode(BackgroundMode::Video);
        surface.set_loading(true);
        assert_eq!(
            observer.state(),
            SurfaceState {
                mode: BackgroundMode::Video,
                loading: true
            }
        );

        surface.set_loading(false);
        assert!(!observer.state().loading);
    }
}
