use crate::model::PendingNotification;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Where notifications are actually rendered.
///
/// `remove` must tolerate ids that are already gone.
pub trait NotificationDisplay: Send + Sync {
    fn insert(&self, notification: &PendingNotification);
    fn fade_in(&self, id: u64);
    fn fade_out(&self, id: u64);
    fn remove(&self, id: u64);
}

/// Lifecycle timing of one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationTiming {
    /// Delay between insertion and the fade-in
    pub fade_in_delay: Duration,
    /// Time from insertion until the fade-out starts
    pub visible_for: Duration,
    /// Fade-out duration; the element is removed afterwards
    pub fade_out: Duration,
}

impl Default for NotificationTiming {
    fn default() -> Self {
        Self {
            fade_in_delay: Duration::from_millis(10),
            visible_for: Duration::from_secs(3),
            fade_out: Duration::from_millis(300),
        }
    }
}

/// Shows one transient notification at a time.
///
/// A new notification pre-empts the current one: its timers are cancelled and
/// its element removed before the new one is inserted. There is no queue.
pub struct NotificationPresenter {
    display: Arc<dyn NotificationDisplay>,
    timing: NotificationTiming,
    current: Arc<Mutex<Option<PendingNotification>>>,
    timers: Option<CancellationToken>,
    next_id: u64,
}

impl std::fmt::Debug for NotificationPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationPresenter")
            .field("timing", &self.timing)
            .field("current", &self.current())
            .finish()
    }
}

impl NotificationPresenter {
    pub fn new(display: Arc<dyn NotificationDisplay>, timing: NotificationTiming) -> Self {
        Self {
            display,
            timing,
            current: Arc::new(Mutex::new(None)),
            timers: None,
            next_id: 1,
        }
    }

    /// The notification on screen, if any.
    pub fn current(&self) -> Option<PendingNotification> {
        self.current.lock().ok().and_then(|current| current.clone())
    }

    /// Displays `message`, replacing whatever is on screen.
    ///
    /// Must be called from within a tokio runtime.
    pub fn show(&mut self, message: impl Into<String>, is_error: bool) {
        if let Some(timers) = self.timers.take() {
            timers.cancel();
        }
        if let Some(previous) = self.take_current() {
            self.display.remove(previous.id);
        }

        let notification = PendingNotification {
            id: self.next_id,
            message: message.into(),
            is_error,
            created_at: Instant::now(),
        };
        self.next_id += 1;

        if is_error {
            log::warn!("Notification: {}", notification.message);
        } else {
            log::info!("Notification: {}", notification.message);
        }

        self.display.insert(&notification);
        if let Ok(mut current) = self.current.lock() {
            *current = Some(notification.clone());
        }

        let cancel = CancellationToken::new();
        self.timers = Some(cancel.clone());
        let display = self.display.clone();
        let current = self.current.clone();
        let timing = self.timing;
        let id = notification.id;

        tokio::spawn(async move {
            let lifecycle = async {
                tokio::time::sleep(timing.fade_in_delay).await;
                display.fade_in(id);

                let remaining = timing.visible_for.saturating_sub(timing.fade_in_delay);
                tokio::time::sleep(remaining).await;
                display.fade_out(id);

                tokio::time::sleep(timing.fade_out).await;
                display.remove(id);
                if let Ok(mut current) = current.lock() {
                    if current.as_ref().is_some_and(|n| n.id == id) {
                        *current = None;
                    }
                }
            };

            tokio::select! {
                () = lifecycle => {},
                () = cancel.cancelled() => {}
            }
        });
    }

    fn take_current(&self) -> Option<PendingNotification> {
        self.current.lock().ok().and_then(|mut current| current.take())
    }
}

impl Drop for NotificationPresenter {
    fn drop(&mut self) {
        if let Some(timers) = self.timers.take() {
            timers.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Insert(u64, String, bool),
        FadeIn(u64),
        FadeOut(u64),
        Remove(u64),
    }

    #[derive(Default)]
    struct RecordingDisplay {
        ops: Mutex<Vec<Op>>,
    }

    impl RecordingDisplay {
        fn ops(&self) -> Vec<Op> {
            self.ops.lock().unwrap().clone()
        }
    }

    impl NotificationDisplay for RecordingDisplay {
        fn insert(&self, n: &PendingNotification) {
            self.ops
                .lock()
                .unwrap()
                .push(Op::Insert(n.id, n.message.clone(), n.is_error));
        }
        fn fade_in(&self, id: u64) {
            self.ops.lock().unwrap().push(Op::FadeIn(id));
        }
        fn fade_out(&self, id: u64) {
            self.ops.lock().unwrap().push(Op::FadeOut(id));
        }
        fn remove(&self, id: u64) {
            self.ops.lock().unwrap().push(Op::Remove(id));
        }
    }

    fn presenter() -> (NotificationPresenter, Arc<RecordingDisplay>) {
        let display = Arc::new(RecordingDisplay::default());
        (
            NotificationPresenter::new(display.clone(), NotificationTiming::default()),
            display,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_lifecycle() {
        let (mut presenter, display) = presenter();
        presenter.show("Clouds", false);
        assert_eq!(presenter.current().unwrap().message, "Clouds");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            display.ops(),
            vec![Op::Insert(1, "Clouds".to_string(), false), Op::FadeIn(1)]
        );

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(
            display.ops(),
            vec![
                Op::Insert(1, "Clouds".to_string(), false),
                Op::FadeIn(1),
                Op::FadeOut(1),
                Op::Remove(1),
            ]
        );
        assert!(presenter.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_notification_preempts_old() {
        let (mut presenter, display) = presenter();
        presenter.show("first", false);
        tokio::time::sleep(Duration::from_secs(1)).await;
        presenter.show("second", true);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let ops = display.ops();

        // The first notification never fades out on its own
        assert!(!ops.contains(&Op::FadeOut(1)));
        assert_eq!(
            ops,
            vec![
                Op::Insert(1, "first".to_string(), false),
                Op::FadeIn(1),
                Op::Remove(1),
                Op::Insert(2, "second".to_string(), true),
                Op::FadeIn(2),
                Op::FadeOut(2),
                Op::Remove(2),
            ]
        );
    }
}
