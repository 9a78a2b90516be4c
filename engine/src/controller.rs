//! The background-mode state machine.
//!
//! [`BackgroundController`] owns every piece of mutable state (mode, per-theme
//! status, timers, the player) and runs as a single tokio task that processes
//! [`Event`]s in arrival order. Network work and timers run in spawned tasks
//! and report back as events, so the controller never blocks on them.
//!
//! Two guards keep late results from corrupting newer state:
//! - every player signal and timer carries the *epoch* it was issued under;
//!   the epoch is bumped whenever the attached source changes or the
//!   controller leaves a pending/active state, and stale epochs are ignored;
//! - resolve/probe results carry an attempt id matched against the single
//!   in-flight attempt recorded for their theme.

use crate::common::{ControllerError, ProbeError};
use crate::model::{BackgroundMode, LoadStatus, Theme, VideoResource};
use crate::notification::{NotificationDisplay, NotificationPresenter, NotificationTiming};
use crate::player::{BackgroundSurface, MediaPlayer, PlayerEvent, PlayerEvents};
use crate::preference::PreferenceStore;
use crate::probe::ResourceProbe;
use crate::resolver::ResourceResolver;
use crate::status::LoadStatusTracker;
use crate::taskpool::TaskPool;
use crate::theme_source::ThemeSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Concurrent network requests (resolutions and probes) the controller runs.
const MAX_CONCURRENT_REQUESTS: usize = 4;

const TIMEOUT_MESSAGE: &str = "Video load timed out";
const LOAD_ERROR_MESSAGE: &str = "Video failed to load";
const PLAYBACK_ERROR_MESSAGE: &str = "Video playback failed";
const RETRY_MESSAGE: &str = "Previous video load failed, retrying...";
const PLAY_REFUSED_MESSAGE: &str = "Video playback failed, please try again later";

/// Timing and behaviour knobs of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Bounded wait from entering `VideoPending` until the source reports
    /// loaded or failed
    pub load_timeout: Duration,
    /// Delay between a failure notification and the return to image mode
    pub revert_delay: Duration,
    /// Check the current theme's resource in the background while in image mode
    pub prewarm: bool,
    pub notification: NotificationTiming,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_secs(20),
            revert_delay: Duration::from_millis(1500),
            prewarm: true,
            notification: NotificationTiming::default(),
        }
    }
}

/// Externally visible controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundState {
    Image,
    VideoPending(Theme),
    VideoActive(Theme),
}

impl BackgroundState {
    pub fn mode(&self) -> BackgroundMode {
        match self {
            BackgroundState::Image => BackgroundMode::Image,
            _ => BackgroundMode::Video,
        }
    }
}

/// Point-in-time view of the controller, taken after every earlier command
/// has been processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub state: BackgroundState,
    pub mode: BackgroundMode,
    pub resources: Vec<VideoResource>,
}

impl ControllerSnapshot {
    pub fn resource(&self, theme: Theme) -> Option<&VideoResource> {
        self.resources.iter().find(|r| r.theme == theme)
    }

    pub fn status(&self, theme: Theme) -> LoadStatus {
        self.resource(theme)
            .map(|r| r.status)
            .unwrap_or(LoadStatus::Unloaded)
    }
}

/// Everything the controller talks to.
pub struct Collaborators {
    pub preferences: PreferenceStore,
    pub theme_source: Arc<ThemeSource>,
    pub resolver: ResourceResolver,
    /// Existence check used for pre-warming; `None` disables pre-warming
    pub probe: Option<Arc<dyn ResourceProbe>>,
    pub player: Box<dyn MediaPlayer>,
    pub surface: Box<dyn BackgroundSurface>,
    pub notifications: Arc<dyn NotificationDisplay>,
}

#[derive(Debug)]
pub(crate) enum Event {
    Toggle,
    ThemeChanged(Theme),
    Resolved {
        theme: Theme,
        attempt: u64,
        url: String,
    },
    Probed {
        theme: Theme,
        attempt: u64,
        url: String,
        result: Result<(), ProbeError>,
    },
    Player {
        epoch: u64,
        event: PlayerEvent,
    },
    LoadTimedOut {
        epoch: u64,
    },
    Revert {
        epoch: u64,
    },
    Snapshot(oneshot::Sender<ControllerSnapshot>),
    Shutdown,
}

/// Internal stage; finer grained than [`BackgroundState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Image,
    /// Waiting for the theme's in-flight resolution or probe, bounded wait armed
    Resolving(Theme),
    /// Source attached, same bounded wait still running
    Loading(Theme),
    Active(Theme),
    /// Failure shown, waiting for the delayed return to image mode
    Failed { theme: Theme, was_active: bool },
}

impl Stage {
    fn public(&self) -> BackgroundState {
        match *self {
            Stage::Image => BackgroundState::Image,
            Stage::Resolving(theme) | Stage::Loading(theme) => BackgroundState::VideoPending(theme),
            Stage::Failed {
                theme,
                was_active: false,
            } => BackgroundState::VideoPending(theme),
            Stage::Active(theme)
            | Stage::Failed {
                theme,
                was_active: true,
            } => BackgroundState::VideoActive(theme),
        }
    }

    fn pending_theme(&self) -> Option<Theme> {
        match *self {
            Stage::Resolving(theme) | Stage::Loading(theme) => Some(theme),
            _ => None,
        }
    }
}

/// Handle used to drive a running controller.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<Event>,
    state: watch::Receiver<BackgroundState>,
}

impl ControllerHandle {
    /// Switches between image and video background.
    pub fn toggle(&self) -> Result<(), ControllerError> {
        self.send(Event::Toggle)
    }

    /// Latest published state.
    pub fn state(&self) -> BackgroundState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<BackgroundState> {
        self.state.clone()
    }

    /// Full snapshot, taken after all previously sent commands were handled.
    pub async fn snapshot(&self) -> Result<ControllerSnapshot, ControllerError> {
        let (reply, response) = oneshot::channel();
        self.send(Event::Snapshot(reply))?;
        response.await.map_err(|_| ControllerError::Stopped)
    }

    /// Stops the controller task.
    pub fn shutdown(&self) -> Result<(), ControllerError> {
        self.send(Event::Shutdown)
    }

    fn send(&self, event: Event) -> Result<(), ControllerError> {
        self.tx.send(event).map_err(|_| ControllerError::Stopped)
    }
}

/// Orchestrates mode transitions, resolution, bounded loads and recovery.
pub struct BackgroundController {
    settings: ControllerSettings,
    preferences: PreferenceStore,
    theme_source: Arc<ThemeSource>,
    resolver: ResourceResolver,
    probe: Option<Arc<dyn ResourceProbe>>,
    player: Box<dyn MediaPlayer>,
    surface: Box<dyn BackgroundSurface>,
    notifications: NotificationPresenter,
    tracker: LoadStatusTracker,
    tasks: TaskPool,

    mode: BackgroundMode,
    stage: Stage,
    epoch: u64,
    next_attempt: u64,
    in_flight: [Option<u64>; 2],
    timer: Option<CancellationToken>,

    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    state_tx: watch::Sender<BackgroundState>,
}

impl std::fmt::Debug for BackgroundController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundController")
            .field("mode", &self.mode)
            .field("stage", &self.stage)
            .field("epoch", &self.epoch)
            .field("tracker", &self.tracker)
            .finish()
    }
}

impl BackgroundController {
    pub fn new(settings: ControllerSettings, collaborators: Collaborators) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(BackgroundState::Image);

        Self {
            settings,
            preferences: collaborators.preferences,
            theme_source: collaborators.theme_source,
            resolver: collaborators.resolver,
            probe: collaborators.probe,
            player: collaborators.player,
            surface: collaborators.surface,
            notifications: NotificationPresenter::new(
                collaborators.notifications,
                settings.notification,
            ),
            tracker: LoadStatusTracker::new(),
            tasks: TaskPool::new(MAX_CONCURRENT_REQUESTS),
            mode: BackgroundMode::Image,
            stage: Stage::Image,
            epoch: 0,
            next_attempt: 1,
            in_flight: [None; 2],
            timer: None,
            events_tx,
            events_rx,
            state_tx,
        }
    }

    /// Starts the controller on the current tokio runtime.
    ///
    /// Reads the stored preference, subscribes to theme changes and, when the
    /// preference is video, immediately attempts the current theme's video.
    pub fn spawn(mut self) -> (ControllerHandle, JoinHandle<()>) {
        let handle = ControllerHandle {
            tx: self.events_tx.clone(),
            state: self.state_tx.subscribe(),
        };

        let join = tokio::spawn(async move {
            self.start().await;
            self.run().await;
        });

        (handle, join)
    }

    async fn start(&mut self) {
        let theme_tx = self.events_tx.clone();
        self.theme_source.on_change(move |theme| {
            if theme_tx.send(Event::ThemeChanged(theme)).is_err() {
                log::debug!("Theme change dropped, controller has stopped");
            }
        });

        let stored = self.preferences.load();
        let theme = self.theme_source.current();
        log::info!("Background controller starting: preference {stored}, theme {theme}");

        match stored {
            BackgroundMode::Video => {
                self.mode = BackgroundMode::Video;
                self.surface.show_mode(BackgroundMode::Video);
                self.enter_video(theme).await;
            }
            BackgroundMode::Image => {
                self.surface.show_mode(BackgroundMode::Image);
                self.prewarm(theme);
            }
        }
        self.publish();
    }

    async fn run(&mut self) {
        while let Some(event) = self.events_rx.recv().await {
            if matches!(event, Event::Shutdown) {
                break;
            }
            self.handle(event).await;
            self.publish();
        }

        self.theme_source.unsubscribe();
        self.cancel_timer();
        log::info!("Background controller stopped");
    }

    async fn handle(&mut self, event: Event) {
        match event {
            Event::Toggle => self.toggle().await,
            Event::ThemeChanged(theme) => self.on_theme_changed(theme).await,
            Event::Resolved {
                theme,
                attempt,
                url,
            } => self.on_resolved(theme, attempt, url),
            Event::Probed {
                theme,
                attempt,
                url,
                result,
            } => self.on_probed(theme, attempt, url, result),
            Event::Player { epoch, event } => {
                if epoch != self.epoch {
                    log::debug!("Discarding stale player event {event:?} (epoch {epoch})");
                    return;
                }
                self.on_player_event(event);
            }
            Event::LoadTimedOut { epoch } => {
                if epoch != self.epoch {
                    log::debug!("Discarding stale load timeout (epoch {epoch})");
                    return;
                }
                self.on_load_timeout();
            }
            Event::Revert { epoch } => {
                if epoch != self.epoch {
                    log::debug!("Discarding stale revert (epoch {epoch})");
                    return;
                }
                self.on_revert();
            }
            Event::Snapshot(reply) => {
                let snapshot = self.snapshot().await;
                let _ = reply.send(snapshot);
            }
            Event::Shutdown => {}
        }
    }

    async fn toggle(&mut self) {
        match self.mode {
            BackgroundMode::Image => {
                self.mode = BackgroundMode::Video;
                self.preferences.save(BackgroundMode::Video);
                self.surface.show_mode(BackgroundMode::Video);
                let theme = self.theme_source.current();
                self.enter_video(theme).await;
            }
            BackgroundMode::Video => {
                self.leave_video();
                self.preferences.save(BackgroundMode::Image);
            }
        }
    }

    async fn on_theme_changed(&mut self, theme: Theme) {
        match self.stage {
            Stage::Image => self.prewarm(theme),
            Stage::Resolving(current) | Stage::Loading(current) if current == theme => {}
            Stage::Active(current) if current == theme => {}
            Stage::Resolving(_) | Stage::Loading(_) => {
                self.abandon_pending();
                self.enter_video(theme).await;
            }
            Stage::Active(previous) => {
                log::info!("Theme changed while playing {previous} video, switching to {theme}");
                self.player.pause();
                self.enter_video(theme).await;
            }
            Stage::Failed { .. } => {
                log::debug!("Ignoring theme change to {theme} while reverting to image mode");
            }
        }
    }

    /// Moves into `VideoPending(theme)` (or straight to `VideoActive` for a
    /// theme already verified this session).
    async fn enter_video(&mut self, theme: Theme) {
        self.bump_epoch();
        self.cancel_timer();

        match self.tracker.status(theme) {
            LoadStatus::Loaded => {
                let url = self.resolver.resolve(theme).await;
                log::info!("Using verified {theme} video");
                self.attach(&url);
                self.stage = Stage::Active(theme);
                self.surface.set_loading(false);
                self.start_playback();
            }
            LoadStatus::Loading if self.in_flight[theme.index()].is_some() => {
                log::debug!("Joining in-flight work for {theme} video");
                self.stage = Stage::Resolving(theme);
                self.surface.set_loading(true);
                self.arm_load_timeout();
            }
            LoadStatus::Loading => {
                log::warn!("{theme} video marked loading with nothing in flight, restarting");
                let _ = self.tracker.release(theme);
                self.begin_attempt(theme).await;
            }
            LoadStatus::Unloaded | LoadStatus::Error => self.begin_attempt(theme).await,
        }
    }

    async fn begin_attempt(&mut self, theme: Theme) {
        if self.tracker.status(theme) == LoadStatus::Error {
            self.notifications.show(RETRY_MESSAGE, true);
            self.resolver.invalidate(theme).await;
        }
        if let Err(e) = self.tracker.mark_loading(theme) {
            log::error!("Cannot start {theme} video attempt: {e}");
            return;
        }

        let attempt = self.new_attempt(theme);
        self.stage = Stage::Resolving(theme);
        self.surface.set_loading(true);
        self.arm_load_timeout();

        let resolver = self.resolver.clone();
        let tx = self.events_tx.clone();
        self.tasks.execute(async move {
            let url = resolver.resolve(theme).await;
            let _ = tx.send(Event::Resolved {
                theme,
                attempt,
                url,
            });
        });
    }

    /// Background existence check of `theme`'s resource; failures stay silent.
    ///
    /// Only untouched themes are checked. A theme in `error` waits for an
    /// explicit attempt, which announces the retry.
    fn prewarm(&mut self, theme: Theme) {
        if !self.settings.prewarm || self.tracker.status(theme) != LoadStatus::Unloaded {
            return;
        }
        let Some(probe) = self.probe.clone() else {
            return;
        };

        if let Err(e) = self.tracker.mark_loading(theme) {
            log::error!("Cannot pre-warm {theme} video: {e}");
            return;
        }
        log::debug!("Pre-warming {theme} video");

        let attempt = self.new_attempt(theme);
        let resolver = self.resolver.clone();
        let tx = self.events_tx.clone();
        self.tasks.execute(async move {
            let url = resolver.resolve(theme).await;
            let result = probe.exists(&url).await;
            let _ = tx.send(Event::Probed {
                theme,
                attempt,
                url,
                result,
            });
        });
    }

    fn on_resolved(&mut self, theme: Theme, attempt: u64, url: String) {
        if !self.finish_attempt(theme, attempt) {
            return;
        }

        if self.stage == Stage::Resolving(theme) {
            // The bounded wait armed on entry keeps running
            log::debug!("Attaching {theme} video");
            self.attach(&url);
            self.stage = Stage::Loading(theme);
        } else {
            log::debug!("Discarding stale {theme} resolution, controller moved on");
            if let Err(e) = self.tracker.release(theme) {
                log::warn!("{e}");
            }
        }
    }

    fn on_probed(
        &mut self,
        theme: Theme,
        attempt: u64,
        url: String,
        result: Result<(), ProbeError>,
    ) {
        if !self.finish_attempt(theme, attempt) {
            return;
        }
        let joined = self.stage == Stage::Resolving(theme);

        match result {
            Ok(()) => {
                if let Err(e) = self.tracker.mark_loaded(theme) {
                    log::warn!("{e}");
                    return;
                }
                log::info!("Pre-warmed {theme} video is reachable");
                if joined {
                    self.cancel_timer();
                    self.attach(&url);
                    self.stage = Stage::Active(theme);
                    self.surface.set_loading(false);
                    self.show_description(theme);
                    self.start_playback();
                }
            }
            Err(e) => {
                if let Err(e) = self.tracker.mark_error(theme) {
                    log::warn!("{e}");
                }
                if joined {
                    log::error!("{theme} video unreachable: {e}");
                    self.fail(theme, LOAD_ERROR_MESSAGE);
                } else {
                    log::warn!("Pre-warm of {theme} video failed: {e}");
                }
            }
        }
    }

    fn on_player_event(&mut self, event: PlayerEvent) {
        match (event, self.stage) {
            (PlayerEvent::Loaded, Stage::Loading(theme)) => {
                self.cancel_timer();
                if let Err(e) = self.tracker.mark_loaded(theme) {
                    log::warn!("{e}");
                }
                self.stage = Stage::Active(theme);
                self.surface.set_loading(false);
                self.show_description(theme);
                self.start_playback();
            }
            (PlayerEvent::Error(e), Stage::Loading(theme)) => {
                log::error!("{theme} video failed to load: {e}");
                if let Err(e) = self.tracker.mark_error(theme) {
                    log::warn!("{e}");
                }
                self.fail(theme, LOAD_ERROR_MESSAGE);
            }
            (PlayerEvent::Error(e), Stage::Active(theme)) => {
                log::error!("{theme} video failed during playback: {e}");
                if let Err(e) = self.tracker.demote(theme) {
                    log::warn!("{e}");
                }
                self.fail(theme, PLAYBACK_ERROR_MESSAGE);
            }
            (PlayerEvent::Ended, Stage::Active(theme)) => {
                log::debug!("{theme} video ended, restarting");
                if let Err(e) = self.player.restart() {
                    log::error!("Failed to restart {theme} video: {e}");
                    if let Err(e) = self.tracker.demote(theme) {
                        log::warn!("{e}");
                    }
                    self.fail(theme, PLAYBACK_ERROR_MESSAGE);
                }
            }
            (event, stage) => {
                log::debug!("Ignoring player event {event:?} in stage {stage:?}");
            }
        }
    }

    fn on_load_timeout(&mut self) {
        let theme = match self.stage {
            Stage::Loading(theme) => theme,
            Stage::Resolving(theme) => {
                // Whatever is still in flight for this attempt arrives too late
                self.in_flight[theme.index()] = None;
                theme
            }
            _ => return,
        };
        log::error!(
            "{theme} video did not load within {:?}",
            self.settings.load_timeout
        );
        if let Err(e) = self.tracker.mark_error(theme) {
            log::warn!("{e}");
        }
        self.fail(theme, TIMEOUT_MESSAGE);
    }

    fn on_revert(&mut self) {
        if !matches!(self.stage, Stage::Failed { .. }) {
            return;
        }
        log::info!("Reverting to image background after video failure");
        self.leave_video();
        self.preferences.save(BackgroundMode::Image);

        // Theme changes were ignored during the delay
        let theme = self.theme_source.current();
        self.prewarm(theme);
    }

    /// Failure path: one notification now, image mode after the revert delay.
    fn fail(&mut self, theme: Theme, reason: &str) {
        self.cancel_timer();
        self.surface.set_loading(false);
        self.notifications
            .show(format!("{reason}, switched back to static background"), true);

        let was_active = matches!(self.stage, Stage::Active(_));
        self.stage = Stage::Failed { theme, was_active };
        // Late signals about the failed source must not produce a second failure
        self.bump_epoch();

        let epoch = self.epoch;
        let tx = self.events_tx.clone();
        self.timer = Some(self.tasks.schedule(self.settings.revert_delay, move || {
            let _ = tx.send(Event::Revert { epoch });
        }));
    }

    fn leave_video(&mut self) {
        self.abandon_pending();
        self.bump_epoch();
        self.cancel_timer();

        match self.stage {
            Stage::Active(_) | Stage::Failed { .. } => self.player.pause(),
            _ => {}
        }

        self.mode = BackgroundMode::Image;
        self.stage = Stage::Image;
        self.surface.set_loading(false);
        self.surface.show_mode(BackgroundMode::Image);
    }

    /// Drops a pending attempt without a result.
    ///
    /// A source already attached is detached and its theme released; a
    /// resolution still in flight is left to finish and is released when its
    /// result arrives.
    fn abandon_pending(&mut self) {
        let Some(theme) = self.stage.pending_theme() else {
            return;
        };
        self.cancel_timer();
        if let Stage::Loading(_) = self.stage {
            self.player.detach();
            if let Err(e) = self.tracker.release(theme) {
                log::warn!("{e}");
            }
        }
        log::debug!("Abandoned pending {theme} video attempt");
        self.stage = Stage::Image;
    }

    fn show_description(&mut self, theme: Theme) {
        let description = self.resolver.videos().get(theme).description().to_string();
        self.notifications.show(description, false);
    }

    fn attach(&mut self, url: &str) {
        self.player.detach();
        let events = PlayerEvents::new(self.events_tx.clone(), self.epoch);
        self.player.attach(url, events);
    }

    fn arm_load_timeout(&mut self) {
        self.cancel_timer();
        let epoch = self.epoch;
        let tx = self.events_tx.clone();
        self.timer = Some(self.tasks.schedule(self.settings.load_timeout, move || {
            let _ = tx.send(Event::LoadTimedOut { epoch });
        }));
    }

    /// Plays muted, retrying once before telling the user.
    fn start_playback(&mut self) {
        if !self.player.is_paused() {
            return;
        }
        self.player.set_muted(true);
        if let Err(first) = self.player.play() {
            log::warn!("Video playback refused, retrying muted: {first}");
            self.player.set_muted(true);
            if let Err(second) = self.player.play() {
                log::error!("Muted video playback failed: {second}");
                self.notifications.show(PLAY_REFUSED_MESSAGE, true);
            }
        }
    }

    fn new_attempt(&mut self, theme: Theme) -> u64 {
        let attempt = self.next_attempt;
        self.next_attempt += 1;
        self.in_flight[theme.index()] = Some(attempt);
        attempt
    }

    /// Clears the in-flight record; false when `attempt` is not the one on
    /// record for `theme`.
    fn finish_attempt(&mut self, theme: Theme, attempt: u64) -> bool {
        if self.in_flight[theme.index()] != Some(attempt) {
            log::debug!("Ignoring result of unknown {theme} attempt {attempt}");
            return false;
        }
        self.in_flight[theme.index()] = None;
        true
    }

    fn bump_epoch(&mut self) {
        self.epoch += 1;
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    fn publish(&self) {
        self.state_tx.send_if_modified(|state| {
            let next = self.stage.public();
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
    }

    async fn snapshot(&mut self) -> ControllerSnapshot {
        let mut resources = Vec::with_capacity(Theme::ALL.len());
        for theme in Theme::ALL {
            resources.push(VideoResource {
                theme,
                template: self.resolver.videos().get(theme).clone(),
                resolved_url: self.resolver.cached(theme).await,
                status: self.tracker.status(theme),
            });
        }
        ControllerSnapshot {
            state: self.stage.public(),
            mode: self.mode,
            resources,
        }
    }
}
