use crate::common::PlayerError;
use crate::controller::Event;
use crate::model::BackgroundMode;
use tokio::sync::mpsc::UnboundedSender;

/// Signals a player reports about the source currently attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Enough data arrived to start playback
    Loaded,
    /// Loading or playback failed
    Error(PlayerError),
    /// Playback reached the end of the media
    Ended,
}

/// Event sink handed to the player with each attached source.
///
/// Every sink is stamped with the controller epoch of the attach, so signals
/// about a source that has since been replaced are discarded by the
/// controller instead of corrupting a newer attempt.
#[derive(Debug, Clone)]
pub struct PlayerEvents {
    tx: UnboundedSender<Event>,
    epoch: u64,
}

impl PlayerEvents {
    pub(crate) fn new(tx: UnboundedSender<Event>, epoch: u64) -> Self {
        Self { tx, epoch }
    }

    pub fn loaded(&self) {
        self.send(PlayerEvent::Loaded);
    }

    pub fn error(&self, error: PlayerError) {
        self.send(PlayerEvent::Error(error));
    }

    pub fn ended(&self) {
        self.send(PlayerEvent::Ended);
    }

    pub fn send(&self, event: PlayerEvent) {
        if self
            .tx
            .send(Event::Player {
                epoch: self.epoch,
                event,
            })
            .is_err()
        {
            log::debug!("Player event dropped, controller has stopped");
        }
    }
}

/// The single video element behind the background.
///
/// Only one source is attached at a time; `attach` replaces the previous one.
pub trait MediaPlayer: Send {
    /// Detaches any previous source, attaches `locator`, configures the
    /// element for background use (looping, muted, inline) and starts
    /// loading. Load outcome and end-of-media are reported through `events`.
    fn attach(&mut self, locator: &str, events: PlayerEvents);

    /// Removes the current source, if any. Later signals about it are ignored.
    fn detach(&mut self);

    fn play(&mut self) -> Result<(), PlayerError>;

    fn pause(&mut self);

    fn set_muted(&mut self, muted: bool);

    /// Seeks to the start and plays again.
    fn restart(&mut self) -> Result<(), PlayerError>;

    fn is_paused(&self) -> bool;
}

/// Page elements reflecting the background mode: the toggle control (label
/// and active marker), the video container and the loading indicator.
pub trait BackgroundSurface: Send {
    fn show_mode(&mut self, mode: BackgroundMode);

    fn set_loading(&mut self, loading: bool);
}

/// Label of the toggle control while `mode` is shown.
pub fn toggle_label(mode: BackgroundMode) -> &'static str {
    match mode {
        BackgroundMode::Image => "Switch to video background",
        BackgroundMode::Video => "Switch to static background",
    }
}
