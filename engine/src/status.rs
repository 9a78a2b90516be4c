use crate::common::StatusTransitionError;
use crate::model::{LoadStatus, Theme};

/// Per-theme load status, gating when a resolve/load attempt may start.
///
/// `should_attempt` is the only gate: it is true for `Unloaded` and `Error`
/// and false for `Loading` and `Loaded`, which keeps at most one attempt per
/// theme in flight and skips work that already succeeded this session.
#[derive(Debug, Clone, Default)]
pub struct LoadStatusTracker {
    statuses: [LoadStatus; 2],
}

impl LoadStatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, theme: Theme) -> LoadStatus {
        self.statuses[theme.index()]
    }

    pub fn should_attempt(&self, theme: Theme) -> bool {
        matches!(
            self.status(theme),
            LoadStatus::Unloaded | LoadStatus::Error
        )
    }

    /// `Unloaded | Error -> Loading`
    pub fn mark_loading(&mut self, theme: Theme) -> Result<(), StatusTransitionError> {
        self.transition(
            theme,
            &[LoadStatus::Unloaded, LoadStatus::Error],
            LoadStatus::Loading,
        )
    }

    /// `Loading -> Loaded`
    pub fn mark_loaded(&mut self, theme: Theme) -> Result<(), StatusTransitionError> {
        self.transition(theme, &[LoadStatus::Loading], LoadStatus::Loaded)
    }

    /// `Loading -> Error`
    pub fn mark_error(&mut self, theme: Theme) -> Result<(), StatusTransitionError> {
        self.transition(theme, &[LoadStatus::Loading], LoadStatus::Error)
    }

    /// `Loading -> Unloaded`: the attempt was abandoned before it produced a
    /// result.
    pub fn release(&mut self, theme: Theme) -> Result<(), StatusTransitionError> {
        self.transition(theme, &[LoadStatus::Loading], LoadStatus::Unloaded)
    }

    /// `Loaded -> Error`: a verified resource failed during playback.
    pub fn demote(&mut self, theme: Theme) -> Result<(), StatusTransitionError> {
        self.transition(theme, &[LoadStatus::Loaded], LoadStatus::Error)
    }

    pub fn snapshot(&self) -> [(Theme, LoadStatus); 2] {
        Theme::ALL.map(|theme| (theme, self.status(theme)))
    }

    fn transition(
        &mut self,
        theme: Theme,
        allowed_from: &[LoadStatus],
        to: LoadStatus,
    ) -> Result<(), StatusTransitionError> {
        let from = self.status(theme);
        if !allowed_from.contains(&from) {
            return Err(StatusTransitionError { theme, from, to });
        }
        log::debug!("Video status for {theme}: {from} -> {to}");
        self.statuses[theme.index()] = to;
        Ok(())
    }
}
