//! Accepted ranges for the timing settings.

/// Shortest bounded wait for a video load (seconds)
pub const MIN_LOAD_TIMEOUT_SECS: u64 = 1;

/// Longest bounded wait for a video load (seconds)
pub const MAX_LOAD_TIMEOUT_SECS: u64 = 120;

/// Longest delay before reverting to the image background (milliseconds)
pub const MAX_REVERT_DELAY_MS: u64 = 10_000;

/// Shortest time a notification stays visible (milliseconds)
pub const MIN_NOTIFICATION_VISIBLE_MS: u64 = 500;

/// Longest time a notification stays visible (milliseconds)
pub const MAX_NOTIFICATION_VISIBLE_MS: u64 = 30_000;

/// Maximum timeout for indirection and probe requests (seconds)
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Theme polling interval bounds (milliseconds)
pub const MIN_THEME_POLL_INTERVAL_MS: u64 = 10;
pub const MAX_THEME_POLL_INTERVAL_MS: u64 = 60_000;
