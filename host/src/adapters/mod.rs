//! Headless stand-ins for the page collaborators of the engine.

pub mod console;
pub mod player;
pub mod theme_file;

pub use console::{ConsoleNotificationDisplay, ConsoleSurface};
pub use player::HttpPlayer;
pub use theme_file::FileThemeSignal;
