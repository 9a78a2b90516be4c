//! Wires the engine to the headless adapters and runs the command loop.

use crate::adapters::{ConsoleNotificationDisplay, ConsoleSurface, FileThemeSignal, HttpPlayer};
use crate::config::AppConfig;
use crate::error::AppResult;
use engine::controller::{
    BackgroundController, BackgroundState, Collaborators, ControllerHandle, ControllerSnapshot,
};
use engine::player::toggle_label;
use engine::preference::{FileBackend, PreferenceStore};
use engine::probe::{HttpProbe, ResourceProbe};
use engine::resolver::{HttpIndirection, RemoteIndirection, ResourceResolver, http_client};
use engine::theme_source::{ClassListSignal, ThemeSignal, ThemeSource};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Directory name under the platform data dir holding the preference record
pub const APP_NAME: &str = "backdrop";

/// A line typed on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Status,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "toggle" | "t" => Ok(Command::Toggle),
            "status" | "s" => Ok(Command::Status),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            other => Err(format!(
                "Unknown command '{other}', expected toggle, status or quit"
            )),
        }
    }
}

/// A started controller together with what keeps it running.
pub struct Runtime {
    pub handle: ControllerHandle,
    controller: JoinHandle<()>,
    watcher: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Runtime {
    /// Stops the theme watcher and the controller and waits for both.
    pub async fn shutdown(self) -> AppResult<()> {
        self.cancel.cancel();
        if let Err(e) = self.handle.shutdown() {
            log::debug!("Controller already stopped: {e}");
        }
        if let Err(e) = self.watcher.await {
            log::warn!("Theme watcher ended abnormally: {e}");
        }
        if let Err(e) = self.controller.await {
            log::warn!("Controller task ended abnormally: {e}");
        }
        log::info!("Shutdown complete");
        Ok(())
    }
}

/// Builds every collaborator from `config` and starts the controller.
///
/// `theme_file` overrides the configured theme file.
pub fn start(config: &AppConfig, theme_file: Option<PathBuf>) -> AppResult<Runtime> {
    let client = http_client(config.resolver().request_timeout())?;

    let remote: Option<Arc<dyn RemoteIndirection>> = match config.resolver().endpoint() {
        Some(endpoint) => {
            log::info!("Resolving video locators through {endpoint}");
            Some(Arc::new(HttpIndirection::new(client.clone(), endpoint)))
        }
        None => {
            log::info!("No indirection endpoint configured, using direct locators");
            None
        }
    };
    let resolver = ResourceResolver::new(remote, config.resolver().direct_base(), config.videos());

    let backend = match config.preference().dir() {
        Some(dir) => FileBackend::new(dir),
        None => FileBackend::in_data_dir(APP_NAME)?,
    };
    log::info!("Preference stored in {}", backend.dir().display());
    let preferences = PreferenceStore::new(Arc::new(backend));

    let signal: Arc<dyn ThemeSignal> = match theme_file.or_else(|| config.theme().file().cloned())
    {
        Some(path) => {
            log::info!("Watching theme file {}", path.display());
            Arc::new(FileThemeSignal::new(path, config.theme().light_class()))
        }
        None => Arc::new(ClassListSignal::with_light_class(
            config.theme().classes(),
            config.theme().light_class(),
        )),
    };
    let theme_source = Arc::new(ThemeSource::new(signal));

    let probe: Option<Arc<dyn ResourceProbe>> = Some(Arc::new(HttpProbe::new(client.clone())));

    let controller = BackgroundController::new(
        config.controller_settings(),
        Collaborators {
            preferences,
            theme_source: theme_source.clone(),
            resolver,
            probe,
            player: Box::new(HttpPlayer::new(client)),
            surface: Box::new(ConsoleSurface::new()),
            notifications: Arc::new(ConsoleNotificationDisplay::new()),
        },
    );
    let (handle, controller) = controller.spawn();

    let cancel = CancellationToken::new();
    let watcher = theme_source.watch(config.theme().poll_interval(), cancel.clone());

    Ok(Runtime {
        handle,
        controller,
        watcher,
        cancel,
    })
}

/// Reads commands from `input` until `quit` or end of input.
pub async fn command_loop<R>(handle: &ControllerHandle, input: R) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(Command::Toggle) => handle.toggle()?,
            Ok(Command::Status) => {
                let snapshot = handle.snapshot().await?;
                println!("{}", describe(&snapshot));
            }
            Ok(Command::Quit) => break,
            Err(message) => println!("{message}"),
        }
    }
    Ok(())
}

/// One status line per snapshot, e.g. `video active (dark) | light: loaded | dark: loaded`.
pub fn describe(snapshot: &ControllerSnapshot) -> String {
    let state = match snapshot.state {
        BackgroundState::Image => "image".to_string(),
        BackgroundState::VideoPending(theme) => format!("video pending ({theme})"),
        BackgroundState::VideoActive(theme) => format!("video active ({theme})"),
    };

    let mut parts = vec![state];
    for resource in &snapshot.resources {
        match &resource.resolved_url {
            Some(url) => parts.push(format!("{}: {} at {url}", resource.theme, resource.status)),
            None => parts.push(format!("{}: {}", resource.theme, resource.status)),
        }
    }
    parts.push(format!("toggle: '{}'", toggle_label(snapshot.mode)));
    parts.join(" | ")
}
