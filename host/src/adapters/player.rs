use engine::common::PlayerError;
use engine::player::{MediaPlayer, PlayerEvents};
use reqwest::header::RANGE;
use tokio::task::JoinHandle;

/// Bytes requested to decide that a source is playable
const PROBE_RANGE: &str = "bytes=0-1023";

/// Player without a screen: "loading" a source fetches its first bytes.
///
/// A successful ranged `GET` counts as load completion, anything else as a
/// load error. Playback state is tracked but nothing is decoded, so the media
/// never ends on its own.
pub struct HttpPlayer {
    client: reqwest::Client,
    source: Option<String>,
    load: Option<JoinHandle<()>>,
    paused: bool,
    muted: bool,
}

impl std::fmt::Debug for HttpPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPlayer")
            .field("source", &self.source)
            .field("paused", &self.paused)
            .field("muted", &self.muted)
            .finish()
    }
}

impl HttpPlayer {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            source: None,
            load: None,
            paused: true,
            muted: true,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    fn abort_load(&mut self) {
        if let Some(load) = self.load.take() {
            load.abort();
        }
    }
}

async fn fetch_head(client: reqwest::Client, locator: String) -> Result<(), PlayerError> {
    let response = client
        .get(&locator)
        .header(RANGE, PROBE_RANGE)
        .send()
        .await
        .map_err(|e| PlayerError::Load(format!("{locator}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PlayerError::Load(format!("{locator}: HTTP {status}")));
    }
    response
        .bytes()
        .await
        .map_err(|e| PlayerError::Load(format!("{locator}: {e}")))?;
    Ok(())
}

impl MediaPlayer for HttpPlayer {
    fn attach(&mut self, locator: &str, events: PlayerEvents) {
        self.detach();
        log::info!("Loading video {locator} (looping, muted, inline)");

        self.source = Some(locator.to_string());
        self.paused = true;
        self.muted = true;

        let client = self.client.clone();
        let locator = locator.to_string();
        self.load = Some(tokio::spawn(async move {
            match fetch_head(client, locator).await {
                Ok(()) => events.loaded(),
                Err(e) => events.error(e),
            }
        }));
    }

    fn detach(&mut self) {
        self.abort_load();
        if let Some(source) = self.source.take() {
            log::debug!("Detached video {source}");
        }
        self.paused = true;
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        let Some(source) = &self.source else {
            return Err(PlayerError::NoSource);
        };
        log::info!("Playing {source} (muted: {})", self.muted);
        self.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        if !self.paused {
            log::info!("Paused video");
        }
        self.paused = true;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn restart(&mut self) -> Result<(), PlayerError> {
        log::debug!("Restarting video from the beginning");
        self.play()
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}

impl Drop for HttpPlayer {
    fn drop(&mut self) {
        self.abort_load();
    }
}
