//! Durable storage of the visitor's background mode.
//!
//! The store is deliberately forgiving: reading never fails (absent, corrupt
//! or unreachable storage all yield [`BackgroundMode::Image`]) and writing is
//! best-effort. Storage problems are logged and swallowed so they can never
//! block the transition that triggered them.

use crate::common::PreferenceError;
use crate::model::{BackgroundMode, Preference};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Key under which the preference record is stored.
pub const PREFERENCE_KEY: &str = "background_preference";

/// Raw key/value storage behind the [`PreferenceStore`].
///
/// Implementations report every failure; the store decides how to degrade.
pub trait PreferenceBackend: Send + Sync {
    /// Returns the stored value, or `None` when the key has never been written.
    fn read(&self, key: &str) -> Result<Option<String>, PreferenceError>;

    /// Creates or overwrites the value for `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// Best-effort persistence of the [`Preference`] record.
#[derive(Clone)]
pub struct PreferenceStore {
    backend: Arc<dyn PreferenceBackend>,
    key: String,
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore")
            .field("key", &self.key)
            .finish()
    }
}

impl PreferenceStore {
    pub fn new(backend: Arc<dyn PreferenceBackend>) -> Self {
        Self::with_key(backend, PREFERENCE_KEY)
    }

    pub fn with_key(backend: Arc<dyn PreferenceBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Reads the stored mode, defaulting to [`BackgroundMode::Image`].
    pub fn load(&self) -> BackgroundMode {
        match self.try_load() {
            Ok(Some(preference)) => preference.mode,
            Ok(None) => {
                log::debug!("No stored background preference, using image mode");
                BackgroundMode::Image
            }
            Err(e) => {
                log::warn!("Failed to load background preference, using image mode: {e}");
                BackgroundMode::Image
            }
        }
    }

    /// Stores `mode`. Failures are logged, never returned.
    pub fn save(&self, mode: BackgroundMode) {
        if let Err(e) = self.try_save(mode) {
            log::error!("Failed to save background preference '{mode}': {e}");
        } else {
            log::debug!("Saved background preference '{mode}'");
        }
    }

    fn try_load(&self) -> Result<Option<Preference>, PreferenceError> {
        let Some(raw) = self.backend.read(&self.key)? else {
            return Ok(None);
        };
        let preference = serde_json::from_str::<Preference>(&raw)?;
        Ok(Some(preference))
    }

    fn try_save(&self, mode: BackgroundMode) -> Result<(), PreferenceError> {
        let raw = serde_json::to_string(&Preference { mode })?;
        self.backend.write(&self.key, &raw)
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Backend rooted at the platform data directory, e.g.
    /// `~/.local/share/backdrop` on Linux.
    pub fn in_data_dir(app_name: &str) -> Result<Self, PreferenceError> {
        let base = dirs::data_dir().ok_or_else(|| {
            PreferenceError::Unavailable("platform data directory is unknown".to_string())
        })?;
        Ok(Self::new(base.join(app_name)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl PreferenceBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// In-process storage, lost when the process exits.
///
/// `set_unavailable(true)` makes every call fail, which is how tests model a
/// storage backend that throws.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<HashMap<String, String>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Raw stored value, bypassing the failure switch.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn check_available(&self) -> Result<(), PreferenceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PreferenceError::Unavailable(
                "memory backend switched off".to_string(),
            ));
        }
        Ok(())
    }
}

impl PreferenceBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        self.check_available()?;
        let entries = self
            .entries
            .lock()
            .map_err(|e| PreferenceError::Unavailable(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.check_available()?;
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| PreferenceError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
