//! Persisted project settings
//!
//! The toggle state lives in a project-scoped JSON workspace file, one
//! top-level key per component:
//!
//! ```json
//! { "avajeTypeQueryEnhancement": { "enabled": true } }
//! ```
//!
//! Keys owned by other components are preserved on save.

use crate::enablement::EnhancementState;
use crate::error::SettingsError;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Component key of the enhancement toggle
pub const ENHANCEMENT_STATE_KEY: &str = "avajeTypeQueryEnhancement";

/// Default settings file, relative to the project root
pub const DEFAULT_SETTINGS_PATH: &str = ".tqe/workspace.json";

/// Storage for the persisted toggle state
pub trait SettingsStore: Send + Sync {
    /// Stored state; `None` if nothing was saved yet
    ///
    /// # Errors
    /// Returns error if stored settings exist but cannot be read
    fn load_state(&self) -> Result<Option<EnhancementState>, SettingsError>;

    /// Store state
    ///
    /// # Errors
    /// Returns error if the settings cannot be written
    fn save_state(&self, state: EnhancementState) -> Result<(), SettingsError>;
}

/// JSON workspace file on disk
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonSettingsStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Option<Map<String, Value>>, SettingsError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SettingsError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| SettingsError::Parse {
                path: self.path.clone(),
                source,
            })
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load_state(&self) -> Result<Option<EnhancementState>, SettingsError> {
        let _guard = self.lock.lock();
        let Some(mut document) = self.read_document()? else {
            return Ok(None);
        };
        let Some(value) = document.remove(ENHANCEMENT_STATE_KEY) else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|source| SettingsError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    fn save_state(&self, state: EnhancementState) -> Result<(), SettingsError> {
        let _guard = self.lock.lock();
        let mut document = self.read_document()?.unwrap_or_default();
        document.insert(
            ENHANCEMENT_STATE_KEY.to_string(),
            serde_json::to_value(state).map_err(SettingsError::Encode)?,
        );
        let text = serde_json::to_string_pretty(&document).map_err(SettingsError::Encode)?;

        let write_err = |source| SettingsError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&self.path, text).map_err(write_err)?;
        tracing::debug!(path = %self.path.display(), enabled = state.enabled, "settings saved");
        Ok(())
    }
}
