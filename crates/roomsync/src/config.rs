use std::fs;
use std::path::{Path, PathBuf};

use roomsync_replication::ReplicationConfig;
use roomsync_session::{JsonFilePreferences, MemoryPreferences, PreferenceStore, SessionConfig};
use roomsync_tick::TickConfig;
use serde::{Deserialize, Serialize};

use crate::ClientError;

/// Preference store picked by [`ClientConfig::open_preferences`].
pub type DynPreferences = Box<dyn PreferenceStore + Send>;

/// Everything a [`GameClient`](crate::GameClient) needs to start.
///
/// Every field has a default, so `{}` is a valid config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub session: SessionConfig,
    pub tick: TickConfig,
    pub replication: ReplicationConfig,
    /// Where the nickname is persisted. `None` keeps it in memory.
    pub prefs_path: Option<PathBuf>,
}

impl ClientConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ClientError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(ClientError::ConfigIo)?;
        let config = Self::from_json_str(&text)?;
        tracing::info!(path = %path.display(), "client config loaded");
        Ok(config)
    }

    /// Opens the store named by `prefs_path`: the JSON file when set, an
    /// in-memory store otherwise.
    ///
    /// # Errors
    /// [`ClientError::Preferences`] if the file exists but can't be read.
    pub fn open_preferences(&self) -> Result<DynPreferences, ClientError> {
        match &self.prefs_path {
            Some(path) => {
                let prefs = JsonFilePreferences::open(path)?;
                tracing::info!(path = %path.display(), "preferences opened");
                Ok(Box::new(prefs))
            }
            None => Ok(Box::new(MemoryPreferences::new())),
        }
    }

    /// Clamps out-of-range values in every section.
    pub fn validated(mut self) -> Self {
        self.session = self.session.validated();
        self.tick = self.tick.validated();
        self
    }
}
