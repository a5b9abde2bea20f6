//! Local key-value preferences that survive process restarts.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::PreferencesError;

/// Key under which the last confirmed nickname is stored.
pub const PLAYER_NAME_KEY: &str = "PlayerName";

/// A string-valued preference store.
pub trait PreferenceStore {
    fn get_string(&self, key: &str) -> Option<String>;

    /// Stores a value. Persistent stores write through immediately.
    fn set_string(&mut self, key: &str, value: &str) -> Result<(), PreferencesError>;

    fn has_key(&self, key: &str) -> bool {
        self.get_string(key).is_some()
    }
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Box<T> {
    fn get_string(&self, key: &str) -> Option<String> {
        (**self).get_string(key)
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), PreferencesError> {
        (**self).set_string(key, value)
    }
}

/// In-memory store; forgets everything when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), PreferencesError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences kept as a flat JSON object in one file.
///
/// The whole file is rewritten on every `set_string`. A missing file reads
/// as empty.
#[derive(Debug, Clone)]
pub struct JsonFilePreferences {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFilePreferences {
    /// Loads the store at `path`.
    ///
    /// # Errors
    /// I/O errors other than "not found", or a file that isn't a JSON
    /// object of strings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), keys = values.len(), "preferences loaded");
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(&self.values)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), PreferencesError> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A path under the system temp dir that no other test uses.
    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("roomsync-prefs-{}", std::process::id()))
            .join(format!("{name}.json"))
    }

    #[test]
    fn test_memory_preferences_set_then_get() {
        let mut prefs = MemoryPreferences::new();
        assert!(!prefs.has_key(PLAYER_NAME_KEY));

        prefs.set_string(PLAYER_NAME_KEY, "ada").unwrap();

        assert!(prefs.has_key(PLAYER_NAME_KEY));
        assert_eq!(prefs.get_string(PLAYER_NAME_KEY).as_deref(), Some("ada"));
    }

    #[test]
    fn test_json_file_missing_file_reads_as_empty() {
        let prefs = JsonFilePreferences::open(scratch_path("missing")).unwrap();
        assert!(!prefs.has_key(PLAYER_NAME_KEY));
    }

    #[test]
    fn test_json_file_survives_reopen() {
        let path = scratch_path("reopen");
        let _ = fs::remove_file(&path);

        let mut prefs = JsonFilePreferences::open(&path).unwrap();
        prefs.set_string(PLAYER_NAME_KEY, "grace").unwrap();
        drop(prefs);

        let reopened = JsonFilePreferences::open(&path).unwrap();
        assert_eq!(reopened.get_string(PLAYER_NAME_KEY).as_deref(), Some("grace"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_json_file_corrupt_contents_is_an_error() {
        let path = scratch_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"{not json").unwrap();

        let result = JsonFilePreferences::open(&path);

        assert!(matches!(result, Err(PreferencesError::Json(_))));
        let _ = fs::remove_file(&path);
    }
}
