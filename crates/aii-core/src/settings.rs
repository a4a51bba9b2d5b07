//! Persistent key/value settings, stored as TOML under the user config
//! directory and re-read by clients at the start of each operation.
//!
//! The store is an explicitly injected collaborator: clients hold a handle
//! to it rather than reading process-wide globals.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app_insights_api_key: String,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub current_app_id: String,
    pub current_resource_group: String,
    pub last_session_id: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_insights_api_key: String::new(),
            llm_api_key: String::new(),
            llm_base_url: "https://api.openai.com/v1".to_string(),
            llm_model: "gpt-5.2".to_string(),
            current_app_id: String::new(),
            current_resource_group: String::new(),
            last_session_id: String::new(),
        }
    }
}

/// Settings handle shared by the telemetry and chat clients. Every setter
/// persists to disk; readers take a snapshot per operation so config
/// changes apply to the next call without restarting the shell.
pub struct SettingsStore {
    path: PathBuf,
    inner: RwLock<Settings>,
}

impl SettingsStore {
    /// Open the store at the default location, creating defaults if no
    /// file exists yet.
    pub fn open() -> Result<Self, Error> {
        Self::with_path(Self::default_path()?)
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let settings = Self::load(&path)?;
        Ok(Self {
            path,
            inner: RwLock::new(settings),
        })
    }

    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::settings("Could not determine config directory"))?;
        Ok(config_dir.join("aii").join("config.toml"))
    }

    fn load(path: &Path) -> Result<Settings, Error> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::settings(format!("Failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::settings(format!("Failed to parse {}: {}", path.display(), e)))
    }

    fn persist(&self, settings: &Settings) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::settings(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let content = toml::to_string_pretty(settings)
            .map_err(|e| Error::settings(format!("Failed to serialize settings: {}", e)))?;
        std::fs::write(&self.path, content)
            .map_err(|e| Error::settings(format!("Failed to write {}: {}", self.path.display(), e)))
    }

    fn update(&self, f: impl FnOnce(&mut Settings)) -> Result<(), Error> {
        let mut guard = self.inner.write().expect("settings lock poisoned");
        f(&mut guard);
        self.persist(&guard)
    }

    /// Snapshot of the current settings. Clients take one per operation.
    pub fn snapshot(&self) -> Settings {
        self.inner.read().expect("settings lock poisoned").clone()
    }

    pub fn has_app_insights_api_key(&self) -> bool {
        !self.snapshot().app_insights_api_key.is_empty()
    }

    pub fn has_llm_api_key(&self) -> bool {
        !self.snapshot().llm_api_key.is_empty()
    }

    pub fn set_app_insights_api_key(&self, key: impl Into<String>) -> Result<(), Error> {
        self.update(|s| s.app_insights_api_key = key.into())
    }

    pub fn set_llm_api_key(&self, key: impl Into<String>) -> Result<(), Error> {
        self.update(|s| s.llm_api_key = key.into())
    }

    pub fn set_llm_base_url(&self, url: impl Into<String>) -> Result<(), Error> {
        self.update(|s| s.llm_base_url = url.into())
    }

    pub fn set_llm_model(&self, model: impl Into<String>) -> Result<(), Error> {
        self.update(|s| s.llm_model = model.into())
    }

    pub fn set_current_app_id(&self, app_id: impl Into<String>) -> Result<(), Error> {
        self.update(|s| s.current_app_id = app_id.into())
    }

    pub fn set_current_resource_group(&self, rg: impl Into<String>) -> Result<(), Error> {
        self.update(|s| s.current_resource_group = rg.into())
    }

    pub fn set_last_session_id(&self, session_id: impl Into<String>) -> Result<(), Error> {
        self.update(|s| s.last_session_id = session_id.into())
    }

    /// Wipe all settings back to defaults.
    pub fn clear(&self) -> Result<(), Error> {
        self.update(|s| *s = Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::with_path(dir.path().join("config.toml")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_defaults() {
        let (_dir, store) = temp_store();
        let settings = store.snapshot();
        assert_eq!(settings.llm_base_url, "https://api.openai.com/v1");
        assert_eq!(settings.llm_model, "gpt-5.2");
        assert!(settings.app_insights_api_key.is_empty());
        assert!(!store.has_llm_api_key());
    }

    #[test]
    fn test_set_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let store = SettingsStore::with_path(&path).unwrap();
        store.set_llm_api_key("sk-test").unwrap();
        store.set_current_app_id("app-123").unwrap();

        let reopened = SettingsStore::with_path(&path).unwrap();
        assert_eq!(reopened.snapshot().llm_api_key, "sk-test");
        assert_eq!(reopened.snapshot().current_app_id, "app-123");
    }

    #[test]
    fn test_clear_resets_to_defaults() {
        let (_dir, store) = temp_store();
        store.set_llm_model("gpt-4").unwrap();
        store.set_app_insights_api_key("key").unwrap();

        store.clear().unwrap();
        let settings = store.snapshot();
        assert_eq!(settings.llm_model, "gpt-5.2");
        assert!(settings.app_insights_api_key.is_empty());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "llm_api_key = \"sk-partial\"\n").unwrap();

        let store = SettingsStore::with_path(&path).unwrap();
        assert_eq!(store.snapshot().llm_api_key, "sk-partial");
        assert_eq!(store.snapshot().llm_base_url, "https://api.openai.com/v1");
    }
}
