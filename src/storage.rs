//! On-disk persistence under the user's home directory
//!
//! The api key and the last fetched profile live as small YAML files
//! in `~/.palate`, next to the log file.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::profile::UserProfile;

const CONFIG_DIR_NAME: &str = ".palate";
const KEY_FILE: &str = "key.yaml";
const PROFILE_FILE: &str = "profile.yaml";

/// Directory the key, cached profile and log file live in
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

#[derive(Serialize, Deserialize)]
struct StoredKey {
    api_key: String,
}

/// Manages the saved api key and the cached profile
pub struct Storage {
    pub api_key: Option<String>,
    pub profile: Option<UserProfile>,
    config_dir: PathBuf,
}

impl Storage {
    pub fn new() -> Self {
        Self::at(default_config_dir())
    }

    /// Storage rooted at an explicit directory
    pub fn at(config_dir: PathBuf) -> Self {
        let mut storage = Storage {
            api_key: None,
            profile: None,
            config_dir,
        };

        // Try to load saved data
        let _ = storage.load_all();
        storage
    }

    /// Ensure config directory exists
    fn ensure_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Persist the api key and keep it in memory
    pub fn save_api_key(&mut self, key: &str) -> Result<()> {
        self.ensure_dir()?;
        let content = serde_yaml::to_string(&StoredKey {
            api_key: key.to_string(),
        })?;
        fs::write(self.config_dir.join(KEY_FILE), content)?;
        self.api_key = Some(key.to_string());
        Ok(())
    }

    /// Persist the fetched profile and keep it in memory
    pub fn save_profile(&mut self, profile: &UserProfile) -> Result<()> {
        self.ensure_dir()?;
        let content = serde_yaml::to_string(profile)?;
        fs::write(self.config_dir.join(PROFILE_FILE), content)?;
        self.profile = Some(profile.clone());
        Ok(())
    }

    /// Load whatever is on disk, skipping unreadable files
    pub fn load_all(&mut self) -> Result<()> {
        if !self.config_dir.exists() {
            return Ok(());
        }

        if let Ok(content) = fs::read_to_string(self.config_dir.join(KEY_FILE)) {
            if let Ok(stored) = serde_yaml::from_str::<StoredKey>(&content) {
                if !stored.api_key.is_empty() {
                    self.api_key = Some(stored.api_key);
                }
            }
        }

        if let Ok(content) = fs::read_to_string(self.config_dir.join(PROFILE_FILE)) {
            if let Ok(profile) = serde_yaml::from_str::<UserProfile>(&content) {
                self.profile = Some(profile);
            }
        }

        Ok(())
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn key_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = Storage::at(dir.path().to_path_buf());
        assert!(storage.api_key.is_none());

        storage.save_api_key("abc123").unwrap();

        let reloaded = Storage::at(dir.path().to_path_buf());
        assert_eq!(reloaded.api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn profile_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = Storage::at(dir.path().to_path_buf());

        let profile = UserProfile {
            email: "cook@example.com".to_string(),
            plan: "starter".to_string(),
            tokens: 42,
            fetched_at: Some(Utc::now()),
        };
        storage.save_profile(&profile).unwrap();

        let reloaded = Storage::at(dir.path().to_path_buf());
        assert_eq!(reloaded.profile, Some(profile));
    }

    #[test]
    fn missing_directory_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::at(dir.path().join("never-created"));
        assert!(storage.api_key.is_none());
        assert!(storage.profile.is_none());
    }

    #[test]
    fn corrupt_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(KEY_FILE), ":: not yaml ::").unwrap();

        let storage = Storage::at(dir.path().to_path_buf());
        assert!(storage.api_key.is_none());
    }
}
