//! Application settings management
//!
//! Stores non-sensitive configuration in a plain JSON file. The wrapping key
//! itself never lives here, only its identifier.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{DEFAULT_SLIDING_EXPIRATION, MAX_SLIDING_EXPIRATION};
use crate::crypto::{PasswordHasher, DEFAULT_MAX_SALT_BYTES, DEFAULT_MIN_SALT_BYTES};
use crate::error::{KeywardError, Result};
use crate::keys::normalize_identifier;
use crate::storage::default_key_directory;

/// Salt bounds for password hashing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PasswordSettings {
    pub min_salt_bytes: usize,
    /// Inclusive upper bound
    pub max_salt_bytes: usize,
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            min_salt_bytes: DEFAULT_MIN_SALT_BYTES,
            max_salt_bytes: DEFAULT_MAX_SALT_BYTES,
        }
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Settings file version
    pub version: u32,
    /// Identifier of the asymmetric key that wraps the data key
    pub wrapping_key_id: String,
    /// Directory for wrapped key records (platform data dir when unset)
    pub key_directory: Option<PathBuf>,
    /// Sliding lifetime of the cached wrapped key, in seconds
    pub cache_ttl_secs: u64,
    pub password: PasswordSettings,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self {
            version: 1,
            wrapping_key_id: String::new(),
            key_directory: None,
            cache_ttl_secs: DEFAULT_SLIDING_EXPIRATION.as_secs(),
            password: PasswordSettings::default(),
        }
    }

    /// Check the settings are usable for building a key store
    pub fn validate(&self) -> Result<()> {
        if normalize_identifier(&self.wrapping_key_id).is_empty() {
            return Err(KeywardError::Configuration(
                "wrappingKeyId is not set".to_string(),
            ));
        }
        if self.cache_ttl_secs == 0 {
            return Err(KeywardError::out_of_range(
                "cacheTtlSecs",
                "must be greater than zero",
            ));
        }
        if self.cache_ttl_secs > MAX_SLIDING_EXPIRATION.as_secs() {
            return Err(KeywardError::out_of_range(
                "cacheTtlSecs",
                "must not exceed one year",
            ));
        }
        PasswordHasher::from_settings(&self.password)?;
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Effective record directory
    pub fn resolve_key_directory(&self) -> Result<PathBuf> {
        match &self.key_directory {
            Some(dir) => Ok(dir.clone()),
            None => default_key_directory(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings manager
pub struct SettingsManager {
    settings_file: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Create a new settings manager
    pub fn new(storage_dir: &Path) -> Self {
        let settings_file = storage_dir.join("settings.json");
        let settings = Self::load_from_file(&settings_file).unwrap_or_else(|e| {
            warn!("Could not load settings from {:?}: {}", settings_file, e);
            Settings::new()
        });

        Self {
            settings_file,
            settings,
        }
    }

    /// Load settings from file
    fn load_from_file(path: &Path) -> Result<Settings> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(Settings::new());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.settings)?;

        if let Some(parent) = self.settings_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write atomically using temp file
        let temp_path = self.settings_file.with_extension("tmp");
        std::fs::write(&temp_path, &contents)?;
        std::fs::rename(&temp_path, &self.settings_file)?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Get mutable settings
    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Validate, replace and save settings
    pub fn update(&mut self, settings: Settings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        self.save()
    }

    /// Reset settings to defaults and delete settings file
    pub fn reset(&mut self) -> Result<()> {
        self.settings = Settings::default();

        if self.settings_file.exists() {
            std::fs::remove_file(&self.settings_file)
                .map_err(|e| KeywardError::StorageError(e.to_string()))?;
        }

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.settings_file
    }
}
