//! Persisted settings profile (JSON)

use super::error::SettingsError;
use super::store::{Settings, SyncSettings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const PROFILE_VERSION: u32 = 1;

/// The complete persisted configuration of one core: both override sets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsProfile {
    /// Profile format version
    pub version: u32,
    /// Target system (e.g., "pce")
    pub system: String,
    #[serde(default)]
    pub sync_settings: SyncSettings,
    #[serde(default)]
    pub settings: Settings,
}

impl SettingsProfile {
    pub fn new(system: &str) -> Self {
        Self {
            version: PROFILE_VERSION,
            system: system.to_string(),
            sync_settings: SyncSettings::default(),
            settings: Settings::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a profile from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load a profile, or start an empty one when the file does not exist yet
    pub fn load_or_new<P: AsRef<Path>>(path: P, system: &str) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new(system))
        }
    }

    /// Save the profile to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
