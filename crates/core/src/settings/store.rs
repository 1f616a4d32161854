//! Override store
//!
//! Two instance kinds own the only mutable state of the bridge. Both hold
//! deviations from the catalog defaults and nothing else: an absent key means
//! "use the default", which is why the maps must survive serialization with
//! presence and absence intact.

use super::catalog::SettingsCatalog;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Settings that affect emulation determinism (scalar settings and port bindings)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Scalar overrides: native key -> native string value
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    /// Port overrides: port index -> device setting value
    #[serde(default)]
    pub port_devices: BTreeMap<usize, String>,
}

impl SyncSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every setting and port is at its default
    pub fn is_default(&self) -> bool {
        self.values.is_empty() && self.port_devices.is_empty()
    }

    /// Stored override for a scalar key, if any
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Stored override for a port, if any
    pub fn port_device(&self, index: usize) -> Option<&str> {
        self.port_devices.get(&index).map(String::as_str)
    }
}

/// Settings that can change without reinitializing the core (layer visibility)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub disabled_layers: BTreeSet<String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_layer_enabled(&self, layer: &str) -> bool {
        !self.disabled_layers.contains(layer)
    }

    /// Bit `i` is set when the catalog's layer `i` is shown
    ///
    /// Layers past the 64th cannot be expressed and are left out of the mask.
    pub fn layer_mask(&self, catalog: &SettingsCatalog) -> u64 {
        catalog
            .layer_names()
            .iter()
            .take(64)
            .enumerate()
            .filter(|(_, name)| self.is_layer_enabled(name))
            .fold(0u64, |mask, (i, _)| mask | (1 << i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::catalog::tests::sample_catalog;

    #[test]
    fn test_default_instances_are_empty() {
        let sync = SyncSettings::new();
        assert!(sync.is_default());
        assert_eq!(sync.value("volume"), None);
        assert_eq!(sync.port_device(0), None);

        let settings = Settings::new();
        assert!(settings.is_layer_enabled("BG0"));
    }

    #[test]
    fn test_layer_mask() {
        let catalog = sample_catalog();
        let mut settings = Settings::new();
        assert_eq!(settings.layer_mask(&catalog), 0b11);

        settings.disabled_layers.insert("BG0".to_string());
        assert_eq!(settings.layer_mask(&catalog), 0b10);

        // Unknown layer names don't affect the mask
        settings.disabled_layers.insert("BG1".to_string());
        assert_eq!(settings.layer_mask(&catalog), 0b10);
    }

    #[test]
    fn test_serialization_preserves_absence() {
        let mut sync = SyncSettings::new();
        sync.values.insert("volume".to_string(), "150".to_string());
        sync.port_devices.insert(1, "gamepad".to_string());

        let json = serde_json::to_string(&sync).expect("Failed to serialize");
        let loaded: SyncSettings = serde_json::from_str(&json).expect("Failed to deserialize");

        assert_eq!(loaded, sync);
        assert_eq!(loaded.value("region"), None);
        assert_eq!(loaded.port_device(0), None);
        assert_eq!(loaded.port_device(1), Some("gamepad"));
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let sync: SyncSettings = serde_json::from_str("{}").unwrap();
        assert!(sync.is_default());
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert!(settings.disabled_layers.is_empty());
    }
}
