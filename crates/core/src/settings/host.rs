//! Host overrides and the outbound value map
//!
//! A system wrapper may take some settings away from the user: either because
//! the host manages them itself (firmware paths) or because they do not apply.
//! Such keys are hidden from the typed surface; forced ones are always sent
//! with the host's value.

use super::catalog::{RawSettingsInfo, SettingsCatalog};
use super::error::SettingsError;
use super::store::SyncSettings;
use crate::logging::{log, LogCategory, LogLevel};
use std::collections::BTreeMap;

/// Host-side table: key -> forced value (`None` hides the key without forcing it)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostOverrides {
    entries: BTreeMap<String, Option<String>>,
}

impl HostOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide a setting the host manages itself
    pub fn hide(mut self, key: &str) -> Self {
        self.entries.insert(key.to_string(), None);
        self
    }

    /// Hide a setting and always send `value` for it
    pub fn force(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), Some(value.to_string()));
        self
    }

    /// Change a forced value in place (e.g., per-game adjustments before init)
    pub fn set_forced(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), Some(value.to_string()));
    }

    pub fn forced_value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.as_deref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn hidden_keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn forced(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }

    /// Build a catalog whose hidden set is exactly this table's keys
    pub fn catalog(&self, raw: RawSettingsInfo) -> Result<SettingsCatalog, SettingsError> {
        SettingsCatalog::from_raw(raw, self.hidden_keys())
    }
}

/// Flatten an instance into the key -> string map the native core ingests
///
/// Scalar overrides for visible keys, then port overrides under their port
/// keys, then host-forced values, which win over anything else.
pub fn native_values(
    catalog: &SettingsCatalog,
    sync: &SyncSettings,
    host: &HostOverrides,
) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();

    for (key, value) in &sync.values {
        if catalog.is_hidden(key) || host.contains(key) {
            log(LogCategory::Settings, LogLevel::Debug, || {
                format!("Settings: dropping override for host-managed `{}`", key)
            });
            continue;
        }
        values.insert(key.clone(), value.clone());
    }

    for (index, device) in &sync.port_devices {
        if *index < catalog.ports().len() {
            values.insert(catalog.port_key(*index), device.clone());
        }
    }

    for (key, value) in host.forced() {
        values.insert(key.to_string(), value.to_string());
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::catalog::tests::sample_raw;

    fn host() -> HostOverrides {
        HostOverrides::new()
            .hide("pce.cdbios")
            .force("pce.disable_bram_hucard", "1")
    }

    #[test]
    fn test_host_table() {
        let mut host = host();
        assert!(host.contains("pce.cdbios"));
        assert_eq!(host.forced_value("pce.cdbios"), None);
        assert_eq!(host.forced_value("pce.disable_bram_hucard"), Some("1"));

        host.set_forced("pce.disable_bram_hucard", "0");
        assert_eq!(host.forced_value("pce.disable_bram_hucard"), Some("0"));
        assert_eq!(host.hidden_keys().count(), 2);
    }

    #[test]
    fn test_catalog_hides_host_keys() {
        let catalog = host().catalog(sample_raw()).unwrap();
        assert!(catalog.is_hidden("pce.cdbios"));
        assert!(catalog.is_hidden("pce.disable_bram_hucard"));
        assert!(!catalog.is_hidden("volume"));
    }

    #[test]
    fn test_native_values() {
        let host = host();
        let catalog = host.catalog(sample_raw()).unwrap();
        let mut sync = SyncSettings::new();
        sync.values.insert("volume".to_string(), "150".to_string());
        sync.values.insert("pce.cdbios".to_string(), "other.pce".to_string());
        sync.values
            .insert("pce.disable_bram_hucard".to_string(), "0".to_string());
        sync.port_devices.insert(0, "mouse".to_string());
        sync.port_devices.insert(7, "gamepad".to_string());

        let values = native_values(&catalog, &sync, &host);
        let expected: BTreeMap<String, String> = [
            ("pce.disable_bram_hucard", "1"),
            ("pce.input.port1", "mouse"),
            ("volume", "150"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_native_values_default_instance() {
        let host = HostOverrides::new();
        let catalog = host.catalog(sample_raw()).unwrap();
        assert!(native_values(&catalog, &SyncSettings::new(), &host).is_empty());
    }
}
