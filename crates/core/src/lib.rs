//! Core settings bridge and native-core contract shared by all systems.

pub mod logging;
pub mod settings;

use settings::RawSettingsInfo;
use std::collections::BTreeMap;

/// The native emulation core, seen as a black box.
///
/// Implementations wrap whatever actually runs the emulation (a sandboxed
/// library, a process). Callers are responsible for any locking the native
/// side needs; nothing in the settings bridge synchronizes.
pub trait NativeCore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Self-reported schema of every configurable item
    fn schema(&self) -> Result<RawSettingsInfo, Self::Error>;

    /// Current engine-side value of a setting
    fn setting_value(&self, key: &str) -> Option<String>;

    /// Ingest the flattened override map.
    /// Called at initialization and on every settings change.
    fn apply_overrides(&mut self, values: &BTreeMap<String, String>) -> Result<(), Self::Error>;

    /// Show or hide render layers; bit `i` set shows layer `i`
    fn set_layers(&mut self, mask: u64);
}
