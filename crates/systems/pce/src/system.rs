//! PC Engine main system implementation

use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::settings::{
    native_values, HostOverrides, PropertySurface, Settings, SettingsCatalog, SettingsError,
    SyncSettings,
};
use emu_core::NativeCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Native switch for battery RAM on HuCard games
pub const BRAM_SETTING: &str = "pce.disable_bram_hucard";

/// PCE system errors
#[derive(Debug, Error)]
pub enum PceError {
    #[error("Native core error: {0}")]
    Native(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

fn native_err<E: std::error::Error + Send + Sync + 'static>(e: E) -> PceError {
    PceError::Native(Box::new(e))
}

/// Per-game information that affects initialization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub name: String,
    /// Game database flag: the HuCard expects battery-backed RAM
    #[serde(default)]
    pub uses_bram: bool,
}

/// Settings the host manages itself, hides, or pins
pub fn host_overrides() -> HostOverrides {
    HostOverrides::new()
        // firmware is supplied by the host
        .hide("pce.cdbios")
        .hide("pce.gecdbios")
        // too fringe to expose
        .hide("pce.resamp_rate_error")
        .hide("pce.vramsize")
        // only give BRAM to games that use it
        .force(BRAM_SETTING, "1")
        // RTC settings don't apply to PCE
        .hide("nyma.rtcinitialtime")
        .hide("nyma.rtcrealtime")
}

/// PC Engine / SuperGrafx system
pub struct PceSystem<N: NativeCore> {
    native: N,
    host: HostOverrides,
    catalog: SettingsCatalog,
    sync_surface: PropertySurface<SyncSettings>,
    settings_surface: PropertySurface<Settings>,
    settings: Settings,
    sync_settings: SyncSettings,
}

impl<N: NativeCore> PceSystem<N> {
    /// Discover the native schema, build the catalog and push the initial
    /// configuration to the core
    pub fn new(
        native: N,
        settings: Settings,
        sync_settings: SyncSettings,
        game: &GameInfo,
    ) -> Result<Self, PceError> {
        let raw = native.schema().map_err(native_err)?;

        let mut host = host_overrides();
        if game.uses_bram {
            host.set_forced(BRAM_SETTING, "0");
        }

        let catalog = host.catalog(raw)?;
        let sync_surface = PropertySurface::for_sync_settings(&catalog)?;
        let settings_surface = PropertySurface::for_settings(&catalog);

        let mut system = Self {
            native,
            host,
            catalog,
            sync_surface,
            settings_surface,
            settings,
            sync_settings,
        };

        log(LogCategory::Native, LogLevel::Info, || {
            format!(
                "PCE: initializing {} as {} ({} overrides)",
                game.name,
                system.system_id(),
                system.sync_settings.values.len() + system.sync_settings.port_devices.len()
            )
        });

        let values = system.native_values();
        system.push_values(&values)?;
        system.apply_layers();
        Ok(system)
    }

    /// PCE always has two layers, SGX always has four
    pub fn is_sgx(&self) -> bool {
        self.catalog.layer_names().len() == 4
    }

    pub fn system_id(&self) -> &'static str {
        if self.is_sgx() {
            "SGX"
        } else {
            "PCE"
        }
    }

    pub fn catalog(&self) -> &SettingsCatalog {
        &self.catalog
    }

    pub fn host_overrides(&self) -> &HostOverrides {
        &self.host
    }

    pub fn sync_surface(&self) -> &PropertySurface<SyncSettings> {
        &self.sync_surface
    }

    pub fn settings_surface(&self) -> &PropertySurface<Settings> {
        &self.settings_surface
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sync_settings(&self) -> &SyncSettings {
        &self.sync_settings
    }

    pub fn native(&self) -> &N {
        &self.native
    }

    pub fn native_mut(&mut self) -> &mut N {
        &mut self.native
    }

    /// The key -> value map the native core currently receives
    pub fn native_values(&self) -> BTreeMap<String, String> {
        native_values(&self.catalog, &self.sync_settings, &self.host)
    }

    /// Replace the layer settings; takes effect without a reboot
    pub fn put_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.apply_layers();
    }

    /// Replace the sync settings
    ///
    /// Returns true when they differ from the current ones, meaning the core
    /// has to be rebooted for the change to be deterministic. Settings the
    /// core refuses are not stored.
    pub fn put_sync_settings(&mut self, sync_settings: SyncSettings) -> Result<bool, PceError> {
        if sync_settings == self.sync_settings {
            return Ok(false);
        }
        let values = native_values(&self.catalog, &sync_settings, &self.host);
        self.push_values(&values)?;
        self.sync_settings = sync_settings;
        Ok(true)
    }

    fn push_values(&mut self, values: &BTreeMap<String, String>) -> Result<(), PceError> {
        log(LogCategory::Native, LogLevel::Debug, || {
            format!("PCE: applying {} native values", values.len())
        });
        self.native.apply_overrides(values).map_err(native_err)
    }

    fn apply_layers(&mut self) {
        let mask = self.settings.layer_mask(&self.catalog);
        log(LogCategory::Layers, LogLevel::Debug, || {
            format!("PCE: layer mask {:04b}", mask)
        });
        self.native.set_layers(mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_overrides_table() {
        let host = host_overrides();
        for key in [
            "pce.cdbios",
            "pce.gecdbios",
            "pce.resamp_rate_error",
            "pce.vramsize",
            "nyma.rtcinitialtime",
            "nyma.rtcrealtime",
        ] {
            assert!(host.contains(key), "{} should be hidden", key);
            assert_eq!(host.forced_value(key), None);
        }
        assert_eq!(host.forced_value(BRAM_SETTING), Some("1"));
    }

    #[test]
    fn test_game_info_defaults() {
        let game: GameInfo = serde_json::from_str(r#"{"name": "Bonk's Adventure"}"#).unwrap();
        assert!(!game.uses_bram);
    }
}
