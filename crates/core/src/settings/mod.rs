//! Settings bridge between native cores and typed property tooling.
//!
//! Native cores speak a string-keyed protocol: every setting is a key with a
//! string value, and a key the host does not send keeps the core's default.
//! This module layers types on top of that without losing the
//! default-vs-override distinction.
//!
//! - [`catalog`] - immutable setting, port and layer descriptors
//! - [`store`] - the override maps ([`SyncSettings`], [`Settings`])
//! - [`accessor`] - per-kind typed get/set/reset over the override maps
//! - [`surface`] - enumerable property handles for generic consumers
//! - [`host`] - host-managed keys and the flattened native value map
//! - [`profile`] - JSON persistence of both override maps
//!
//! # Usage
//!
//! ```rust
//! use emu_core::settings::{PropertySurface, SettingValue, SettingsCatalog, SyncSettings};
//!
//! let json = r#"{"short_name": "pce", "settings": [
//!     {"key": "volume", "kind": "int", "name": "Volume",
//!      "default": "100", "min": "0", "max": "200"}
//! ]}"#;
//! let catalog = SettingsCatalog::from_json(json, Vec::<String>::new()).unwrap();
//! let surface = PropertySurface::for_sync_settings(&catalog).unwrap();
//!
//! let mut sync = SyncSettings::new();
//! let mut props = surface.bind(&mut sync);
//! props.set("volume", SettingValue::Int(150)).unwrap();
//! assert_eq!(props.get("volume").unwrap(), SettingValue::Int(150));
//! ```

pub mod accessor;
pub mod catalog;
pub mod error;
pub mod host;
pub mod profile;
pub mod store;
pub mod surface;

pub use accessor::{
    Conversion, LayerAccessor, PortAccessor, PropertyAccessor, ScalarAccessor, SettingValue,
};
pub use catalog::{
    Choice, PortDescriptor, RawPort, RawSetting, RawSettingsInfo, SettingDescriptor, SettingKind,
    SettingsCatalog,
};
pub use error::SettingsError;
pub use host::{native_values, HostOverrides};
pub use profile::{SettingsProfile, PROFILE_VERSION};
pub use store::{Settings, SyncSettings};
pub use surface::{BoundProperties, PropertyCategory, PropertyHandle, PropertySurface};
