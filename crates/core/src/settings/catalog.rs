//! Setting descriptor catalog
//!
//! The catalog is the immutable description of everything a core lets the host
//! configure: scalar settings, controller ports and display layers. It is built
//! once from the schema the native core reports about itself and is then shared
//! by every settings instance of that core.

use super::error::SettingsError;
use crate::logging::{log, LogCategory, LogLevel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Value kind of a scalar setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettingKind {
    Int,
    UInt,
    Bool,
    Float,
    String,
    Enum,
}

impl SettingKind {
    /// Parse the kind tag reported by the native schema (case-insensitive)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_lowercase().as_str() {
            "int" => Some(SettingKind::Int),
            "uint" => Some(SettingKind::UInt),
            "bool" => Some(SettingKind::Bool),
            "float" => Some(SettingKind::Float),
            "string" => Some(SettingKind::String),
            "enum" => Some(SettingKind::Enum),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, SettingKind::Int | SettingKind::UInt | SettingKind::Float)
    }
}

/// A (display name, raw value) pair, used for enum choices and port devices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// User-facing name (e.g., "Japan", "Gamepad")
    pub name: String,
    /// Raw string understood by the native core (e.g., "jp", "gamepad")
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Choice {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            description: None,
        }
    }
}

/// One scalar setting
#[derive(Debug, Clone, PartialEq)]
pub struct SettingDescriptor {
    /// Native field name (e.g., "pce.slstart")
    pub key: String,
    pub kind: SettingKind,
    pub name: String,
    pub description: String,
    /// Always parseable under `kind`
    pub default_value: String,
    pub min: Option<String>,
    pub max: Option<String>,
    /// Non-empty only for `SettingKind::Enum`
    pub choices: Vec<Choice>,
}

impl SettingDescriptor {
    /// Choice whose raw value matches the default (enum kind only)
    pub fn default_choice(&self) -> Option<&Choice> {
        self.choices.iter().find(|c| c.value == self.default_value)
    }
}

/// One controller port
#[derive(Debug, Clone, PartialEq)]
pub struct PortDescriptor {
    pub name: String,
    /// Position in the catalog, stable for the lifetime of the core instance
    pub index: usize,
    pub allowed_devices: Vec<Choice>,
    pub default_setting_value: String,
}

impl PortDescriptor {
    pub fn allows(&self, setting_value: &str) -> bool {
        self.allowed_devices.iter().any(|d| d.value == setting_value)
    }

    pub fn default_device(&self) -> Option<&Choice> {
        self.allowed_devices
            .iter()
            .find(|d| d.value == self.default_setting_value)
    }
}

/// Raw scalar entry as reported by the native core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSetting {
    pub key: String,
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub default: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

/// Raw port entry as reported by the native core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPort {
    pub name: String,
    pub default: String,
    pub devices: Vec<Choice>,
}

/// Self-reported schema of a native core, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSettingsInfo {
    /// Native system short name (e.g., "pce"), used to address ports
    pub short_name: String,
    #[serde(default)]
    pub settings: Vec<RawSetting>,
    #[serde(default)]
    pub ports: Vec<RawPort>,
    #[serde(default)]
    pub layers: Vec<String>,
}

impl RawSettingsInfo {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Validated, immutable catalog
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsCatalog {
    short_name: String,
    settings: Vec<SettingDescriptor>,
    ports: Vec<PortDescriptor>,
    layer_names: Vec<String>,
    hidden: BTreeSet<String>,
}

impl SettingsCatalog {
    /// Validate a raw schema
    ///
    /// `hidden` lists keys that stay in the catalog but are suppressed from the
    /// typed surface. Fails on an unknown kind tag or on any entry breaking the
    /// descriptor invariants.
    pub fn from_raw<I, S>(raw: RawSettingsInfo, hidden: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut settings = Vec::with_capacity(raw.settings.len());
        for entry in raw.settings {
            if !seen.insert(entry.key.clone()) {
                return Err(SettingsError::invalid(&entry.key, "duplicate setting key"));
            }
            settings.push(Self::validate_setting(entry)?);
        }

        let mut port_names = HashSet::new();
        let mut ports = Vec::with_capacity(raw.ports.len());
        for (index, port) in raw.ports.into_iter().enumerate() {
            if !port_names.insert(port.name.clone()) {
                return Err(SettingsError::invalid(&port.name, "duplicate port name"));
            }
            if seen.contains(&port.name) {
                return Err(SettingsError::invalid(
                    &port.name,
                    "port name collides with a setting key",
                ));
            }
            if port.devices.is_empty() {
                return Err(SettingsError::invalid(&port.name, "port has no devices"));
            }
            if !port.devices.iter().any(|d| d.value == port.default) {
                return Err(SettingsError::invalid(
                    &port.name,
                    format!("default device `{}` is not allowed", port.default),
                ));
            }
            ports.push(PortDescriptor {
                name: port.name,
                index,
                allowed_devices: port.devices,
                default_setting_value: port.default,
            });
        }

        {
            let mut layer_names = HashSet::new();
            if let Some(dup) = raw.layers.iter().find(|l| !layer_names.insert(l.as_str())) {
                return Err(SettingsError::invalid(dup, "duplicate layer name"));
            }
        }

        let catalog = Self {
            short_name: raw.short_name,
            settings,
            ports,
            layer_names: raw.layers,
            hidden: hidden.into_iter().map(Into::into).collect(),
        };

        log(LogCategory::Catalog, LogLevel::Info, || {
            format!(
                "Catalog[{}]: {} settings ({} hidden), {} ports, {} layers",
                catalog.short_name,
                catalog.settings.len(),
                catalog.hidden.len(),
                catalog.ports.len(),
                catalog.layer_names.len()
            )
        });

        Ok(catalog)
    }

    pub fn from_json<I, S>(json: &str, hidden: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_raw(RawSettingsInfo::from_json(json)?, hidden)
    }

    fn validate_setting(entry: RawSetting) -> Result<SettingDescriptor, SettingsError> {
        let kind = SettingKind::from_tag(&entry.kind).ok_or_else(|| SettingsError::UnknownKind {
            key: entry.key.clone(),
            kind: entry.kind.clone(),
        })?;

        if !kind.is_numeric() && (entry.min.is_some() || entry.max.is_some()) {
            return Err(SettingsError::invalid(
                &entry.key,
                "bounds are only allowed on numeric settings",
            ));
        }

        // Numeric and bool defaults are stored in the form writes produce, so
        // writing the default back always normalizes to "absent".
        let default_value = match kind {
            SettingKind::Int => check_numeric::<i64>(&entry)?,
            SettingKind::UInt => check_numeric::<u64>(&entry)?,
            SettingKind::Float => check_numeric::<f64>(&entry)?,
            SettingKind::Bool => match entry.default.parse::<i64>() {
                Ok(0) => "0".to_string(),
                Ok(_) => "1".to_string(),
                Err(_) => {
                    return Err(SettingsError::invalid(
                        &entry.key,
                        format!("bool default `{}` is not an integer", entry.default),
                    ));
                }
            },
            SettingKind::Enum => {
                if !entry.choices.iter().any(|c| c.value == entry.default) {
                    return Err(SettingsError::invalid(
                        &entry.key,
                        format!("enum default `{}` is not a choice", entry.default),
                    ));
                }
                entry.default.clone()
            }
            SettingKind::String => entry.default.clone(),
        };
        if default_value != entry.default {
            log(LogCategory::Catalog, LogLevel::Debug, || {
                format!(
                    "Catalog: `{}` default `{}` stored as `{}`",
                    entry.key, entry.default, default_value
                )
            });
        }

        Ok(SettingDescriptor {
            key: entry.key,
            kind,
            name: entry.name,
            description: entry.description,
            default_value,
            min: entry.min,
            max: entry.max,
            choices: if kind == SettingKind::Enum {
                entry.choices
            } else {
                Vec::new()
            },
        })
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// All scalar settings, hidden ones included, in catalog order
    pub fn settings(&self) -> &[SettingDescriptor] {
        &self.settings
    }

    /// Scalar settings exposed on the typed surface
    pub fn visible_settings(&self) -> impl Iterator<Item = &SettingDescriptor> {
        self.settings.iter().filter(|s| !self.hidden.contains(&s.key))
    }

    pub fn setting(&self, key: &str) -> Option<&SettingDescriptor> {
        self.settings.iter().find(|s| s.key == key)
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        &self.ports
    }

    pub fn layer_names(&self) -> &[String] {
        &self.layer_names
    }

    pub fn hidden(&self) -> &BTreeSet<String> {
        &self.hidden
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden.contains(key)
    }

    /// Native key a port's device binding is sent under
    pub fn port_key(&self, index: usize) -> String {
        format!("{}.input.port{}", self.short_name, index + 1)
    }
}

fn check_numeric<T: std::str::FromStr + PartialOrd + ToString>(
    entry: &RawSetting,
) -> Result<String, SettingsError> {
    let parse = |label: &str, s: &str| {
        s.parse::<T>().map_err(|_| {
            SettingsError::invalid(&entry.key, format!("{} `{}` does not parse", label, s))
        })
    };
    let default = parse("default", &entry.default)?;
    if let Some(min) = entry.min.as_deref() {
        if default < parse("min", min)? {
            return Err(SettingsError::invalid(&entry.key, "default is below min"));
        }
    }
    if let Some(max) = entry.max.as_deref() {
        if default > parse("max", max)? {
            return Err(SettingsError::invalid(&entry.key, "default is above max"));
        }
    }
    Ok(default.to_string())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Small PC Engine-like schema shared by the settings tests
    pub(crate) fn sample_raw() -> RawSettingsInfo {
        RawSettingsInfo {
            short_name: "pce".to_string(),
            settings: vec![
                RawSetting {
                    key: "volume".to_string(),
                    kind: "int".to_string(),
                    name: "Volume".to_string(),
                    description: "Master volume".to_string(),
                    default: "100".to_string(),
                    min: Some("0".to_string()),
                    max: Some("200".to_string()),
                    choices: Vec::new(),
                },
                RawSetting {
                    key: "region".to_string(),
                    kind: "enum".to_string(),
                    name: "Region".to_string(),
                    description: "Console region".to_string(),
                    default: "auto".to_string(),
                    min: None,
                    max: None,
                    choices: vec![Choice::new("Auto", "auto"), Choice::new("Japan", "jp")],
                },
                RawSetting {
                    key: "pce.nospritelimit".to_string(),
                    kind: "bool".to_string(),
                    name: "No Sprite Limit".to_string(),
                    description: "Remove the 16-sprites-per-line limit".to_string(),
                    default: "0".to_string(),
                    min: None,
                    max: None,
                    choices: Vec::new(),
                },
                RawSetting {
                    key: "pce.ocmultiplier".to_string(),
                    kind: "uint".to_string(),
                    name: "CPU Overclock".to_string(),
                    description: "Overclock multiplier".to_string(),
                    default: "1".to_string(),
                    min: Some("1".to_string()),
                    max: Some("100".to_string()),
                    choices: Vec::new(),
                },
                RawSetting {
                    key: "pce.cdpsgvolume".to_string(),
                    kind: "float".to_string(),
                    name: "PSG Volume".to_string(),
                    description: "CD PSG volume scale".to_string(),
                    default: "1.5".to_string(),
                    min: Some("0".to_string()),
                    max: Some("2".to_string()),
                    choices: Vec::new(),
                },
                RawSetting {
                    key: "pce.palette".to_string(),
                    kind: "string".to_string(),
                    name: "Palette".to_string(),
                    description: "Custom palette file".to_string(),
                    default: String::new(),
                    min: None,
                    max: None,
                    choices: Vec::new(),
                },
                RawSetting {
                    key: "pce.cdbios".to_string(),
                    kind: "string".to_string(),
                    name: "CD BIOS".to_string(),
                    description: "Path to the CD BIOS".to_string(),
                    default: "syscard3.pce".to_string(),
                    min: None,
                    max: None,
                    choices: Vec::new(),
                },
            ],
            ports: vec![
                RawPort {
                    name: "Port 1".to_string(),
                    default: "gamepad".to_string(),
                    devices: vec![
                        Choice::new("None", "none"),
                        Choice::new("Gamepad", "gamepad"),
                        Choice::new("Mouse", "mouse"),
                    ],
                },
                RawPort {
                    name: "Port 2".to_string(),
                    default: "none".to_string(),
                    devices: vec![Choice::new("None", "none"), Choice::new("Gamepad", "gamepad")],
                },
            ],
            layers: vec!["BG0".to_string(), "SPR0".to_string()],
        }
    }

    pub(crate) fn sample_catalog() -> SettingsCatalog {
        SettingsCatalog::from_raw(sample_raw(), ["pce.cdbios"]).expect("valid catalog")
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(SettingKind::from_tag("int"), Some(SettingKind::Int));
        assert_eq!(SettingKind::from_tag("UINT"), Some(SettingKind::UInt));
        assert_eq!(SettingKind::from_tag("Bool"), Some(SettingKind::Bool));
        assert_eq!(SettingKind::from_tag("float"), Some(SettingKind::Float));
        assert_eq!(SettingKind::from_tag("string"), Some(SettingKind::String));
        assert_eq!(SettingKind::from_tag("enum"), Some(SettingKind::Enum));
        assert_eq!(SettingKind::from_tag("matrix"), None);
    }

    #[test]
    fn test_catalog_construction() {
        let catalog = sample_catalog();
        assert_eq!(catalog.short_name(), "pce");
        assert_eq!(catalog.settings().len(), 7);
        assert_eq!(catalog.visible_settings().count(), 6);
        assert!(catalog.is_hidden("pce.cdbios"));
        assert_eq!(catalog.ports().len(), 2);
        assert_eq!(catalog.ports()[1].index, 1);
        assert_eq!(catalog.layer_names(), &["BG0".to_string(), "SPR0".to_string()]);
        assert_eq!(catalog.port_key(0), "pce.input.port1");
    }

    #[test]
    fn test_unknown_kind_is_fatal() {
        let mut raw = sample_raw();
        raw.settings[0].kind = "matrix".to_string();
        let err = SettingsCatalog::from_raw(raw, Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, SettingsError::UnknownKind { ref kind, .. } if kind == "matrix"));
    }

    #[test]
    fn test_enum_default_must_be_choice() {
        let mut raw = sample_raw();
        raw.settings[1].default = "eu".to_string();
        let err = SettingsCatalog::from_raw(raw, Vec::<String>::new()).unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_numeric_default_within_bounds() {
        let mut raw = sample_raw();
        raw.settings[0].default = "300".to_string();
        assert!(SettingsCatalog::from_raw(raw, Vec::<String>::new()).is_err());

        let mut raw = sample_raw();
        raw.settings[0].min = Some("low".to_string());
        assert!(SettingsCatalog::from_raw(raw, Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_port_default_must_be_allowed() {
        let mut raw = sample_raw();
        raw.ports[0].default = "lightgun".to_string();
        assert!(SettingsCatalog::from_raw(raw, Vec::<String>::new()).is_err());

        let mut raw = sample_raw();
        raw.ports[1].devices.clear();
        assert!(SettingsCatalog::from_raw(raw, Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let mut raw = sample_raw();
        let dup = raw.settings[0].clone();
        raw.settings.push(dup);
        assert!(SettingsCatalog::from_raw(raw, Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_duplicate_layer_rejected() {
        let mut raw = sample_raw();
        raw.layers.push("BG0".to_string());
        let err = SettingsCatalog::from_raw(raw, Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidSchema { ref key, .. } if key == "BG0"));
    }

    #[test]
    fn test_port_name_colliding_with_key_rejected() {
        let mut raw = sample_raw();
        raw.ports[1].name = "volume".to_string();
        let err = SettingsCatalog::from_raw(raw, Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidSchema { ref key, .. } if key == "volume"));
    }

    #[test]
    fn test_defaults_are_canonicalized() {
        let mut raw = sample_raw();
        raw.settings[0].default = "+100".to_string();
        raw.settings[2].default = "2".to_string();
        raw.settings[4].default = "1.50".to_string();
        let catalog = SettingsCatalog::from_raw(raw, Vec::<String>::new()).unwrap();

        assert_eq!(catalog.setting("volume").unwrap().default_value, "100");
        assert_eq!(catalog.setting("pce.nospritelimit").unwrap().default_value, "1");
        assert_eq!(catalog.setting("pce.cdpsgvolume").unwrap().default_value, "1.5");
        // Strings and enums keep their raw default
        assert_eq!(catalog.setting("region").unwrap().default_value, "auto");
    }

    #[test]
    fn test_catalog_from_json() {
        let json = r#"{
            "short_name": "pce",
            "settings": [
                {"key": "pce.slstart", "kind": "uint", "name": "First line",
                 "default": "4", "min": "0", "max": "239"}
            ],
            "ports": [
                {"name": "Port 1", "default": "gamepad",
                 "devices": [{"name": "Gamepad", "value": "gamepad"}]}
            ],
            "layers": ["BG0", "SPR0"]
        }"#;
        let catalog = SettingsCatalog::from_json(json, Vec::<String>::new()).unwrap();
        assert_eq!(catalog.settings()[0].kind, SettingKind::UInt);
        assert_eq!(catalog.settings()[0].max.as_deref(), Some("239"));
        assert_eq!(catalog.ports()[0].default_device().unwrap().name, "Gamepad");
    }
}
