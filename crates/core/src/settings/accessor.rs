//! Typed accessor layer
//!
//! Accessors bind one catalog entry to the conversion rules of its kind. They
//! hold no state of their own: every read goes to the instance's override map
//! and falls back to the catalog default, and every write is normalized so that
//! a value equal to the default is stored as "absent".

use super::catalog::{Choice, PortDescriptor, SettingDescriptor, SettingKind};
use super::error::SettingsError;
use super::store::{Settings, SyncSettings};
use crate::logging::{log, LogCategory, LogLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A strongly-typed setting value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    /// Display name of an enum choice
    Enum(String),
}

impl SettingValue {
    pub fn kind(&self) -> SettingKind {
        match self {
            SettingValue::Bool(_) => SettingKind::Bool,
            SettingValue::Int(_) => SettingKind::Int,
            SettingValue::UInt(_) => SettingKind::UInt,
            SettingValue::Float(_) => SettingKind::Float,
            SettingValue::String(_) => SettingKind::String,
            SettingValue::Enum(_) => SettingKind::Enum,
        }
    }

    /// Parse user-entered text as a value of `kind`
    ///
    /// Bools accept `true`/`false`/`on`/`off`/`1`/`0`.
    pub fn parse_as(kind: SettingKind, text: &str) -> Option<Self> {
        match kind {
            SettingKind::Bool => match text.to_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Some(SettingValue::Bool(true)),
                "false" | "off" | "no" | "0" => Some(SettingValue::Bool(false)),
                _ => None,
            },
            SettingKind::Int => text.parse().ok().map(SettingValue::Int),
            SettingKind::UInt => text.parse().ok().map(SettingValue::UInt),
            SettingKind::Float => text.parse().ok().map(SettingValue::Float),
            SettingKind::String => Some(SettingValue::String(text.to_string())),
            SettingKind::Enum => Some(SettingValue::Enum(text.to_string())),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(v) => write!(f, "{}", v),
            SettingValue::Int(v) => write!(f, "{}", v),
            SettingValue::UInt(v) => write!(f, "{}", v),
            SettingValue::Float(v) => write!(f, "{}", v),
            SettingValue::String(v) | SettingValue::Enum(v) => f.write_str(v),
        }
    }
}

/// Inclusive bounds plus the parsed default used when a value falls outside them
#[derive(Debug, Clone, PartialEq)]
pub struct Bounded<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub default: T,
}

impl<T: PartialOrd + Copy> Bounded<T> {
    fn clamp_to_default(&self, value: T) -> (T, bool) {
        let below = self.min.map_or(false, |min| value < min);
        let above = self.max.map_or(false, |max| value > max);
        if below || above {
            (self.default, true)
        } else {
            (value, false)
        }
    }
}

/// Per-kind conversion between native strings and typed values
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    Int(Bounded<i64>),
    UInt(Bounded<u64>),
    Float(Bounded<f64>),
    Bool,
    String,
    Enum {
        choices: Vec<Choice>,
        default_value: String,
    },
}

impl Conversion {
    /// Build the conversion for a descriptor, parsing bounds and default once
    pub fn for_descriptor(desc: &SettingDescriptor) -> Result<Self, SettingsError> {
        Ok(match desc.kind {
            SettingKind::Int => Conversion::Int(bounded(desc)?),
            SettingKind::UInt => Conversion::UInt(bounded(desc)?),
            SettingKind::Float => Conversion::Float(bounded(desc)?),
            SettingKind::Bool => Conversion::Bool,
            SettingKind::String => Conversion::String,
            SettingKind::Enum => {
                if desc.default_choice().is_none() {
                    return Err(SettingsError::invalid(&desc.key, "enum default is not a choice"));
                }
                Conversion::Enum {
                    choices: desc.choices.clone(),
                    default_value: desc.default_value.clone(),
                }
            }
        })
    }

    pub fn kind(&self) -> SettingKind {
        match self {
            Conversion::Int(_) => SettingKind::Int,
            Conversion::UInt(_) => SettingKind::UInt,
            Conversion::Float(_) => SettingKind::Float,
            Conversion::Bool => SettingKind::Bool,
            Conversion::String => SettingKind::String,
            Conversion::Enum { .. } => SettingKind::Enum,
        }
    }

    /// Native string -> typed value
    ///
    /// Numeric values outside the bounds and unknown enum values fall back to
    /// the default. A string that does not parse at all is an error.
    fn from_native(&self, key: &str, raw: &str) -> Result<SettingValue, SettingsError> {
        let parse_error = || SettingsError::Parse {
            key: key.to_string(),
            value: raw.to_string(),
            expected: self.kind(),
        };
        let (value, fell_back) = match self {
            Conversion::Int(b) => {
                let (v, f) = b.clamp_to_default(raw.parse().map_err(|_| parse_error())?);
                (SettingValue::Int(v), f)
            }
            Conversion::UInt(b) => {
                let (v, f) = b.clamp_to_default(raw.parse().map_err(|_| parse_error())?);
                (SettingValue::UInt(v), f)
            }
            Conversion::Float(b) => {
                let (v, f) = b.clamp_to_default(raw.parse().map_err(|_| parse_error())?);
                (SettingValue::Float(v), f)
            }
            Conversion::Bool => {
                let v: i64 = raw.parse().map_err(|_| parse_error())?;
                (SettingValue::Bool(v != 0), false)
            }
            Conversion::String => (SettingValue::String(raw.to_string()), false),
            Conversion::Enum {
                choices,
                default_value,
            } => match choices.iter().find(|c| c.value == raw) {
                Some(choice) => (SettingValue::Enum(choice.name.clone()), false),
                None => {
                    let name = choices
                        .iter()
                        .find(|c| &c.value == default_value)
                        .map(|c| c.name.clone())
                        .unwrap_or_default();
                    (SettingValue::Enum(name), true)
                }
            },
        };
        if fell_back {
            log(LogCategory::Settings, LogLevel::Debug, || {
                format!("Settings: `{}` value `{}` rejected, using default", key, raw)
            });
        }
        Ok(value)
    }

    /// Typed value -> native string
    fn to_native(&self, key: &str, value: &SettingValue) -> Result<String, SettingsError> {
        let mismatch = || SettingsError::TypeMismatch {
            key: key.to_string(),
            expected: self.kind(),
        };
        match (self, value) {
            (Conversion::Int(_), SettingValue::Int(v)) => Ok(v.to_string()),
            (Conversion::UInt(_), SettingValue::UInt(v)) => Ok(v.to_string()),
            (Conversion::Float(_), SettingValue::Float(v)) => Ok(v.to_string()),
            (Conversion::Bool, SettingValue::Bool(v)) => Ok(if *v { "1" } else { "0" }.to_string()),
            (Conversion::String, SettingValue::String(v)) => Ok(v.clone()),
            (
                Conversion::Enum {
                    choices,
                    default_value,
                },
                SettingValue::Enum(v) | SettingValue::String(v),
            ) => {
                let raw = choices
                    .iter()
                    .find(|c| &c.name == v)
                    .or_else(|| choices.iter().find(|c| &c.value == v))
                    .map(|c| c.value.clone());
                Ok(raw.unwrap_or_else(|| {
                    log(LogCategory::Settings, LogLevel::Debug, || {
                        format!("Settings: `{}` has no choice `{}`, using default", key, v)
                    });
                    default_value.clone()
                }))
            }
            _ => Err(mismatch()),
        }
    }
}

fn bounded<T: std::str::FromStr>(desc: &SettingDescriptor) -> Result<Bounded<T>, SettingsError> {
    let parse = |s: &str| {
        s.parse::<T>()
            .map_err(|_| SettingsError::invalid(&desc.key, format!("`{}` does not parse", s)))
    };
    Ok(Bounded {
        min: desc.min.as_deref().map(parse).transpose()?,
        max: desc.max.as_deref().map(parse).transpose()?,
        default: parse(&desc.default_value)?,
    })
}

/// Store `value` under `key`, or remove the key when it equals the default
///
/// Every setter goes through here so the override maps only ever hold
/// deviations from the catalog.
pub(crate) fn write_normalized<K: Ord>(
    map: &mut BTreeMap<K, String>,
    key: K,
    value: String,
    default: &str,
) {
    if value == default {
        map.remove(&key);
    } else {
        map.insert(key, value);
    }
}

/// Get/set/reset contract for one property over one instance kind
pub trait PropertyAccessor<T>: Send + Sync {
    fn get(&self, instance: &T) -> Result<SettingValue, SettingsError>;
    fn set(&self, instance: &mut T, value: SettingValue) -> Result<(), SettingsError>;
    fn reset(&self, instance: &mut T);
    fn is_overridden(&self, instance: &T) -> bool;
}

/// Accessor for a scalar setting
#[derive(Debug, Clone)]
pub struct ScalarAccessor {
    descriptor: SettingDescriptor,
    conversion: Conversion,
}

impl ScalarAccessor {
    pub fn new(descriptor: &SettingDescriptor) -> Result<Self, SettingsError> {
        Ok(Self {
            conversion: Conversion::for_descriptor(descriptor)?,
            descriptor: descriptor.clone(),
        })
    }

    pub fn descriptor(&self) -> &SettingDescriptor {
        &self.descriptor
    }

    pub fn kind(&self) -> SettingKind {
        self.conversion.kind()
    }

    /// Typed default value
    pub fn default_value(&self) -> Result<SettingValue, SettingsError> {
        self.conversion
            .from_native(&self.descriptor.key, &self.descriptor.default_value)
    }
}

impl PropertyAccessor<SyncSettings> for ScalarAccessor {
    fn get(&self, instance: &SyncSettings) -> Result<SettingValue, SettingsError> {
        let raw = instance
            .value(&self.descriptor.key)
            .unwrap_or(self.descriptor.default_value.as_str());
        self.conversion.from_native(&self.descriptor.key, raw)
    }

    fn set(&self, instance: &mut SyncSettings, value: SettingValue) -> Result<(), SettingsError> {
        let raw = self.conversion.to_native(&self.descriptor.key, &value)?;
        write_normalized(
            &mut instance.values,
            self.descriptor.key.clone(),
            raw,
            &self.descriptor.default_value,
        );
        Ok(())
    }

    fn reset(&self, instance: &mut SyncSettings) {
        instance.values.remove(&self.descriptor.key);
    }

    fn is_overridden(&self, instance: &SyncSettings) -> bool {
        instance.values.contains_key(&self.descriptor.key)
    }
}

/// Accessor for the device plugged into a port
///
/// Values are device setting values (e.g., "gamepad"). Writes of devices the
/// port does not list are dropped without error.
#[derive(Debug, Clone)]
pub struct PortAccessor {
    port: PortDescriptor,
}

impl PortAccessor {
    pub fn new(port: &PortDescriptor) -> Self {
        Self { port: port.clone() }
    }

    pub fn port(&self) -> &PortDescriptor {
        &self.port
    }

    /// Display name of the device currently plugged in
    pub fn device_name(&self, instance: &SyncSettings) -> String {
        let current = self.current(instance);
        self.port
            .allowed_devices
            .iter()
            .find(|d| d.value == current)
            .map(|d| d.name.clone())
            .unwrap_or_default()
    }

    fn current<'a>(&'a self, instance: &'a SyncSettings) -> &'a str {
        match instance.port_device(self.port.index) {
            Some(device) if self.port.allows(device) => device,
            Some(device) => {
                log(LogCategory::Ports, LogLevel::Debug, || {
                    format!(
                        "Ports: {} has unknown device `{}`, using default",
                        self.port.name, device
                    )
                });
                self.port.default_setting_value.as_str()
            }
            None => self.port.default_setting_value.as_str(),
        }
    }
}

impl PropertyAccessor<SyncSettings> for PortAccessor {
    fn get(&self, instance: &SyncSettings) -> Result<SettingValue, SettingsError> {
        Ok(SettingValue::String(self.current(instance).to_string()))
    }

    fn set(&self, instance: &mut SyncSettings, value: SettingValue) -> Result<(), SettingsError> {
        let device = match value {
            SettingValue::String(v) | SettingValue::Enum(v) => v,
            _ => {
                return Err(SettingsError::TypeMismatch {
                    key: self.port.name.clone(),
                    expected: SettingKind::String,
                })
            }
        };
        if device != self.port.default_setting_value && !self.port.allows(&device) {
            log(LogCategory::Ports, LogLevel::Debug, || {
                format!("Ports: {} does not accept `{}`, ignored", self.port.name, device)
            });
            return Ok(());
        }
        write_normalized(
            &mut instance.port_devices,
            self.port.index,
            device,
            &self.port.default_setting_value,
        );
        Ok(())
    }

    fn reset(&self, instance: &mut SyncSettings) {
        instance.port_devices.remove(&self.port.index);
    }

    fn is_overridden(&self, instance: &SyncSettings) -> bool {
        instance.port_devices.contains_key(&self.port.index)
    }
}

/// Accessor for a display layer's visibility (enabled unless disabled)
#[derive(Debug, Clone)]
pub struct LayerAccessor {
    layer: String,
}

impl LayerAccessor {
    pub fn new(layer: &str) -> Self {
        Self {
            layer: layer.to_string(),
        }
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }
}

impl PropertyAccessor<Settings> for LayerAccessor {
    fn get(&self, instance: &Settings) -> Result<SettingValue, SettingsError> {
        Ok(SettingValue::Bool(instance.is_layer_enabled(&self.layer)))
    }

    fn set(&self, instance: &mut Settings, value: SettingValue) -> Result<(), SettingsError> {
        match value {
            SettingValue::Bool(true) => {
                instance.disabled_layers.remove(&self.layer);
            }
            SettingValue::Bool(false) => {
                instance.disabled_layers.insert(self.layer.clone());
            }
            _ => {
                return Err(SettingsError::TypeMismatch {
                    key: self.layer.clone(),
                    expected: SettingKind::Bool,
                })
            }
        }
        log(LogCategory::Layers, LogLevel::Trace, || {
            format!("Layers: {} -> {}", self.layer, value)
        });
        Ok(())
    }

    fn reset(&self, instance: &mut Settings) {
        instance.disabled_layers.remove(&self.layer);
    }

    fn is_overridden(&self, instance: &Settings) -> bool {
        instance.disabled_layers.contains(&self.layer)
    }
}
