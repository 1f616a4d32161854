//! Dynamic property surface
//!
//! Turns a catalog into an ordered list of property handles that generic
//! tooling (a property grid, a serializer, the CLI) can enumerate without
//! knowing the schema of any particular core. Handles are derived purely from
//! the catalog, so the same catalog always yields the same list.

use super::accessor::{
    LayerAccessor, PortAccessor, PropertyAccessor, ScalarAccessor, SettingValue,
};
use super::catalog::{Choice, SettingKind, SettingsCatalog};
use super::error::SettingsError;
use super::store::{Settings, SyncSettings};
use std::fmt;

/// Grouping shown by property-grid hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyCategory {
    Settings,
    Ports,
    Layers,
}

impl PropertyCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyCategory::Settings => "Settings",
            PropertyCategory::Ports => "Ports",
            PropertyCategory::Layers => "Layers",
        }
    }
}

impl fmt::Display for PropertyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One addressable property over instances of `T`
pub struct PropertyHandle<T> {
    name: String,
    display_name: String,
    description: Option<String>,
    category: PropertyCategory,
    value_type: SettingKind,
    choices: Vec<Choice>,
    accessor: Box<dyn PropertyAccessor<T>>,
}

impl<T> PropertyHandle<T> {
    /// Stable name: the setting key, port name or layer name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn category(&self) -> PropertyCategory {
        self.category
    }

    pub fn value_type(&self) -> SettingKind {
        self.value_type
    }

    /// Every property can be reset to its default
    pub fn can_reset(&self) -> bool {
        true
    }

    /// Enum choices or port devices as (display name, raw value) pairs
    pub fn standard_values(&self) -> &[Choice] {
        &self.choices
    }

    pub fn get(&self, instance: &T) -> Result<SettingValue, SettingsError> {
        self.accessor.get(instance)
    }

    pub fn set(&self, instance: &mut T, value: SettingValue) -> Result<(), SettingsError> {
        self.accessor.set(instance, value)
    }

    pub fn reset(&self, instance: &mut T) {
        self.accessor.reset(instance)
    }

    pub fn is_overridden(&self, instance: &T) -> bool {
        self.accessor.is_overridden(instance)
    }

    /// Whether a serializer should persist this property at all
    pub fn should_serialize(&self, instance: &T) -> bool {
        self.is_overridden(instance)
    }
}

impl<T> fmt::Debug for PropertyHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyHandle")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("value_type", &self.value_type)
            .finish()
    }
}

/// Ordered property handles for one instance kind
pub struct PropertySurface<T> {
    component_name: &'static str,
    handles: Vec<PropertyHandle<T>>,
}

impl PropertySurface<SyncSettings> {
    /// Ports in index order, then visible scalar settings in catalog order
    pub fn for_sync_settings(catalog: &SettingsCatalog) -> Result<Self, SettingsError> {
        let mut handles = Vec::with_capacity(catalog.ports().len() + catalog.settings().len());

        for port in catalog.ports() {
            handles.push(PropertyHandle {
                name: port.name.clone(),
                display_name: port.name.clone(),
                description: Some(format!("Change the device plugged into {}", port.name)),
                category: PropertyCategory::Ports,
                value_type: SettingKind::String,
                choices: port.allowed_devices.clone(),
                accessor: Box::new(PortAccessor::new(port)),
            });
        }

        for setting in catalog.visible_settings() {
            let accessor = ScalarAccessor::new(setting)?;
            handles.push(PropertyHandle {
                name: setting.key.clone(),
                display_name: setting.name.clone(),
                description: Some(format!("{}\n[{}]", setting.description, setting.key)),
                category: PropertyCategory::Settings,
                value_type: accessor.kind(),
                choices: setting.choices.clone(),
                accessor: Box::new(accessor),
            });
        }

        Ok(Self {
            component_name: "SyncSettings",
            handles,
        })
    }
}

impl PropertySurface<Settings> {
    /// One visibility toggle per layer, in catalog order
    pub fn for_settings(catalog: &SettingsCatalog) -> Self {
        let handles = catalog
            .layer_names()
            .iter()
            .map(|layer| PropertyHandle {
                name: layer.clone(),
                display_name: format!("Show {}", layer),
                description: None,
                category: PropertyCategory::Layers,
                value_type: SettingKind::Bool,
                choices: Vec::new(),
                accessor: Box::new(LayerAccessor::new(layer)) as Box<dyn PropertyAccessor<Settings>>,
            })
            .collect();

        Self {
            component_name: "Settings",
            handles,
        }
    }
}

impl<T> PropertySurface<T> {
    pub fn component_name(&self) -> &'static str {
        self.component_name
    }

    pub fn handles(&self) -> &[PropertyHandle<T>] {
        &self.handles
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyHandle<T>> {
        self.handles.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// The first property, which grid hosts select initially
    pub fn default_property(&self) -> Option<&PropertyHandle<T>> {
        self.handles.first()
    }

    pub fn find(&self, name: &str) -> Option<&PropertyHandle<T>> {
        self.handles.iter().find(|h| h.name == name)
    }

    fn require(&self, name: &str) -> Result<&PropertyHandle<T>, SettingsError> {
        self.find(name)
            .ok_or_else(|| SettingsError::UnknownProperty(name.to_string()))
    }

    /// Attach the handle list to one instance for name-addressed access
    pub fn bind<'a>(&'a self, instance: &'a mut T) -> BoundProperties<'a, T> {
        BoundProperties {
            surface: self,
            instance,
        }
    }

    /// Read every property of `instance`, in surface order
    pub fn snapshot(&self, instance: &T) -> Result<Vec<(String, SettingValue)>, SettingsError> {
        self.handles
            .iter()
            .map(|h| h.get(instance).map(|value| (h.name.clone(), value)))
            .collect()
    }
}

/// A surface bound to one settings instance
pub struct BoundProperties<'a, T> {
    surface: &'a PropertySurface<T>,
    instance: &'a mut T,
}

impl<'a, T> BoundProperties<'a, T> {
    pub fn get(&self, name: &str) -> Result<SettingValue, SettingsError> {
        self.surface.require(name)?.get(&*self.instance)
    }

    pub fn set(&mut self, name: &str, value: SettingValue) -> Result<(), SettingsError> {
        self.surface.require(name)?.set(&mut *self.instance, value)
    }

    pub fn reset(&mut self, name: &str) -> Result<(), SettingsError> {
        self.surface.require(name)?.reset(&mut *self.instance);
        Ok(())
    }

    pub fn is_overridden(&self, name: &str) -> Result<bool, SettingsError> {
        Ok(self.surface.require(name)?.is_overridden(&*self.instance))
    }

    /// Reset every property of the instance
    pub fn reset_all(&mut self) {
        for handle in &self.surface.handles {
            handle.reset(&mut *self.instance);
        }
    }

    /// Names of properties that differ from their defaults
    pub fn overridden(&self) -> Vec<&'a str> {
        let surface: &'a PropertySurface<T> = self.surface;
        surface
            .handles
            .iter()
            .filter(|h| h.is_overridden(&*self.instance))
            .map(|h| h.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::catalog::tests::sample_catalog;

    #[test]
    fn test_sync_surface_order() {
        let catalog = sample_catalog();
        let surface = PropertySurface::for_sync_settings(&catalog).unwrap();
        let names: Vec<&str> = surface.iter().map(|h| h.name()).collect();
        assert_eq!(
            names,
            vec![
                "Port 1",
                "Port 2",
                "volume",
                "region",
                "pce.nospritelimit",
                "pce.ocmultiplier",
                "pce.cdpsgvolume",
                "pce.palette",
            ]
        );
        assert_eq!(surface.component_name(), "SyncSettings");
        assert_eq!(surface.default_property().unwrap().name(), "Port 1");
        // Hidden keys never appear
        assert!(surface.find("pce.cdbios").is_none());
    }

    #[test]
    fn test_surface_is_rederivable() {
        let catalog = sample_catalog();
        let a = PropertySurface::for_sync_settings(&catalog).unwrap();
        let b = PropertySurface::for_sync_settings(&catalog).unwrap();
        let names_a: Vec<&str> = a.iter().map(|h| h.name()).collect();
        let names_b: Vec<&str> = b.iter().map(|h| h.name()).collect();
        assert_eq!(names_a, names_b);
    }

    #[test]
    fn test_handle_metadata() {
        let catalog = sample_catalog();
        let surface = PropertySurface::for_sync_settings(&catalog).unwrap();

        let port = surface.find("Port 1").unwrap();
        assert_eq!(port.category(), PropertyCategory::Ports);
        assert_eq!(port.description(), Some("Change the device plugged into Port 1"));
        assert_eq!(port.standard_values().len(), 3);

        let volume = surface.find("volume").unwrap();
        assert_eq!(volume.category(), PropertyCategory::Settings);
        assert_eq!(volume.display_name(), "Volume");
        assert_eq!(volume.description(), Some("Master volume\n[volume]"));
        assert_eq!(volume.value_type(), SettingKind::Int);
        assert!(volume.can_reset());

        let region = surface.find("region").unwrap();
        assert_eq!(region.value_type(), SettingKind::Enum);
        assert_eq!(region.standard_values()[1].value, "jp");
    }

    #[test]
    fn test_layer_surface() {
        let catalog = sample_catalog();
        let surface = PropertySurface::for_settings(&catalog);
        assert_eq!(surface.component_name(), "Settings");
        assert_eq!(surface.len(), 2);

        let bg = surface.find("BG0").unwrap();
        assert_eq!(bg.display_name(), "Show BG0");
        assert_eq!(bg.description(), None);
        assert_eq!(bg.category().as_str(), "Layers");

        let mut settings = Settings::new();
        bg.set(&mut settings, SettingValue::Bool(false)).unwrap();
        assert!(bg.should_serialize(&settings));
        assert_eq!(settings.layer_mask(&catalog), 0b10);
    }

    #[test]
    fn test_bound_properties() {
        let catalog = sample_catalog();
        let surface = PropertySurface::for_sync_settings(&catalog).unwrap();
        let mut sync = SyncSettings::new();

        {
            let mut bound = surface.bind(&mut sync);
            bound.set("volume", SettingValue::Int(150)).unwrap();
            bound.set("Port 2", SettingValue::String("gamepad".to_string())).unwrap();
            assert_eq!(bound.get("volume").unwrap(), SettingValue::Int(150));
            assert!(bound.is_overridden("volume").unwrap());
            assert_eq!(bound.overridden(), vec!["Port 2", "volume"]);

            bound.reset("volume").unwrap();
            assert!(!bound.is_overridden("volume").unwrap());

            assert!(matches!(
                bound.set("missing", SettingValue::Int(1)),
                Err(SettingsError::UnknownProperty(_))
            ));
        }

        assert_eq!(sync.port_device(1), Some("gamepad"));
        surface.bind(&mut sync).reset_all();
        assert!(sync.is_default());
    }

    #[test]
    fn test_snapshot() {
        let catalog = sample_catalog();
        let surface = PropertySurface::for_sync_settings(&catalog).unwrap();
        let sync = SyncSettings::new();
        let snapshot = surface.snapshot(&sync).unwrap();
        assert_eq!(snapshot.len(), surface.len());
        assert_eq!(snapshot[2], ("volume".to_string(), SettingValue::Int(100)));
    }

    #[test]
    fn test_snapshot_surfaces_parse_errors() {
        let catalog = sample_catalog();
        let surface = PropertySurface::for_sync_settings(&catalog).unwrap();
        let mut sync = SyncSettings::new();
        sync.values.insert("volume".to_string(), "loud".to_string());
        assert!(surface.snapshot(&sync).is_err());
        // Other properties remain readable
        assert!(surface.find("region").unwrap().get(&sync).is_ok());
    }
}
