//! The JSON equipment configuration.
//!
//! A configuration maps logical device names to a [`DeviceConfig`]:
//!
//! ```json
//! {
//!   "source_v_in": {
//!     "object": "Sorensen_SGA",
//!     "address": "TCPIP0::10.0.0.5::5025::SOCKET",
//!     "kwargs": {"timeout": 2.0},
//!     "init": [["set_voltage", {"voltage": 0}], ["off", {}]]
//!   }
//! }
//! ```
//!
//! Devices keep the order in which they appear in the file.

use std::{fs, path::Path, str::FromStr, time::Duration};

use equipmentrs::ConnectionSettings;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::CollectionError;

/// One initialization step: the command name and its arguments.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct InitStep(pub String, pub Map<String, Value>);

impl InitStep {
    /// Create a step from a command name and its arguments.
    pub fn new(name: &str, args: Map<String, Value>) -> Self {
        Self(name.to_string(), args)
    }

    /// Name of the command.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Arguments of the command.
    pub fn args(&self) -> &Map<String, Value> {
        &self.1
    }
}

/// Configuration of a single device.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DeviceConfig {
    /// Registry identifier of the driver, e.g., `"HP_34401A"`.
    pub object: String,
    /// Resource address of the device.
    pub address: String,
    /// Legacy module path of the driver. Accepted for compatibility and otherwise ignored.
    #[serde(default)]
    pub definition: Option<String>,
    /// Connection settings and driver parameters.
    #[serde(default)]
    pub kwargs: Map<String, Value>,
    /// Initialization steps, run in order.
    #[serde(default)]
    pub init: Vec<InitStep>,
}

impl DeviceConfig {
    /// Create a configuration without keyword arguments or initialization steps.
    pub fn new(object: &str, address: &str) -> Self {
        Self {
            object: object.to_string(),
            address: address.to_string(),
            definition: None,
            kwargs: Map::new(),
            init: Vec::new(),
        }
    }

    /// Build the connection settings from the keyword arguments.
    ///
    /// Recognized keys are `timeout` and `open_timeout` in seconds, `clear` and `baud_rate`.
    /// Missing keys keep their defaults, other keys are left to the driver.
    pub fn connection_settings(&self) -> Result<ConnectionSettings, CollectionError> {
        let mut settings = ConnectionSettings::default();
        if let Some(secs) = self.kwarg_f64("timeout")? {
            settings.timeout = seconds("timeout", secs)?;
        }
        if let Some(secs) = self.kwarg_f64("open_timeout")? {
            settings.open_timeout = seconds("open_timeout", secs)?;
        }
        if let Some(value) = self.kwarg("clear") {
            settings.clear = value
                .as_bool()
                .ok_or_else(|| invalid_kwarg("clear", "a boolean", value))?;
        }
        if let Some(value) = self.kwarg("baud_rate") {
            settings.baud_rate = value
                .as_u64()
                .and_then(|b| u32::try_from(b).ok())
                .ok_or_else(|| invalid_kwarg("baud_rate", "a positive integer", value))?;
        }
        Ok(settings)
    }

    /// A numeric keyword argument, `None` if it is not given.
    pub fn kwarg_f64(&self, key: &str) -> Result<Option<f64>, CollectionError> {
        match self.kwarg(key) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| invalid_kwarg(key, "a number", value)),
        }
    }

    fn kwarg(&self, key: &str) -> Option<&Value> {
        self.kwargs.get(key).filter(|v| !v.is_null())
    }
}

fn seconds(key: &str, secs: f64) -> Result<Duration, CollectionError> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        CollectionError::Config(format!(
            "kwarg {key} must be a non-negative number of seconds, got {secs}"
        ))
    })
}

fn invalid_kwarg(key: &str, expected: &str, value: &Value) -> CollectionError {
    CollectionError::Config(format!("kwarg {key} must be {expected}, got {value}"))
}

/// A full equipment configuration, devices in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EquipmentConfig {
    devices: Vec<(String, DeviceConfig)>,
}

impl EquipmentConfig {
    /// Read a configuration from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CollectionError> {
        fs::read_to_string(path)?.parse()
    }

    /// Build a configuration from an already parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, CollectionError> {
        let Value::Object(map) = value else {
            return Err(CollectionError::Config(
                "top level must be an object mapping names to devices".to_string(),
            ));
        };
        let devices = map
            .into_iter()
            .map(|(name, device)| match serde_json::from_value(device) {
                Ok(device) => Ok((name, device)),
                Err(e) => Err(CollectionError::Config(format!("{name}: {e}"))),
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { devices })
    }

    /// Add a device at the end, replacing a device with the same name.
    pub fn insert(&mut self, name: &str, device: DeviceConfig) {
        self.devices.retain(|(n, _)| n != name);
        self.devices.push((name.to_string(), device));
    }

    /// The configuration of the named device.
    pub fn get(&self, name: &str) -> Option<&DeviceConfig> {
        self.devices.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }

    /// Names of all devices.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(|(n, _)| n.as_str())
    }

    /// Iterate over the devices in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceConfig)> {
        self.devices.iter().map(|(n, d)| (n.as_str(), d))
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// `true` if no devices are configured.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Keep only the named devices.
    ///
    /// Fails with [`CollectionError::MissingResources`] if any of the names is not configured, in
    /// which case the configuration is left untouched.
    pub fn retain_names<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), CollectionError> {
        let missing: Vec<String> = names
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| self.get(name).is_none())
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(CollectionError::MissingResources(missing));
        }
        self.devices
            .retain(|(n, _)| names.iter().any(|name| name.as_ref() == n));
        Ok(())
    }
}

impl FromStr for EquipmentConfig {
    type Err = CollectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_value(serde_json::from_str(s)?)
    }
}

impl IntoIterator for EquipmentConfig {
    type Item = (String, DeviceConfig);
    type IntoIter = std::vec::IntoIter<(String, DeviceConfig)>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.into_iter()
    }
}
