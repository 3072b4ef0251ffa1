//! Collections of connected devices.

use std::{any::Any, collections::HashMap};

use equipmentrs::InstrumentError;
use tracing::{info, warn};

use crate::{ConnectionOutcome, Device, DeviceKind};

/// Connected devices, by name and in configuration order.
///
/// Besides the devices, the collection keeps the [`ConnectionOutcome`] of every device of the
/// configuration it was built from, including the ones that could not be connected.
#[derive(Default)]
pub struct ResourceCollection {
    devices: Vec<(String, Box<dyn Device>)>,
    outcomes: Vec<(String, ConnectionOutcome)>,
}

impl ResourceCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device, replacing a device with the same name.
    pub fn insert(&mut self, name: &str, device: Box<dyn Device>) {
        self.devices.retain(|(n, _)| n != name);
        self.devices.push((name.to_string(), device));
    }

    /// Remove a device and return it.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Device>> {
        let pos = self.devices.iter().position(|(n, _)| n == name)?;
        Some(self.devices.remove(pos).1)
    }

    pub(crate) fn record(&mut self, name: &str, outcome: ConnectionOutcome) {
        self.outcomes.push((name.to_string(), outcome));
    }

    /// The outcome of connecting each configured device, in configuration order.
    pub fn outcomes(&self) -> &[(String, ConnectionOutcome)] {
        &self.outcomes
    }

    /// Number of connected devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// `true` if no device is connected.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// `true` if a device with the given name is connected.
    pub fn contains(&self, name: &str) -> bool {
        self.devices.iter().any(|(n, _)| n == name)
    }

    /// Names of the connected devices.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(|(n, _)| n.as_str())
    }

    /// The named device.
    pub fn get(&self, name: &str) -> Option<&dyn Device> {
        self.devices
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.as_ref())
    }

    /// The named device, mutable.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Device + 'static)> {
        self.devices
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.as_mut())
    }

    /// The named device as its concrete driver type.
    ///
    /// ```no_run
    /// # use equipment_collection::ResourceCollection;
    /// # fn example(collection: &mut ResourceCollection) {
    /// use equipmentrs::DynInterface;
    /// use sorensen_sga::SorensenSga;
    ///
    /// if let Some(psu) = collection.get_as::<SorensenSga<DynInterface>>("source_v_in") {
    ///     psu.off().unwrap();
    /// }
    /// # }
    /// ```
    pub fn get_as<T: Any>(&mut self, name: &str) -> Option<&mut T> {
        self.get_mut(name)?.as_any_mut().downcast_mut::<T>()
    }

    /// Iterate over the devices.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Device)> {
        self.devices.iter().map(|(n, d)| (n.as_str(), d.as_ref()))
    }

    /// Iterate mutably over the devices.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut (dyn Device + 'static))> {
        self.devices
            .iter_mut()
            .map(|(n, d)| (n.as_str(), d.as_mut()))
    }

    /// Reset all devices. Failures are logged and do not stop the remaining devices.
    pub fn reset(&mut self) {
        for (name, device) in self.devices.iter_mut() {
            if let Err(e) = device.reset() {
                warn!(name = name.as_str(), error = %e, "Could not reset device");
            }
        }
    }

    /// Return all devices to local control. Failures are logged and do not stop the remaining
    /// devices.
    pub fn set_local(&mut self) {
        for (name, device) in self.devices.iter_mut() {
            if let Err(e) = device.set_local() {
                warn!(name = name.as_str(), error = %e, "Could not set device to local");
            }
        }
    }

    /// The multimeters of the collection.
    ///
    /// Multimeters are keyed by their name with any `DMM` removed, e.g., `"DMM_vin"` becomes
    /// `"_vin"` and `"vinDMM"` becomes `"vin"`.
    pub fn multimeters(&mut self) -> MultimeterCollection<'_> {
        let meters = self
            .devices
            .iter_mut()
            .filter(|(_, d)| d.kind() == DeviceKind::Multimeter)
            .map(|(n, d)| (n.replace("DMM", ""), d.as_mut()))
            .collect();
        MultimeterCollection { meters }
    }
}

/// Borrowed view of the multimeters in a [`ResourceCollection`].
pub struct MultimeterCollection<'a> {
    meters: Vec<(String, &'a mut (dyn Device + 'static))>,
}

impl MultimeterCollection<'_> {
    /// Keys of the multimeters.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.meters.iter().map(|(n, _)| n.as_str())
    }

    /// Number of multimeters.
    pub fn len(&self) -> usize {
        self.meters.len()
    }

    /// `true` if the collection holds no multimeters.
    pub fn is_empty(&self) -> bool {
        self.meters.is_empty()
    }

    /// Arm all multimeters. Failures are logged.
    pub fn init(&mut self) {
        for (name, meter) in self.iter_meters() {
            if let Err(e) = meter.init() {
                warn!(name, error = %e, "Could not initialize multimeter");
            }
        }
    }

    /// Trigger all multimeters. Failures are logged.
    pub fn trigger(&mut self) {
        for (name, meter) in self.iter_meters() {
            if let Err(e) = meter.trigger() {
                warn!(name, error = %e, "Could not trigger multimeter");
            }
        }
    }

    /// Fetch the data of all multimeters, in collection order.
    ///
    /// Keys found in `mapper` are renamed to the mapped name. With `only_mapped`, multimeters
    /// that are not in the mapper are skipped.
    pub fn fetch_data(
        &mut self,
        mapper: &HashMap<String, String>,
        only_mapped: bool,
    ) -> Result<Vec<(String, Vec<f64>)>, InstrumentError> {
        let mut data = Vec::with_capacity(self.meters.len());
        for (name, meter) in self.iter_meters() {
            let key = match mapper.get(name) {
                Some(mapped) => mapped.clone(),
                None if only_mapped => continue,
                None => name.to_string(),
            };
            let values = meter.fetch_data()?;
            info!(name, key = key.as_str(), samples = values.len(), "Fetched data");
            data.push((key, values));
        }
        Ok(data)
    }

    fn iter_meters(&mut self) -> impl Iterator<Item = (&str, &mut dyn crate::Multimeter)> {
        self.meters
            .iter_mut()
            .filter_map(|(n, d)| Some((n.as_str(), d.as_multimeter()?)))
    }
}
