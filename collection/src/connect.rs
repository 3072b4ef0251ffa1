//! Connecting and initializing the devices of a configuration.

use equipmentrs::{ConnectionSettings, ResourceOpener, ScpiResource};
use tracing::{debug, info, warn};

use crate::{
    CollectionError, Device, EquipmentConfig, InitCommand, InitStep, Registry, ResourceCollection,
};

/// Whether a device has to be connected for the collection to be usable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// Missing devices are skipped.
    Optional,
    /// A missing device fails the whole connection.
    Required,
}

/// An initialization step that could not be run.
#[derive(Clone, Debug, PartialEq)]
pub struct FailedStep {
    /// Name of the step.
    pub name: String,
    /// Why the step failed.
    pub reason: String,
}

/// What happened to a configured device.
#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionOutcome {
    /// The device is part of the collection. Failed initialization steps are listed.
    Connected {
        /// Initialization steps that were skipped.
        failed_steps: Vec<FailedStep>,
    },
    /// The device could not be opened or did not identify correctly.
    ConnectionFailed(String),
    /// The object identifier of the device is not in the registry.
    Unsupported(String),
}

impl ConnectionOutcome {
    /// `true` if the device is part of the collection.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionOutcome::Connected { .. })
    }
}

/// Options for [`connect_resources`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConnectOptions {
    /// Only connect the named devices. All of them are required. An empty mask connects all.
    pub object_mask: Option<Vec<String>>,
    /// Run the initialization steps of each device after connecting.
    pub init: bool,
}

impl ConnectOptions {
    /// The object mask, `None` if it is unset or empty. An empty mask selects every device.
    pub fn mask(&self) -> Option<&[String]> {
        self.object_mask.as_deref().filter(|mask| !mask.is_empty())
    }

    /// The requirement for the named device.
    pub fn requirement(&self, name: &str) -> Requirement {
        match self.mask() {
            Some(mask) if mask.iter().any(|n| n == name) => Requirement::Required,
            _ => Requirement::Optional,
        }
    }
}

/// Connect all devices of a configuration.
///
/// Devices that cannot be connected, or whose object identifier is unknown, are skipped with a
/// warning if they are optional and fail the whole connection if they are required. Invalid
/// keyword arguments are always an error.
///
/// # Arguments
/// * `config` - The equipment configuration.
/// * `options` - Object mask and whether to initialize the devices.
/// * `registry` - Resolves the object identifiers to drivers.
/// * `opener` - Opens the interfaces, usually [`equipmentrs::DefaultOpener`].
pub fn connect_resources(
    mut config: EquipmentConfig,
    options: &ConnectOptions,
    registry: &Registry,
    opener: &dyn ResourceOpener,
) -> Result<ResourceCollection, CollectionError> {
    if let Some(mask) = options.mask() {
        config.retain_names(mask)?;
    }

    let mut collection = ResourceCollection::new();
    for (name, device_cfg) in config {
        let requirement = options.requirement(&name);

        let Some(factory) = registry.resolve(&device_cfg.object) else {
            if requirement == Requirement::Required {
                return Err(CollectionError::UnsupportedResource {
                    name,
                    object: device_cfg.object,
                });
            }
            warn!(
                name = name.as_str(),
                object = device_cfg.object.as_str(),
                "Unsupported object type, resource skipped"
            );
            collection.record(&name, ConnectionOutcome::Unsupported(device_cfg.object));
            continue;
        };

        let settings = device_cfg.connection_settings()?;
        let connected = opener
            .open(&device_cfg.address, &settings)
            .map_err(CollectionError::from)
            .and_then(|intf| factory(intf, &device_cfg));

        match connected {
            Ok(mut device) => {
                info!(
                    name = name.as_str(),
                    address = device.address(),
                    idn = device.idn(),
                    "Resource connected"
                );
                let failed_steps = if options.init {
                    initialize_device(device.as_mut(), &device_cfg.init)
                } else {
                    Vec::new()
                };
                collection.insert(&name, device);
                collection.record(&name, ConnectionOutcome::Connected { failed_steps });
            }
            Err(e @ CollectionError::Instrument(_)) => {
                if requirement == Requirement::Required {
                    return Err(CollectionError::ResourceConnection {
                        name,
                        source: Box::new(e),
                    });
                }
                warn!(
                    name = name.as_str(),
                    address = device_cfg.address.as_str(),
                    error = %e,
                    "Could not connect, resource skipped"
                );
                collection.record(&name, ConnectionOutcome::ConnectionFailed(e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(collection)
}

/// Run the initialization steps on a device.
///
/// Steps with an unknown name, invalid arguments, or that the device does not support are logged
/// and skipped, as are steps that the device rejects. The remaining steps still run. Returns the
/// skipped steps.
pub fn initialize_device(device: &mut dyn Device, steps: &[InitStep]) -> Vec<FailedStep> {
    let mut failed = Vec::new();
    for step in steps {
        let result = InitCommand::parse(step.name(), step.args())
            .map_err(|e| e.to_string())
            .and_then(|cmd| device.execute(&cmd).map_err(|e| e.to_string()));
        match result {
            Ok(()) => debug!(address = device.address(), step = step.name(), "Step done"),
            Err(reason) => {
                warn!(
                    address = device.address(),
                    step = step.name(),
                    reason = reason.as_str(),
                    "Initialization step skipped"
                );
                failed.push(FailedStep {
                    name: step.name().to_string(),
                    reason,
                });
            }
        }
    }
    info!(
        address = device.address(),
        steps = steps.len(),
        failed = failed.len(),
        "Device initialized"
    );
    failed
}

/// Connect to each address and return the `(address, idn)` pairs of the devices that answered.
///
/// Addresses that cannot be opened or do not answer `*IDN?` are logged and left out.
pub fn identify_resources<S: AsRef<str>>(
    addresses: &[S],
    opener: &dyn ResourceOpener,
    settings: &ConnectionSettings,
) -> Vec<(String, String)> {
    let mut found = Vec::new();
    for address in addresses.iter().map(AsRef::as_ref) {
        match opener
            .open(address, settings)
            .and_then(|intf| ScpiResource::connect(intf, address))
        {
            Ok(resource) => found.push((address.to_string(), resource.idn().to_string())),
            Err(e) => warn!(address, error = %e, "Resource did not identify"),
        }
    }
    found
}

/// Find all VISA resources matching the query and identify them.
#[cfg(feature = "visa")]
pub fn identify_visa_resources(
    query: &str,
    settings: &ConnectionSettings,
) -> Result<Vec<(String, String)>, CollectionError> {
    let addresses = equipmentrs::find_resources(query)?;
    Ok(identify_resources(
        &addresses,
        &equipmentrs::DefaultOpener,
        settings,
    ))
}
