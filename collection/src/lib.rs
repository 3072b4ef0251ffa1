//! Connect a whole bench of equipment from a JSON configuration.
//!
//! A configuration names each device and tells which driver to use, where to find it, how to
//! open it, and which commands to run once it is connected. [`connect_resources`] turns such a
//! configuration into a [`ResourceCollection`]: optional devices that are switched off or
//! unplugged are skipped, required ones fail the connection.
//!
//! # Example
//!
//! ```no_run
//! use equipment_collection::{ConnectOptions, EquipmentConfig, Registry, connect_resources};
//! use equipmentrs::DefaultOpener;
//!
//! let config = EquipmentConfig::from_path("equipment.json").unwrap();
//! let options = ConnectOptions {
//!     init: true,
//!     ..Default::default()
//! };
//! let mut bench = connect_resources(config, &options, &Registry::default(), &DefaultOpener)
//!     .unwrap();
//!
//! let mut dmms = bench.multimeters();
//! dmms.init();
//! dmms.trigger();
//! for (name, values) in dmms.fetch_data(&Default::default(), false).unwrap() {
//!     println!("{name}: {values:?}");
//! }
//! drop(dmms);
//! bench.set_local();
//! ```

#![deny(warnings, missing_docs)]

mod collection;
mod command;
mod config;
mod connect;
mod device;
mod error;
mod registry;

pub use collection::{MultimeterCollection, ResourceCollection};
pub use command::InitCommand;
pub use config::{DeviceConfig, EquipmentConfig, InitStep};
#[cfg(feature = "visa")]
pub use connect::identify_visa_resources;
pub use connect::{
    ConnectOptions, ConnectionOutcome, FailedStep, Requirement, connect_resources,
    identify_resources, initialize_device,
};
pub use device::{CommandError, Device, DeviceKind, Multimeter};
pub use error::CollectionError;
pub use registry::{Factory, Registry};
