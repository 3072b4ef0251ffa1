//! Errors of the collection layer.

use equipmentrs::InstrumentError;
use thiserror::Error;

/// Errors that occur while loading a configuration or connecting a collection.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CollectionError {
    /// The configuration is valid JSON but does not describe a set of devices.
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// The configuration could not be parsed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The configuration file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// An instrument error while constructing a device.
    #[error(transparent)]
    Instrument(#[from] InstrumentError),
    /// Devices requested in the object mask are not part of the configuration.
    #[error("Resources not found in configuration: {}", .0.join(", "))]
    MissingResources(Vec<String>),
    /// A required device could not be connected.
    #[error("Could not connect to required resource {name}: {source}")]
    ResourceConnection {
        /// Name of the device in the configuration.
        name: String,
        /// The underlying error.
        #[source]
        source: Box<CollectionError>,
    },
    /// A required device names an object type that is not in the registry.
    #[error("Resource {name} uses unsupported object type {object}")]
    UnsupportedResource {
        /// Name of the device in the configuration.
        name: String,
        /// The object identifier that could not be resolved.
        object: String,
    },
}
