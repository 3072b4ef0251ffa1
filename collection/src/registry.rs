//! Registry of the drivers that can be named in a configuration.

use std::collections::HashMap;

use equipmentrs::DynInterface;

use chroma_6310::Chroma6310;
use hp_34401a::{Hp34401a, MeterSettings};
use keysight_33500b::Ks33500b;
use keysight_edu36311a::Edu36311a;
use sorensen_sga::SorensenSga;
use tektronix_dpo4xxx::Dpo4xxx;

use crate::{CollectionError, Device, DeviceConfig};

/// Constructs a device on an opened interface.
pub type Factory = fn(DynInterface, &DeviceConfig) -> Result<Box<dyn Device>, CollectionError>;

/// Maps the `object` identifiers of a configuration to device factories.
///
/// The default registry knows all drivers of this workspace:
///
/// | Identifier           | Driver                |
/// |----------------------|-----------------------|
/// | `Sorensen_SGA`       | [`SorensenSga`]       |
/// | `Keysight_EDU36311A` | [`Edu36311a`]         |
/// | `Keysight_33500B`    | [`Ks33500b`]          |
/// | `Chroma_6310`        | [`Chroma6310`]        |
/// | `HP_34401A`          | [`Hp34401a`]          |
/// | `Tektronix_DPO4xxx`  | [`Dpo4xxx`]           |
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl Registry {
    /// Create a registry without any drivers.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory under the given identifier, replacing an existing one.
    pub fn register(&mut self, id: &str, factory: Factory) {
        self.factories.insert(id.to_string(), factory);
    }

    /// The factory registered under the given identifier.
    pub fn resolve(&self, id: &str) -> Option<Factory> {
        self.factories.get(id).copied()
    }

    /// All registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("Sorensen_SGA", |intf, cfg| {
            Ok(Box::new(SorensenSga::try_new(intf, &cfg.address)?))
        });
        registry.register("Keysight_EDU36311A", |intf, cfg| {
            Ok(Box::new(Edu36311a::try_new(intf, &cfg.address)?))
        });
        registry.register("Keysight_33500B", |intf, cfg| {
            Ok(Box::new(Ks33500b::try_new(intf, &cfg.address)?))
        });
        registry.register("Chroma_6310", |intf, cfg| {
            Ok(Box::new(Chroma6310::try_new(intf, &cfg.address)?))
        });
        registry.register("HP_34401A", hp_34401a_factory);
        registry.register("Tektronix_DPO4xxx", |intf, cfg| {
            Ok(Box::new(Dpo4xxx::try_new(intf, &cfg.address)?))
        });
        registry
    }
}

fn hp_34401a_factory(
    intf: DynInterface,
    cfg: &DeviceConfig,
) -> Result<Box<dyn Device>, CollectionError> {
    let mut settings = MeterSettings::default();
    if let Some(factor) = cfg.kwarg_f64("factor")? {
        settings.factor = factor;
    }
    if let Some(line_frequency) = cfg.kwarg_f64("line_frequency")? {
        settings.line_frequency = line_frequency;
    }
    Ok(Box::new(Hp34401a::try_new_with(intf, &cfg.address, settings)?))
}
