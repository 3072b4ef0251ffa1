//! A rust driver for the Chroma 6310 series of DC electronic loads.
//!
//! The mainframe reports the installed load module through `channel:id?`. Current setpoints and
//! slew rates are clamped to the limits of that module, modules that are not known to this driver
//! use the limits of the base module.
//!
//! # Example
//!
//! ```no_run
//! use chroma_6310::{Chroma6310, LoadLevel};
//! use equipmentrs::TcpIpInterface;
//! use measurements::Current;
//!
//! let interface = TcpIpInterface::simple("10.0.0.11:2101").unwrap();
//! let mut load = Chroma6310::try_new(interface, "TCPIP0::10.0.0.11::2101::SOCKET").unwrap();
//!
//! load.auto_range(Current::from_amperes(20.0)).unwrap();
//! load.set_current(Current::from_amperes(20.0), LoadLevel::Both).unwrap();
//! load.on().unwrap();
//! ```

#![deny(warnings, missing_docs)]

use equipmentrs::{InstrumentError, InstrumentInterface, ScpiResource, parse_f64};

use measurements::Current;

/// Lower and upper limit of a setting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Limits {
    /// Lower limit.
    pub min: f64,
    /// Upper limit.
    pub max: f64,
}

impl Limits {
    const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// Ratings of a load module.
///
/// Currents are in A, slew rates in A/µs as used by the instrument.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModuleConfig {
    /// Module name as reported by `channel:id?`, `"BASE"` for the fallback.
    pub name: &'static str,
    /// Current in the low range.
    pub current_low: Limits,
    /// Current in the high range.
    pub current_high: Limits,
    /// Slew rate in the low range.
    pub slew_low: Limits,
    /// Slew rate in the high range.
    pub slew_high: Limits,
}

const BASE_MODULE: ModuleConfig = ModuleConfig {
    name: "BASE",
    current_low: Limits::new(0.0, 6.0),
    current_high: Limits::new(0.0, 60.0),
    slew_low: Limits::new(0.001, 0.25),
    slew_high: Limits::new(0.01, 2.5),
};

const MODULES: [ModuleConfig; 2] = [
    ModuleConfig {
        name: "63106A",
        current_low: Limits::new(0.0, 12.0),
        current_high: Limits::new(0.0, 120.0),
        slew_low: Limits::new(0.002, 0.5),
        slew_high: Limits::new(0.02, 5.0),
    },
    ModuleConfig {
        name: "63112A",
        current_low: Limits::new(0.0, 24.0),
        current_high: Limits::new(0.0, 240.0),
        slew_low: Limits::new(0.004, 1.0),
        slew_high: Limits::new(0.04, 10.0),
    },
];

/// Current range of the constant current mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurrentRange {
    /// Low range, `CCL`.
    Low,
    /// High range, `CCH`.
    High,
}

/// Edge of a current step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// Rising edge.
    Rise,
    /// Falling edge.
    Fall,
}

/// Static load level in constant current mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadLevel {
    /// Both levels, only valid when setting.
    Both,
    /// Level 1.
    L1,
    /// Level 2.
    L2,
}

/// A rust driver for the Chroma 6310 electronic load.
pub struct Chroma6310<T: InstrumentInterface> {
    resource: ScpiResource<T>,
    module: ModuleConfig,
}

impl<T: InstrumentInterface> Chroma6310<T> {
    /// Connect to the load, check its identity and determine the installed module.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    /// * `address` - The address of the load.
    pub fn try_new(interface: T, address: &str) -> Result<Self, InstrumentError> {
        let mut resource = ScpiResource::connect(interface, address)?;
        resource.check_identity("Chroma 6310 based programmable load", |id| {
            id.manufacturer.to_lowercase() == "chroma" && id.model.starts_with("631")
        })?;

        let resp = resource.query_resource("channel:id?")?;
        let module_name = resp
            .split(',')
            .nth(1)
            .map(str::trim)
            .ok_or_else(|| InstrumentError::ResponseParseError(resp.clone()))?;
        let module = MODULES
            .iter()
            .find(|m| m.name == module_name)
            .copied()
            .unwrap_or(BASE_MODULE);

        Ok(Self { resource, module })
    }

    /// Query the name of the instrument, as reported when connecting.
    pub fn get_name(&self) -> &str {
        self.resource.idn()
    }

    /// The resource address the instrument was connected on.
    pub fn address(&self) -> &str {
        self.resource.address()
    }

    /// Access the underlying SCPI resource for the IEEE 488.2 common commands.
    pub fn resource(&mut self) -> &mut ScpiResource<T> {
        &mut self.resource
    }

    /// Ratings of the installed load module.
    pub fn module(&self) -> &ModuleConfig {
        &self.module
    }

    /// Enable or disable the input of the load.
    pub fn set_state(&mut self, state: bool) -> Result<(), InstrumentError> {
        self.resource
            .write_resource(&format!("load:state {}", if state { "on" } else { "off" }))
    }

    /// Get the state of the input of the load.
    pub fn get_state(&mut self) -> Result<bool, InstrumentError> {
        Ok(self.resource.query_resource("load:state?")? == "1")
    }

    /// Enable the input, equivalent to `set_state(true)`.
    pub fn on(&mut self) -> Result<(), InstrumentError> {
        self.set_state(true)
    }

    /// Disable the input, equivalent to `set_state(false)`.
    pub fn off(&mut self) -> Result<(), InstrumentError> {
        self.set_state(false)
    }

    /// Reverse the current state of the input.
    pub fn toggle(&mut self) -> Result<(), InstrumentError> {
        let state = self.get_state()?;
        self.set_state(!state)
    }

    /// Set the static current of a level in constant current mode.
    ///
    /// The current is clamped to the span of the module, from the low range minimum to the high
    /// range maximum. [`LoadLevel::Both`] sets level 1 and level 2.
    pub fn set_current(&mut self, current: Current, level: LoadLevel) -> Result<(), InstrumentError> {
        let value = Limits::new(self.module.current_low.min, self.module.current_high.max)
            .clamp(current.as_amperes());
        match level {
            LoadLevel::Both => {
                self.resource
                    .write_resource(&format!("current:static:l1 {value}"))?;
                self.resource
                    .write_resource(&format!("current:static:l2 {value}"))
            }
            LoadLevel::L1 => self
                .resource
                .write_resource(&format!("current:static:l1 {value}")),
            LoadLevel::L2 => self
                .resource
                .write_resource(&format!("current:static:l2 {value}")),
        }
    }

    /// Get the static current of level 1 or level 2.
    pub fn get_current(&mut self, level: LoadLevel) -> Result<Current, InstrumentError> {
        let query = match level {
            LoadLevel::L1 => "current:static:l1?",
            LoadLevel::L2 => "current:static:l2?",
            LoadLevel::Both => {
                return Err(InstrumentError::InvalidArgument(
                    "Invalid load level, must be level 1 or level 2".to_string(),
                ));
            }
        };
        let resp = self.resource.query_resource(query)?;
        Ok(Current::from_amperes(parse_f64(&resp)?))
    }

    /// Set the current range.
    pub fn set_current_range(&mut self, range: CurrentRange) -> Result<(), InstrumentError> {
        let val = match range {
            CurrentRange::Low => "CCL",
            CurrentRange::High => "CCH",
        };
        self.resource.write_resource(&format!("mode {val}"))
    }

    /// Get the current range.
    pub fn get_current_range(&mut self) -> Result<CurrentRange, InstrumentError> {
        let resp = self.resource.query_resource("mode?")?;
        match resp.to_ascii_uppercase().as_str() {
            "CCL" => Ok(CurrentRange::Low),
            "CCH" => Ok(CurrentRange::High),
            _ => Err(InstrumentError::ResponseParseError(resp)),
        }
    }

    /// Select the lowest range that can sink the given current.
    pub fn auto_range(&mut self, current: Current) -> Result<(), InstrumentError> {
        let value = current.as_amperes();
        let (min, max) = (self.module.current_low.min, self.module.current_high.max);
        if !(min..=max).contains(&value) {
            return Err(InstrumentError::FloatValueOutOfRange { value, min, max });
        }
        if value <= self.module.current_low.max {
            self.set_current_range(CurrentRange::Low)
        } else {
            self.set_current_range(CurrentRange::High)
        }
    }

    /// Set the slew rate of an edge in constant current mode, in A/s.
    ///
    /// The slew rate is clamped to the limits of the active current range, which is queried
    /// from the load.
    pub fn set_current_slew_rate(&mut self, slew_rate: f64, edge: Edge) -> Result<(), InstrumentError> {
        let limits = match self.get_current_range()? {
            CurrentRange::Low => self.module.slew_low,
            CurrentRange::High => self.module.slew_high,
        };
        let a_per_us = limits.clamp(slew_rate * 1e-6);
        self.resource
            .write_resource(&format!("current:static:{} {a_per_us}", edge_name(edge)))
    }

    /// Get the slew rate of an edge in constant current mode, in A/s.
    pub fn get_current_slew_rate(&mut self, edge: Edge) -> Result<f64, InstrumentError> {
        let resp = self
            .resource
            .query_resource(&format!("current:static:{}?", edge_name(edge)))?;
        Ok(parse_f64(&resp)? * 1e6)
    }
}

impl<T: InstrumentInterface> Clone for Chroma6310<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
            module: self.module,
        }
    }
}

fn edge_name(edge: Edge) -> &'static str {
    match edge {
        Edge::Rise => "rise",
        Edge::Fall => "fall",
    }
}
