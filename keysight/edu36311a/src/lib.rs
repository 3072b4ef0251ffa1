//! A rust driver for the Keysight EDU36311A triple output DC power supply.
//!
//! The supply has three outputs with different ratings:
//!
//! | Channel index | Output | Max. voltage | Max. current |
//! |---------------|--------|--------------|--------------|
//! | 0             | 1      | 6 V          | 5 A          |
//! | 1             | 2      | 30 V         | 1 A          |
//! | 2             | 3      | 30 V         | 1 A          |
//!
//! Setpoints outside of these ratings are rejected before anything is sent to the supply.
//!
//! # Example
//!
//! ```no_run
//! use equipmentrs::TcpIpInterface;
//! use keysight_edu36311a::Edu36311a;
//! use measurements::Voltage;
//!
//! let interface = TcpIpInterface::simple("10.0.0.7:5025").unwrap();
//! let mut psu = Edu36311a::try_new(interface, "TCPIP0::10.0.0.7::5025::SOCKET").unwrap();
//!
//! // Output 2 is channel index 1, channels are zero indexed.
//! let mut out2 = psu.get_channel(1).unwrap();
//! out2.set_voltage(Voltage::from_volts(12.0)).unwrap();
//! out2.on().unwrap();
//! ```

#![deny(warnings, missing_docs)]

use equipmentrs::{InstrumentError, InstrumentInterface, ScpiResource, parse_f64};

use measurements::{Current, Voltage};

/// Rating of one output.
#[derive(Clone, Copy, Debug)]
struct OutputLimits {
    v_max: f64,
    i_max: f64,
}

const OUTPUTS: [OutputLimits; 3] = [
    OutputLimits {
        v_max: 6.0,
        i_max: 5.0,
    },
    OutputLimits {
        v_max: 30.0,
        i_max: 1.0,
    },
    OutputLimits {
        v_max: 30.0,
        i_max: 1.0,
    },
];

/// A rust driver for the Keysight EDU36311A.
///
/// Connecting fails with [`InstrumentError::WrongInstrument`] if the instrument does not identify
/// itself as an EDU36311A.
pub struct Edu36311a<T: InstrumentInterface> {
    resource: ScpiResource<T>,
}

impl<T: InstrumentInterface> Edu36311a<T> {
    /// Connect to the supply and check its identity.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    /// * `address` - The address of the supply.
    pub fn try_new(interface: T, address: &str) -> Result<Self, InstrumentError> {
        let resource = ScpiResource::connect(interface, address)?;
        resource.check_identity("Keysight EDU36311A DC power supply", |id| {
            id.model == "EDU36311A"
        })?;
        Ok(Self { resource })
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

    /// Number of outputs of the supply.
    pub fn num_channels(&self) -> usize {
        OUTPUTS.len()
    }

    /// Get a new channel with a given index.
    ///
    /// Please note that channels are zero indexed, index 0 is output 1.
    pub fn get_channel(&mut self, idx: usize) -> Result<Channel<T>, InstrumentError> {
        match OUTPUTS.get(idx) {
            Some(limits) => Ok(Channel {
                idx,
                limits: *limits,
                resource: self.resource.clone(),
            }),
            None => Err(InstrumentError::ChannelIndexOutOfRange {
                idx,
                nof_channels: OUTPUTS.len(),
            }),
        }
    }
}

impl<T: InstrumentInterface> Clone for Edu36311a<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

/// Channel structure representing a single output of the EDU36311A.
///
/// **This structure can only be created through the [`Edu36311a`] struct.**
pub struct Channel<T: InstrumentInterface> {
    idx: usize,
    limits: OutputLimits,
    resource: ScpiResource<T>,
}

impl<T: InstrumentInterface> Channel<T> {
    /// The output number as printed on the front panel.
    pub fn output(&self) -> usize {
        self.idx + 1
    }

    /// Enable or disable the output.
    pub fn set_state(&mut self, state: bool) -> Result<(), InstrumentError> {
        let cmd = format!(
            "output {}, (@{})",
            if state { "on" } else { "off" },
            self.output()
        );
        self.resource.write_resource(&cmd)
    }

    /// Get the state of the output.
    pub fn get_state(&mut self) -> Result<bool, InstrumentError> {
        let cmd = format!("output:state? (@{})", self.output());
        Ok(self.resource.query_resource(&cmd)?.contains('1'))
    }

    /// Enable the output.
    pub fn on(&mut self) -> Result<(), InstrumentError> {
        self.set_state(true)
    }

    /// Disable the output.
    pub fn off(&mut self) -> Result<(), InstrumentError> {
        self.set_state(false)
    }

    /// Reverse the current state of the output.
    pub fn toggle(&mut self) -> Result<(), InstrumentError> {
        let state = self.get_state()?;
        self.set_state(!state)
    }

    /// Set the voltage setpoint of the output.
    ///
    /// Voltages above the rating of the output are rejected.
    pub fn set_voltage(&mut self, voltage: Voltage) -> Result<(), InstrumentError> {
        let value = voltage.as_volts();
        check_range(value, self.limits.v_max)?;
        let cmd = format!("volt {value},(@{})", self.output());
        self.resource.write_resource(&cmd)
    }

    /// Get the voltage setpoint of the output.
    pub fn get_voltage(&mut self) -> Result<Voltage, InstrumentError> {
        let resp = self.query_channel("volt?")?;
        Ok(Voltage::from_volts(parse_f64(&resp)?))
    }

    /// Set the current limit of the output.
    ///
    /// Currents above the rating of the output are rejected.
    pub fn set_current(&mut self, current: Current) -> Result<(), InstrumentError> {
        let value = current.as_amperes();
        check_range(value, self.limits.i_max)?;
        let cmd = format!("curr {value},(@{})", self.output());
        self.resource.write_resource(&cmd)
    }

    /// Get the current limit of the output.
    pub fn get_current(&mut self) -> Result<Current, InstrumentError> {
        let resp = self.query_channel("curr?")?;
        Ok(Current::from_amperes(parse_f64(&resp)?))
    }

    /// Measure the voltage at the output.
    pub fn measure_voltage(&mut self) -> Result<Voltage, InstrumentError> {
        let resp = self.query_channel("meas:volt?")?;
        Ok(Voltage::from_volts(parse_f64(&resp)?))
    }

    /// Measure the current through the output.
    pub fn measure_current(&mut self) -> Result<Current, InstrumentError> {
        let resp = self.query_channel("meas:curr?")?;
        Ok(Current::from_amperes(parse_f64(&resp)?))
    }

    fn query_channel(&mut self, query: &str) -> Result<String, InstrumentError> {
        let cmd = format!("{query} (@{})", self.output());
        self.resource.query_resource(&cmd)
    }
}

impl<T: InstrumentInterface> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            idx: self.idx,
            limits: self.limits,
            resource: self.resource.clone(),
        }
    }
}

fn check_range(value: f64, max: f64) -> Result<(), InstrumentError> {
    if (0.0..=max).contains(&value) {
        Ok(())
    } else {
        Err(InstrumentError::FloatValueOutOfRange {
            value,
            min: 0.0,
            max,
        })
    }
}
