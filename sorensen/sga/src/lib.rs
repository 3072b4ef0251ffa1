//! A rust driver for the Sorensen SGA/SGI series of DC power supplies.
//!
//! The supply is controlled through SCPI commands over any [`InstrumentInterface`], usually a raw
//! TCP/IP socket or GPIB via VISA.
//!
//! # Example
//!
//! ```no_run
//! use equipmentrs::TcpIpInterface;
//! use measurements::{Current, Voltage};
//! use sorensen_sga::SorensenSga;
//!
//! let interface = TcpIpInterface::simple("10.0.0.5:5025").unwrap();
//! let mut psu = SorensenSga::try_new(interface, "TCPIP0::10.0.0.5::5025::SOCKET").unwrap();
//!
//! psu.set_voltage(Voltage::from_volts(48.0)).unwrap();
//! psu.set_current(Current::from_amperes(2.0)).unwrap();
//! psu.on().unwrap();
//! println!("Output voltage: {}", psu.measure_voltage().unwrap());
//! ```

#![deny(warnings, missing_docs)]

use equipmentrs::{InstrumentError, InstrumentInterface, ScpiResource, parse_f64};

use measurements::{Current, Power, Voltage};

/// A rust driver for the Sorensen SGA DC power supply.
///
/// See the top-level documentation for an example on how to use this driver.
pub struct SorensenSga<T: InstrumentInterface> {
    resource: ScpiResource<T>,
}

impl<T: InstrumentInterface> SorensenSga<T> {
    /// Connect to a Sorensen SGA on the given interface.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    /// * `address` - The address of the supply.
    pub fn try_new(interface: T, address: &str) -> Result<Self, InstrumentError> {
        Ok(Self {
            resource: ScpiResource::connect(interface, address)?,
        })
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

    /// Enable or disable the output of the supply.
    pub fn set_state(&mut self, state: bool) -> Result<(), InstrumentError> {
        self.resource
            .write_resource(&format!("OUTP:STAT {}", if state { 1 } else { 0 }))
    }

    /// Get the state of the output of the supply.
    pub fn get_state(&mut self) -> Result<bool, InstrumentError> {
        Ok(self.resource.query_resource("OUTP:STAT?")?.contains('1'))
    }

    /// Enable the output, equivalent to `set_state(true)`.
    pub fn on(&mut self) -> Result<(), InstrumentError> {
        self.set_state(true)
    }

    /// Disable the output, equivalent to `set_state(false)`.
    pub fn off(&mut self) -> Result<(), InstrumentError> {
        self.set_state(false)
    }

    /// Reverse the current state of the output.
    pub fn toggle(&mut self) -> Result<(), InstrumentError> {
        let state = self.get_state()?;
        self.set_state(!state)
    }

    /// Set the output voltage setpoint.
    pub fn set_voltage(&mut self, voltage: Voltage) -> Result<(), InstrumentError> {
        self.resource
            .write_resource(&format!("SOUR:VOLT {}", voltage.as_volts()))
    }

    /// Get the output voltage setpoint.
    pub fn get_voltage(&mut self) -> Result<Voltage, InstrumentError> {
        let resp = self.resource.query_resource("SOUR:VOLT?")?;
        Ok(Voltage::from_volts(parse_f64(&resp)?))
    }

    /// Set the current limit of the supply.
    pub fn set_current(&mut self, current: Current) -> Result<(), InstrumentError> {
        self.resource
            .write_resource(&format!("SOUR:CURR {}", current.as_amperes()))
    }

    /// Get the current limit of the supply.
    pub fn get_current(&mut self) -> Result<Current, InstrumentError> {
        let resp = self.resource.query_resource("SOUR:CURR?")?;
        Ok(Current::from_amperes(parse_f64(&resp)?))
    }

    /// Measure the voltage across the output of the supply.
    pub fn measure_voltage(&mut self) -> Result<Voltage, InstrumentError> {
        let resp = self.resource.query_resource("MEAS:VOLT?")?;
        Ok(Voltage::from_volts(parse_f64(&resp)?))
    }

    /// Measure the current through the output of the supply.
    pub fn measure_current(&mut self) -> Result<Current, InstrumentError> {
        let resp = self.resource.query_resource("MEAS:CURR?")?;
        Ok(Current::from_amperes(parse_f64(&resp)?))
    }

    /// Measure the power drawn from the supply.
    ///
    /// Only the SGI version of the supply supports this command.
    pub fn measure_power(&mut self) -> Result<Power, InstrumentError> {
        let resp = self.resource.query_resource("MEAS:POW?")?;
        Ok(Power::from_watts(parse_f64(&resp)?))
    }

    /// Set the over voltage protection setpoint.
    pub fn set_over_voltage_protection(&mut self, voltage: Voltage) -> Result<(), InstrumentError> {
        self.resource
            .write_resource(&format!("SOUR:VOLT:PROT {}", voltage.as_volts()))
    }

    /// Get the over voltage protection setpoint.
    pub fn get_over_voltage_protection(&mut self) -> Result<Voltage, InstrumentError> {
        let resp = self.resource.query_resource("SOUR:VOLT:PROT?")?;
        Ok(Voltage::from_volts(parse_f64(&resp)?))
    }

    /// Set the over current protection setpoint.
    pub fn set_over_current_protection(&mut self, current: Current) -> Result<(), InstrumentError> {
        self.resource
            .write_resource(&format!("SOUR:CURR:LIM {}", current.as_amperes()))
    }

    /// Get the over current protection setpoint.
    pub fn get_over_current_protection(&mut self) -> Result<Current, InstrumentError> {
        let resp = self.resource.query_resource("SOUR:CURR:LIM?")?;
        Ok(Current::from_amperes(parse_f64(&resp)?))
    }

    /// Pop the oldest entry of the error queue, `None` if the queue is empty.
    pub fn pop_error_queue(&mut self) -> Result<Option<String>, InstrumentError> {
        self.resource.pop_error_queue()
    }

    /// Read and clear all entries of the error queue, oldest first.
    pub fn error_queue(&mut self) -> Result<Vec<String>, InstrumentError> {
        self.resource.error_queue()
    }

    /// Unlock (`true`) or lock (`false`) the front panel of the supply.
    pub fn set_local(&mut self, state: bool) -> Result<(), InstrumentError> {
        self.resource
            .write_resource(&format!("SYST:LOCAL {}", if state { 1 } else { 0 }))
    }

    /// Returns `true` if the front panel of the supply is unlocked.
    pub fn get_local(&mut self) -> Result<bool, InstrumentError> {
        Ok(self.resource.query_resource("SYST:LOCAL?")?.contains("ON"))
    }
}

impl<T: InstrumentInterface> Clone for SorensenSga<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}
