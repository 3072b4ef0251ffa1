//! This module provides the implementation for an instrument controlled via a serial port.
//!
//! It returns a blocking [`Instrument`] built on top of the `serialport` crate.

use std::time::Duration;

use serialport::{SerialPort, SerialPortBuilder};

use crate::{Instrument, InstrumentError};

/// A blocking serial port interface using the `serialport` crate.
#[derive(Debug)]
pub struct SerialInterface {}

impl SerialInterface {
    /// Try to open a serial port with the given baud rate and 8N1 framing.
    ///
    /// The timeout is set to three seconds and the terminator to `"\n"`.
    ///
    /// # Arguments
    /// * `port` - The name of the serial port, e.g., `"/dev/ttyUSB0"` or `"COM3"`.
    /// * `baud_rate` - The baud rate to use.
    pub fn simple(
        port: &str,
        baud_rate: u32,
    ) -> Result<Instrument<Box<dyn SerialPort>>, InstrumentError> {
        let spb = serialport::new(port, baud_rate).timeout(Duration::from_secs(3));
        Self::full(spb)
    }

    /// Try to open a fully configured serial port.
    ///
    /// The timeout of the builder is used as timeout of the interface.
    ///
    /// # Arguments
    /// * `spb` - A [`serialport::SerialPortBuilder`] to configure the serial port.
    pub fn full(spb: SerialPortBuilder) -> Result<Instrument<Box<dyn SerialPort>>, InstrumentError> {
        let port = spb.open()?;
        let timeout = port.timeout();
        Ok(Instrument::new(port, timeout))
    }
}
