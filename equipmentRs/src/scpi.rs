//! The SCPI resource that all drivers in this workspace are built on.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tracing::{debug, info};

use crate::{InstrumentError, InstrumentInterface};

/// The identity of an instrument, as reported by the IEEE 488.2 `*IDN?` query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    /// Manufacturer name.
    pub manufacturer: String,
    /// Model name.
    pub model: String,
    /// Serial number, or `"0"` if the instrument does not report one.
    pub serial: String,
    /// Firmware revision.
    pub firmware: String,
}

impl Identity {
    /// Split an `*IDN?` response into its four fields. Missing fields are left empty.
    pub fn parse(idn: &str) -> Self {
        let mut fields = idn.split(',').map(|s| s.trim().to_string());
        Self {
            manufacturer: fields.next().unwrap_or_default(),
            model: fields.next().unwrap_or_default(),
            serial: fields.next().unwrap_or_default(),
            firmware: fields.next().unwrap_or_default(),
        }
    }
}

/// A connection to a SCPI instrument.
///
/// On connection the instrument is queried with `*IDN?` and the answer is stored, such that a
/// driver can check that it talks to the right instrument. The interface is shared behind a
/// mutex, cloning a [`ScpiResource`] hands out another handle to the same instrument.
///
/// # Example
///
/// ```
/// use equipmentrs::{LoopbackInterfaceString, ScpiResource};
///
/// let lbk = LoopbackInterfaceString::new(
///     vec!["*IDN?".to_string(), "*RST".to_string()],
///     vec!["ACME,PSU1,42,1.0".to_string()],
///     "\n",
/// );
/// let mut res = ScpiResource::connect(lbk, "TCPIP0::10.0.0.5::5025::SOCKET").unwrap();
/// assert_eq!(res.identity().model, "PSU1");
/// res.reset().unwrap();
/// ```
pub struct ScpiResource<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
    address: String,
    idn: String,
}

impl<T: InstrumentInterface> ScpiResource<T> {
    /// Connect to an instrument on the given interface and query its identity.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    /// * `address` - The address the interface was opened with, kept for error messages.
    pub fn connect(interface: T, address: &str) -> Result<Self, InstrumentError> {
        let mut resource = Self {
            interface: Arc::new(Mutex::new(interface)),
            address: address.to_string(),
            idn: String::new(),
        };
        resource.idn = resource.query_resource("*IDN?")?;
        info!(address, idn = %resource.idn, "connected to resource");
        Ok(resource)
    }

    /// The `*IDN?` response captured on connection.
    pub fn idn(&self) -> &str {
        &self.idn
    }

    /// The parsed identity of the instrument.
    pub fn identity(&self) -> Identity {
        Identity::parse(&self.idn)
    }

    /// The address of the resource.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Ensure that the identity of the instrument satisfies the given check.
    ///
    /// # Arguments
    /// * `expected` - Human readable description of the expected instrument, used in the error.
    /// * `check` - Returns `true` if the identity is acceptable.
    pub fn check_identity<F>(&self, expected: &str, check: F) -> Result<(), InstrumentError>
    where
        F: Fn(&Identity) -> bool,
    {
        if check(&self.identity()) {
            Ok(())
        } else {
            Err(InstrumentError::WrongInstrument {
                address: self.address.clone(),
                expected: expected.to_string(),
                idn: self.idn.clone(),
            })
        }
    }

    /// Write a command to the instrument.
    pub fn write_resource(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        self.intf().sendcmd(cmd)
    }

    /// Write a command to the instrument and return the trimmed response.
    pub fn query_resource(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.intf().query(cmd)
    }

    /// Read a response from the instrument without sending anything first.
    pub fn read_resource(&mut self) -> Result<String, InstrumentError> {
        self.intf().read_until_terminator()
    }

    /// Read an IEEE 488.2 binary block from the instrument and return its payload.
    pub fn read_resource_raw(&mut self) -> Result<Vec<u8>, InstrumentError> {
        self.intf().read_block()
    }

    /// Clear the status byte, the event registers and the error queue (`*CLS`).
    pub fn clear_status(&mut self) -> Result<(), InstrumentError> {
        self.write_resource("*CLS")
    }

    /// Reset the instrument to its default state (`*RST`).
    pub fn reset(&mut self) -> Result<(), InstrumentError> {
        self.write_resource("*RST")
    }

    /// Clear the input and output buffers of the device.
    pub fn clear(&mut self) -> Result<(), InstrumentError> {
        self.intf().clear()
    }

    /// Return the instrument to local (front panel) control.
    ///
    /// Interfaces without a go-to-local operation, e.g., raw sockets, are silently skipped.
    pub fn set_local(&mut self) -> Result<(), InstrumentError> {
        match self.intf().go_to_local() {
            Err(InstrumentError::InterfaceCommandNotSupported) => {
                debug!(address = %self.address, "go-to-local not supported by interface");
                Ok(())
            }
            other => other,
        }
    }

    /// The timeout for I/O operations.
    pub fn timeout(&self) -> Duration {
        self.intf().get_timeout()
    }

    /// Set the timeout for I/O operations.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), InstrumentError> {
        self.intf().set_timeout(timeout)
    }

    /// Block until all pending operations are complete (`*OPC?`).
    pub fn wait_operation_complete(&mut self) -> Result<(), InstrumentError> {
        let resp = self.query_resource("*OPC?")?;
        match resp.trim_start_matches('+') {
            "1" => Ok(()),
            _ => Err(InstrumentError::ResponseParseError(resp)),
        }
    }

    /// Pop the oldest entry from the error queue (`SYST:ERR?`).
    ///
    /// Returns `None` if the queue is empty, i.e., the instrument answers with code 0.
    pub fn pop_error_queue(&mut self) -> Result<Option<String>, InstrumentError> {
        let resp = self.query_resource("SYST:ERR?")?;
        let code = resp.split(',').next().unwrap_or_default().trim();
        match code.parse::<i32>() {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(resp)),
            Err(_) => Err(InstrumentError::ResponseParseError(resp)),
        }
    }

    /// Pop entries from the error queue until it is empty and return them, oldest first.
    pub fn error_queue(&mut self) -> Result<Vec<String>, InstrumentError> {
        let mut errors = Vec::new();
        while let Some(err) = self.pop_error_queue()? {
            errors.push(err);
        }
        Ok(errors)
    }

    fn intf(&self) -> MutexGuard<'_, T> {
        self.interface.lock().expect("Mutex should not be poisoned")
    }
}

impl<T: InstrumentInterface> Clone for ScpiResource<T> {
    fn clone(&self) -> Self {
        Self {
            interface: self.interface.clone(),
            address: self.address.clone(),
            idn: self.idn.clone(),
        }
    }
}

impl<T: InstrumentInterface> fmt::Display for ScpiResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Resource ID: {}\nAddress: {}", self.idn, self.address)
    }
}

impl<T: InstrumentInterface> fmt::Debug for ScpiResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScpiResource")
            .field("address", &self.address)
            .field("idn", &self.idn)
            .finish()
    }
}
