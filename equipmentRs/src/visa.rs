//! This module provides an interface to instruments through a VISA session.
//!
//! The VISA shared library (NI-VISA, Keysight IO libraries, ...) must be installed on the system,
//! `visa-rs` loads it at runtime.

use std::{
    ffi::CString,
    io::{ErrorKind, Read, Write},
    time::Duration,
};

use tracing::debug;
use visa_rs::{DefaultRM, flags::AccessMode};

use crate::{InstrumentError, InstrumentInterface};

/// An interface to an instrument through an open VISA session.
///
/// The session keeps the I/O timeout of the VISA library. The timeout of this interface bounds
/// [`InstrumentInterface::read_until_terminator`] on the host side, so [`Self::set_timeout`]
/// limits how long a query waits in total but does not change the timeout of a single VISA read.
pub struct VisaInterface {
    session: visa_rs::Instrument,
    terminator: String,
    timeout: Duration,
}

impl VisaInterface {
    /// Open a VISA session to the given resource.
    ///
    /// # Arguments
    /// * `resource` - VISA resource string, e.g., `"GPIB0::5::INSTR"`.
    /// * `open_timeout` - Time to wait for the session to open.
    /// * `timeout` - Timeout for I/O operations.
    pub fn open(
        resource: &str,
        open_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, InstrumentError> {
        let rm = DefaultRM::new()?;
        let rsc = visa_cstring(resource)?.into();
        let session = rm.open(&rsc, AccessMode::NO_LOCK, open_timeout)?;
        debug!(resource, "VISA session opened");
        Ok(Self {
            session,
            terminator: "\n".to_string(),
            timeout,
        })
    }
}

impl InstrumentInterface for VisaInterface {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        match self.session.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::TimedOut => Err(InstrumentError::Timeout(self.timeout)),
            Err(e) => Err(e.into()),
        }
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        self.session.write_all(data)?;
        self.session.flush()?;
        Ok(())
    }

    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }

    fn get_timeout(&self) -> Duration {
        self.timeout
    }

    /// Set the host-side timeout. The VISA session timeout is left unchanged.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), InstrumentError> {
        self.timeout = timeout;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), InstrumentError> {
        self.session.clear()?;
        Ok(())
    }
}

/// Return the addresses of all VISA resources matching the query, e.g., `"?*::INSTR"`.
pub fn find_resources(query: &str) -> Result<Vec<String>, InstrumentError> {
    let rm = DefaultRM::new()?;
    let expr = visa_cstring(query)?.into();
    let mut list = rm.find_res_list(&expr)?;
    let mut found = Vec::new();
    while let Some(res) = list.find_next()? {
        found.push(res.to_string());
    }
    Ok(found)
}

fn visa_cstring(s: &str) -> Result<CString, InstrumentError> {
    CString::new(s).map_err(|_| {
        InstrumentError::InvalidArgument(format!("VISA string must not contain NUL bytes: {s:?}"))
    })
}
