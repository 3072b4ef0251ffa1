//! This module provides the main implementation for the Instrument Interface trait.
//!
//! It can be called with any type that implements [`std::io::Read`] and [`std::io::Write`],
//! such as [`std::net::TcpStream`] or a boxed `serialport::SerialPort`.

use std::{io::ErrorKind, time::Duration};

use crate::{InstrumentError, InstrumentInterface};

/// A general instrument interface that can be built with any port that implements
/// [`std::io::Read`] and [`std::io::Write`].
///
/// Handy shortcuts for creating the common interfaces are provided by [`crate::TcpIpInterface`]
/// and, with the `serial` feature, `SerialInterface`.
///
/// # Example
///
/// ```no_run
/// use std::{net::TcpStream, time::Duration};
///
/// use equipmentrs::Instrument;
///
/// let my_interface = TcpStream::connect("192.168.10.1:5025").unwrap();
/// let inst_interface = Instrument::new(my_interface, Duration::from_secs(3));
/// ```
pub struct Instrument<P: std::io::Read + std::io::Write> {
    port: P,
    terminator: String,
    timeout: Duration,
}

impl<P: std::io::Read + std::io::Write> Instrument<P> {
    /// Create a new instance of [`Instrument`] with a given port and timeout.
    ///
    /// The terminator defaults to `"\n"`.
    pub fn new(port: P, timeout: Duration) -> Self {
        Self {
            port,
            terminator: "\n".to_string(),
            timeout,
        }
    }
}

impl<P: std::io::Read + std::io::Write> InstrumentInterface for Instrument<P> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        match self.port.read_exact(buf) {
            Ok(()) => Ok(()),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                Err(InstrumentError::Timeout(self.timeout))
            }
            Err(e) => Err(e.into()),
        }
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

    /// Set the timeout used while waiting for a terminator.
    ///
    /// Ports with their own read timeout, e.g., sockets, keep the timeout they were opened with.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), InstrumentError> {
        self.timeout = timeout;
        Ok(())
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }
}
