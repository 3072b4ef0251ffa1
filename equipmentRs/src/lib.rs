//! EquipmentRs: Talk to SCPI bench equipment from Rust
//!
//! The EquipmentRs library provides the transport layer that the bench equipment drivers in this
//! workspace are built on. It contains the [`InstrumentInterface`] trait and its implementations
//! for the various ports, the [`ScpiResource`] that every SCPI driver wraps, and the
//! [`InstrumentError`] error type that drivers return.
//!
//! # Currently implemented interfaces are:
//! - TCP/IP raw SCPI sockets (blocking) using [`std::net::TcpStream`].
//! - Serial (blocking) using the [`serialport`] crate, behind the `serial` feature.
//! - VISA sessions (GPIB, USB-TMC, VXI-11) using the `visa-rs` crate, behind the `visa` feature.
//!   The VISA library itself has to be installed on the system.
//!
//! Addresses are given as VISA resource strings, e.g., `"TCPIP0::10.0.0.5::5025::SOCKET"` or
//! `"ASRL/dev/ttyUSB0::INSTR"`. The [`DefaultOpener`] picks the matching interface for an address,
//! see [`ResourceAddress`] for the routing rules.
//!
//! # Example
//!
//! ```no_run
//! use equipmentrs::{ScpiResource, TcpIpInterface};
//!
//! let address = "TCPIP0::192.168.10.1::5025::SOCKET";
//! let interface = TcpIpInterface::simple("192.168.10.1:5025").unwrap();
//! let resource = ScpiResource::connect(interface, address).unwrap();
//! println!("{}", resource.idn());
//! ```

#![warn(missing_docs)]

mod address;
mod instrument;
mod loopback;
mod opener;
mod response;
mod scpi;
#[cfg(feature = "serial")]
mod serial;
mod tcp_ip;
#[cfg(feature = "visa")]
mod visa;

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{trace, warn};

pub use address::ResourceAddress;
pub use instrument::Instrument;
pub use loopback::LoopbackInterfaceString;
pub use opener::{ConnectionSettings, DefaultOpener, ResourceOpener};
pub use response::{parse_bool, parse_f64, parse_int, parse_list};
pub use scpi::{Identity, ScpiResource};
#[cfg(feature = "serial")]
pub use serial::SerialInterface;
pub use tcp_ip::TcpIpInterface;
#[cfg(feature = "visa")]
pub use visa::{VisaInterface, find_resources};

/// A boxed interface, used wherever heterogeneous instruments are stored side by side.
pub type DynInterface = Box<dyn InstrumentInterface + Send>;

/// The error enum for all instruments.
///
/// For any command sending or querying, your instrument should return either an empty result or a
/// result with the query where this Error is the alternative. [`InstrumentError`] makes it easy to
/// propagate all the sending commands, querying errors forward with the `?` operator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstrumentError {
    /// The channel index requested is out of range. The error contains the index requested and
    /// the number of channels that are available.
    #[error(
        "Channel with index {idx} is out of range. Number of channels available: {nof_channels}"
    )]
    ChannelIndexOutOfRange {
        /// Index of the channel that is out of range.
        idx: usize,
        /// Total number of channels.
        nof_channels: usize,
    },
    /// A given float value is out of the specified range.
    #[error("Float value {value} is out of range. Allowed range is [{min}, {max}]")]
    FloatValueOutOfRange {
        /// The value that is out of range.
        value: f64,
        /// The minimum value that is allowed.
        min: f64,
        /// The maximum value that is allowed.
        max: f64,
    },
    /// The called command is not supported by this interface.
    #[error("This command is not supported by this interface.")]
    InterfaceCommandNotSupported,
    /// A given integer value is out of the specified range.
    #[error("Integer value {value} is out of range. Allowed range is [{min}, {max}]")]
    IntValueOutOfRange {
        /// The value that is out of range.
        value: i64,
        /// The minimum value that is allowed.
        min: i64,
        /// The maximum value that is allowed.
        max: i64,
    },
    /// Error when an invalid argument is passed to a function. The message is intended for the
    /// user.
    #[error("{0}")]
    InvalidArgument(String),
    /// Error when reading from/writing to an interface. See [`std::io::Error`] for more details.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Instrument status is not okay, e.g., the instrument reported an entry in its error queue
    /// or is not in the mode that a command requires.
    #[error("{0}")]
    InstrumentStatus(String),
    /// Instrument response could not be parsed because it was unexpected by the driver. This
    /// error contains the response that was received from the instrument.
    #[error("Response from instrument could not be parsed. Response was: {0}")]
    ResponseParseError(String),
    #[cfg(feature = "serial")]
    /// Serial port errors can occur when opening a serial interface. See the [`serialport::Error`]
    /// documentation for more information.
    #[error(transparent)]
    Serialport(#[from] serialport::Error),
    /// Timeout occurred while waiting for a response from the instrument.
    #[error(
        "Timeout occured while waiting for a response from the instrument. Timeout was set to {0:?}."
    )]
    Timeout(Duration),
    /// Timeout occurred while waiting for a response to a query.
    #[error(
        "Timeout occured while waiting for a response to query: {query}. Timeout was set to {timeout:?}."
    )]
    TimeoutQuery {
        /// The query that timed out.
        query: String,
        /// The timeout that was set.
        timeout: Duration,
    },
    #[cfg(feature = "visa")]
    /// Errors reported by the VISA library.
    #[error(transparent)]
    Visa(#[from] visa_rs::Error),
    /// The instrument at the given address identified itself as something else than the driver
    /// expects.
    #[error("Instrument at {address} is not a {expected}, it identified as: {idn}")]
    WrongInstrument {
        /// Address of the resource.
        address: String,
        /// Description of the instrument the driver expected.
        expected: String,
        /// The `*IDN?` response received.
        idn: String,
    },
}

/// The `InstrumentInterface` trait defines the interface for controlling instruments.
///
/// Implementors only have to provide raw reads and writes. Sending commands, querying, reading
/// until the terminator and reading IEEE 488.2 binary blocks are provided on top of these.
/// Interfaces that know how to perform a device clear or a go-to-local operation can override
/// [`InstrumentInterface::clear`] and [`InstrumentInterface::go_to_local`].
pub trait InstrumentInterface {
    /// Read exactly enough bytes to fill the buffer.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError>;

    /// Write all bytes to the instrument and flush the interface.
    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError>;

    /// Get the terminator of the interface. Defaults to `"\n"`.
    fn get_terminator(&self) -> &str {
        "\n"
    }

    /// Set the terminator of an interface from a `&str`.
    fn set_terminator(&mut self, _terminator: &str) {}

    /// Get the timeout of the interface. Defaults to three seconds.
    fn get_timeout(&self) -> Duration {
        Duration::from_secs(3)
    }

    /// Set the timeout for I/O operations.
    fn set_timeout(&mut self, _timeout: Duration) -> Result<(), InstrumentError> {
        Err(InstrumentError::InterfaceCommandNotSupported)
    }

    /// Write a string to the instrument as is, without appending a terminator.
    fn write(&mut self, data: &str) -> Result<(), InstrumentError> {
        trace!(data = data.trim_end(), "write");
        self.write_raw(data.as_bytes())
    }

    /// Send a command to the instrument.
    ///
    /// This function takes the command, appends the terminator, and writes it to the instrument.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let cmd = format!("{cmd}{}", self.get_terminator());
        self.write(&cmd)
    }

    /// Read from the instrument until the terminator is found and return the trimmed response.
    ///
    /// Bytes are read one by one. If the terminator is not seen before the timeout of the
    /// interface has passed, a [`InstrumentError::Timeout`] is returned. Invalid UTF-8 sequences
    /// are skipped and logged as a warning.
    fn read_until_terminator(&mut self) -> Result<String, InstrumentError> {
        let terminator = self.get_terminator().as_bytes().to_vec();
        let timeout = self.get_timeout();
        let mut response = Vec::new();
        let mut single_buf = [0u8];

        let tic = Instant::now();
        let mut timeout_occured = true;

        while tic.elapsed() < timeout {
            self.read_exact(&mut single_buf)?;
            response.push(single_buf[0]);
            if response.ends_with(&terminator) {
                timeout_occured = false;
                break;
            }
        }

        if timeout_occured {
            return Err(InstrumentError::Timeout(timeout));
        }

        let mut text = String::with_capacity(response.len());
        for chunk in response.utf8_chunks() {
            text.push_str(chunk.valid());
            if !chunk.invalid().is_empty() {
                warn!(bytes = ?chunk.invalid(), "received invalid UTF-8 data, skipping");
            }
        }
        let text = text.trim().to_string();
        trace!(response = %text, "read");
        Ok(text)
    }

    /// Query the instrument with a command and return the response as a String.
    ///
    /// This function uses `sendcmd` to send the command and then `read_until_terminator` to get
    /// the response. A timeout is reported together with the query that caused it.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.sendcmd(cmd)?;
        match self.read_until_terminator() {
            Err(InstrumentError::Timeout(timeout)) => Err(InstrumentError::TimeoutQuery {
                query: cmd.to_string(),
                timeout,
            }),
            other => other,
        }
    }

    /// Read an IEEE 488.2 definite-length arbitrary block and return its payload.
    ///
    /// The block has the form `#<n><len><payload>` followed by the terminator, where `<n>` is a
    /// single ASCII digit giving the number of digits of `<len>`. The terminator after the
    /// payload is consumed but not returned.
    fn read_block(&mut self) -> Result<Vec<u8>, InstrumentError> {
        let mut head = [0u8; 2];
        self.read_exact(&mut head)?;
        if head[0] != b'#' {
            return Err(InstrumentError::ResponseParseError(
                String::from_utf8_lossy(&head).to_string(),
            ));
        }
        let nof_digits = match (head[1] as char).to_digit(10) {
            Some(n) if n > 0 => n as usize,
            _ => {
                return Err(InstrumentError::ResponseParseError(
                    String::from_utf8_lossy(&head).to_string(),
                ));
            }
        };

        let mut len_digits = vec![0u8; nof_digits];
        self.read_exact(&mut len_digits)?;
        let len = str::from_utf8(&len_digits)
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| {
                InstrumentError::ResponseParseError(
                    String::from_utf8_lossy(&len_digits).to_string(),
                )
            })?;

        let mut payload = vec![0u8; len];
        self.read_exact(&mut payload)?;
        let mut tail = vec![0u8; self.get_terminator().len()];
        self.read_exact(&mut tail)?;
        trace!(len, "read block");
        Ok(payload)
    }

    /// Clear the input and output buffers of the device (VISA device clear).
    fn clear(&mut self) -> Result<(), InstrumentError> {
        Err(InstrumentError::InterfaceCommandNotSupported)
    }

    /// Send the go-to-local command, returning the front panel to the user.
    fn go_to_local(&mut self) -> Result<(), InstrumentError> {
        Err(InstrumentError::InterfaceCommandNotSupported)
    }
}

impl<I: InstrumentInterface + ?Sized> InstrumentInterface for Box<I> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        (**self).read_exact(buf)
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        (**self).write_raw(data)
    }

    fn get_terminator(&self) -> &str {
        (**self).get_terminator()
    }

    fn set_terminator(&mut self, terminator: &str) {
        (**self).set_terminator(terminator)
    }

    fn get_timeout(&self) -> Duration {
        (**self).get_timeout()
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), InstrumentError> {
        (**self).set_timeout(timeout)
    }

    fn read_block(&mut self) -> Result<Vec<u8>, InstrumentError> {
        (**self).read_block()
    }

    fn clear(&mut self) -> Result<(), InstrumentError> {
        (**self).clear()
    }

    fn go_to_local(&mut self) -> Result<(), InstrumentError> {
        (**self).go_to_local()
    }
}
