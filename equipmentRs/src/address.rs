//! Parsing of VISA-style resource addresses.

use std::{fmt, str::FromStr};

use crate::InstrumentError;

/// A parsed resource address, deciding which interface is used to talk to the instrument.
///
/// - `TCPIP[board]::<host>::<port>::SOCKET` is a raw SCPI socket.
/// - `ASRL<port>::INSTR` is a serial port. A purely numeric port is mapped to `COM<port>`.
/// - Everything else, e.g., `GPIB0::5::INSTR` or `USB0::...::INSTR`, is handed to VISA as is.
///
/// Keywords are matched case-insensitively, host and port names keep their case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceAddress {
    /// Raw TCP/IP socket.
    TcpSocket {
        /// Host name or IP address.
        host: String,
        /// Port number.
        port: u16,
    },
    /// Serial port.
    Serial {
        /// Name of the serial port.
        port: String,
    },
    /// Any other address, opened through VISA.
    Visa(String),
}

impl FromStr for ResourceAddress {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let address = s.trim();
        if address.is_empty() {
            return Err(InstrumentError::InvalidArgument(
                "Resource address must not be empty".to_string(),
            ));
        }
        let parts: Vec<&str> = address.split("::").collect();
        let head = parts[0].to_ascii_uppercase();

        if head.starts_with("TCPIP")
            && parts.len() == 4
            && parts[3].eq_ignore_ascii_case("SOCKET")
        {
            let port = parts[2].parse::<u16>().map_err(|_| {
                InstrumentError::InvalidArgument(format!(
                    "Invalid socket port '{}' in address {address}",
                    parts[2]
                ))
            })?;
            return Ok(Self::TcpSocket {
                host: parts[1].to_string(),
                port,
            });
        }

        if head.starts_with("ASRL") && parts.len() == 2 && parts[1].eq_ignore_ascii_case("INSTR") {
            let port = &parts[0][4..];
            if port.is_empty() {
                return Err(InstrumentError::InvalidArgument(format!(
                    "Missing serial port in address {address}"
                )));
            }
            let port = if port.chars().all(|c| c.is_ascii_digit()) {
                format!("COM{port}")
            } else {
                port.to_string()
            };
            return Ok(Self::Serial { port });
        }

        Ok(Self::Visa(address.to_string()))
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TcpSocket { host, port } => write!(f, "TCPIP0::{host}::{port}::SOCKET"),
            Self::Serial { port } => write!(f, "ASRL{port}::INSTR"),
            Self::Visa(address) => write!(f, "{address}"),
        }
    }
}
