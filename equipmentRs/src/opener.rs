//! Opening interfaces from resource addresses.

use std::time::Duration;

use tracing::{debug, warn};

use crate::{DynInterface, InstrumentError, ResourceAddress};

/// Settings used when opening a resource.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionSettings {
    /// Timeout for I/O operations. Defaults to one second.
    pub timeout: Duration,
    /// Time to wait for the connection to open. Defaults to one second.
    pub open_timeout: Duration,
    /// Perform a device clear right after opening. Defaults to `false`.
    pub clear: bool,
    /// Baud rate for serial resources. Defaults to 9600.
    pub baud_rate: u32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            open_timeout: Duration::from_secs(1),
            clear: false,
            baud_rate: 9600,
        }
    }
}

/// Anything that can turn a resource address into an open interface.
///
/// The [`DefaultOpener`] opens real hardware. Tests and simulations provide their own opener that
/// hands out loopback interfaces instead.
pub trait ResourceOpener {
    /// Open the resource at the given address.
    fn open(
        &self,
        address: &str,
        settings: &ConnectionSettings,
    ) -> Result<DynInterface, InstrumentError>;
}

/// Opens resources by routing their [`ResourceAddress`] to the matching interface.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultOpener;

impl ResourceOpener for DefaultOpener {
    fn open(
        &self,
        address: &str,
        settings: &ConnectionSettings,
    ) -> Result<DynInterface, InstrumentError> {
        let mut interface = open_address(address.parse()?, settings)?;
        if settings.clear {
            match interface.clear() {
                Ok(()) => {}
                Err(InstrumentError::InterfaceCommandNotSupported) => {
                    warn!(address, "device clear not supported by interface");
                }
                Err(e) => return Err(e),
            }
        }
        debug!(address, "resource opened");
        Ok(interface)
    }
}

fn open_address(
    address: ResourceAddress,
    settings: &ConnectionSettings,
) -> Result<DynInterface, InstrumentError> {
    match address {
        ResourceAddress::TcpSocket { host, port } => Ok(Box::new(crate::TcpIpInterface::full(
            (host.as_str(), port),
            settings.open_timeout,
            settings.timeout,
        )?)),
        #[cfg(feature = "serial")]
        ResourceAddress::Serial { port } => {
            let spb = serialport::new(port, settings.baud_rate).timeout(settings.timeout);
            Ok(Box::new(crate::SerialInterface::full(spb)?))
        }
        #[cfg(not(feature = "serial"))]
        ResourceAddress::Serial { port } => Err(InstrumentError::InvalidArgument(format!(
            "Serial port {port} requires the `serial` feature"
        ))),
        #[cfg(feature = "visa")]
        ResourceAddress::Visa(resource) => Ok(Box::new(crate::VisaInterface::open(
            &resource,
            settings.open_timeout,
            settings.timeout,
        )?)),
        #[cfg(not(feature = "visa"))]
        ResourceAddress::Visa(resource) => Err(InstrumentError::InvalidArgument(format!(
            "Resource {resource} requires the `visa` feature"
        ))),
    }
}
