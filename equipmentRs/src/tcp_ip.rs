//! This module provides the implementation for an instrument controlled via a raw TCP/IP socket.
//!
//! SCPI instruments usually listen on port 5025 for raw socket connections.

use std::{
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use tracing::debug;

use crate::{Instrument, InstrumentError};

/// A blocking TCP/IP implementation using the [`std::net::TcpStream`] struct.
#[derive(Debug)]
pub struct TcpIpInterface {}

impl TcpIpInterface {
    /// Try to create a new TCP/IP interface with a default timeout of three seconds.
    ///
    /// The terminator is by default set to `"\n"`. The timeout is used as read and write timeout
    /// of the socket, such that an instrument that does not answer never blocks forever.
    ///
    /// # Arguments
    /// * `sock_addr` - Socket address.
    pub fn simple<A: ToSocketAddrs>(sock_addr: A) -> Result<Instrument<TcpStream>, InstrumentError> {
        let stream = TcpStream::connect(sock_addr)?;
        Self::from_stream(stream, Duration::from_secs(3))
    }

    /// Try to create a new TCP/IP interface with given timeouts.
    ///
    /// Every address that `sock_addr` resolves to is tried in turn, each with `open_timeout` as
    /// connection timeout. The first successful connection is used.
    ///
    /// # Arguments
    /// * `sock_addr` - Socket address.
    /// * `open_timeout` - Timeout for establishing the connection.
    /// * `timeout` - Timeout for I/O operations.
    pub fn full<A: ToSocketAddrs>(
        sock_addr: A,
        open_timeout: Duration,
        timeout: Duration,
    ) -> Result<Instrument<TcpStream>, InstrumentError> {
        let mut last_err = None;
        for addr in sock_addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, open_timeout) {
                Ok(stream) => {
                    debug!(%addr, "socket connected");
                    return Self::from_stream(stream, timeout);
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(match last_err {
            Some(e) => e.into(),
            None => InstrumentError::InvalidArgument(
                "Socket address did not resolve to any address".to_string(),
            ),
        })
    }

    fn from_stream(
        stream: TcpStream,
        timeout: Duration,
    ) -> Result<Instrument<TcpStream>, InstrumentError> {
        stream.set_write_timeout(Some(timeout))?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        Ok(Instrument::new(stream, timeout))
    }
}
