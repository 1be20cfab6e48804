//! Connection management over the chunked frame codec.
//!
//! Two clients share the wire format and differ only in socket lifecycle:
//! - [`OneShotClient`]: a fresh socket per request, torn down after the
//!   response is decoded
//! - [`PersistentClient`]: one socket held across sequential requests
//!   until explicitly closed
//!
//! Both perform exactly one request/response exchange at a time per
//! socket; the framing protocol has no way to correlate interleaved
//! streams, so sockets are never shared.

mod oneshot;
mod persistent;

pub use oneshot::OneShotClient;
pub use persistent::PersistentClient;

use crate::config::ClientConfig;
use crate::envelope::Request;
use crate::framing::{self, FrameError};
use serde::de::DeserializeOwned;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

/// Client faults
#[derive(Debug)]
pub enum ClientError {
    /// TCP connect failed (refused, unreachable, timed out).
    Connect(io::Error),
    /// A persistent-mode call was made without a prior `connect()`.
    NotConnected,
    /// Encode, decode, or transport fault during an exchange.
    Frame(FrameError),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Connect(e) => write!(f, "failed to connect: {}", e),
            ClientError::NotConnected => {
                write!(f, "not connected; call connect() before fetch_open_conn()")
            }
            ClientError::Frame(e) => write!(f, "exchange failed: {}", e),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Connect(e) => Some(e),
            ClientError::NotConnected => None,
            ClientError::Frame(e) => Some(e),
        }
    }
}

impl From<FrameError> for ClientError {
    fn from(e: FrameError) -> Self {
        ClientError::Frame(e)
    }
}

/// Open a TCP connection to the configured endpoint and apply the
/// configured socket options.
pub(crate) fn dial(config: &ClientConfig) -> Result<TcpStream, ClientError> {
    let stream = match config.connect_timeout {
        Some(timeout) => {
            let addrs = (config.host.as_str(), config.port)
                .to_socket_addrs()
                .map_err(ClientError::Connect)?;

            let mut last_err = None;
            let mut connected = None;
            for addr in addrs {
                match TcpStream::connect_timeout(&addr, timeout) {
                    Ok(stream) => {
                        connected = Some(stream);
                        break;
                    }
                    Err(e) => last_err = Some(e),
                }
            }
            match connected {
                Some(stream) => stream,
                None => {
                    let err = last_err.unwrap_or_else(|| {
                        io::Error::new(
                            io::ErrorKind::InvalidInput,
                            "address resolved to no candidates",
                        )
                    });
                    return Err(ClientError::Connect(err));
                }
            }
        }
        None => TcpStream::connect((config.host.as_str(), config.port))
            .map_err(ClientError::Connect)?,
    };

    stream.set_nodelay(true).map_err(ClientError::Connect)?;
    stream
        .set_read_timeout(config.read_timeout)
        .map_err(ClientError::Connect)?;
    stream
        .set_write_timeout(config.write_timeout)
        .map_err(ClientError::Connect)?;

    debug!(peer = %config.address(), "connection opened");
    Ok(stream)
}

/// One request/response exchange: write the framed request, read and
/// decode the framed response.
pub(crate) fn exchange<T: DeserializeOwned>(
    stream: &mut TcpStream,
    chunk_size: u32,
    request: &Request,
) -> Result<T, ClientError> {
    framing::write_value(stream, chunk_size, request)?;
    let response = framing::read_value(stream)?;
    Ok(response)
}
