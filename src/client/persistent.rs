//! Persistent-mode client: one socket reused across requests.

use crate::client::{dial, exchange, ClientError};
use crate::config::ClientConfig;
use crate::envelope::Request;
use serde::de::DeserializeOwned;
use socket2::{SockRef, TcpKeepalive};
use std::net::{Shutdown, TcpStream};
use tracing::debug;

/// Client that holds one socket open across sequential exchanges.
///
/// Lifecycle is a two-state machine: disconnected (initial) and
/// connected. `connect` and `close` are both idempotent; `fetch_open_conn`
/// requires the connected state and leaves the client connected even when
/// an exchange faults, so the caller decides whether to tear down or
/// retry on a fresh connection.
///
/// The `&mut self` receiver on `fetch_open_conn` makes the exclusive
/// socket ownership the protocol requires a compile-time property.
pub struct PersistentClient {
    config: ClientConfig,
    stream: Option<TcpStream>,
}

impl PersistentClient {
    /// Create a client for the configured endpoint, initially
    /// disconnected.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            stream: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Open the connection. A no-op when already connected; the existing
    /// socket is kept and no second one is opened.
    pub fn connect(&mut self) -> Result<(), ClientError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let stream = dial(&self.config)?;
        if let Some(interval) = self.config.keepalive {
            let keepalive = TcpKeepalive::new().with_time(interval);
            SockRef::from(&stream)
                .set_tcp_keepalive(&keepalive)
                .map_err(ClientError::Connect)?;
        }

        self.stream = Some(stream);
        Ok(())
    }

    /// Close the connection. A no-op when already disconnected.
    pub fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            // Half-dead sockets error here; the socket is gone either way.
            let _ = stream.shutdown(Shutdown::Both);
            debug!(peer = %self.config.address(), "connection closed");
        }
    }

    /// Perform one exchange over the held socket.
    ///
    /// Requires a prior `connect()`; otherwise fails with
    /// [`ClientError::NotConnected`] before any I/O happens. Requests
    /// that have not decided their `connectionAlive` flag are stamped
    /// `true`, signalling the server this socket will be reused.
    pub fn fetch_open_conn<T: DeserializeOwned>(
        &mut self,
        request: &Request,
    ) -> Result<T, ClientError> {
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;

        let response = match request.connection_alive {
            Some(_) => exchange(stream, self.config.chunk_size, request)?,
            None => {
                let stamped = request.clone().connection_alive(true);
                exchange(stream, self.config.chunk_size, &stamped)?
            }
        };

        debug!(
            path = %request.meta.path,
            method = %request.meta.method,
            "persistent exchange complete"
        );
        Ok(response)
    }
}

impl Drop for PersistentClient {
    fn drop(&mut self) {
        self.close();
    }
}
