//! Ephemeral-mode client: one socket per request.

use crate::client::{dial, exchange, ClientError};
use crate::config::ClientConfig;
use crate::envelope::Request;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Client that opens a fresh, independent socket for every call.
///
/// The socket lives only for the single request/response exchange and is
/// closed before `fetch` returns, on both the success and fault paths.
/// The instance itself holds no connection state, so `fetch` takes
/// `&self` and the client is freely reusable.
pub struct OneShotClient {
    config: ClientConfig,
}

impl OneShotClient {
    /// Create a client for the configured endpoint.
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Perform one exchange over a brand-new socket.
    ///
    /// The response payload decodes into any JSON shape the caller asks
    /// for; `serde_json::Value` accepts arbitrary responses.
    pub fn fetch<T: DeserializeOwned>(&self, request: &Request) -> Result<T, ClientError> {
        let mut stream = dial(&self.config)?;
        let response = exchange(&mut stream, self.config.chunk_size, request)?;
        debug!(
            path = %request.meta.path,
            method = %request.meta.method,
            "ephemeral exchange complete"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Method, Response, Status};
    use crate::framing;
    use serde_json::{json, Value};
    use std::net::TcpListener;
    use std::thread;

    fn test_config(port: u16) -> ClientConfig {
        ClientConfig {
            port,
            ..ClientConfig::default()
        }
    }

    /// Bind an ephemeral port and serve `exchanges` request/response
    /// pairs on a single accepted connection.
    fn spawn_server(
        exchanges: usize,
        reply: Value,
    ) -> (u16, thread::JoinHandle<Vec<Request>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for _ in 0..exchanges {
                let (mut stream, _) = listener.accept().unwrap();
                let request: Request = framing::read_value(&mut stream).unwrap();
                seen.push(request);
                framing::write_value(&mut stream, 2048, &reply).unwrap();
            }
            seen
        });

        (port, handle)
    }

    #[test]
    fn test_fetch_round_trip() {
        let (port, server) = spawn_server(1, json!({"results": []}));

        let client = OneShotClient::new(test_config(port));
        let request = Request::new(Method::Get, "/index/search", json!({"query": "mr"}));
        let response: Value = client.fetch(&request).unwrap();

        assert_eq!(response, json!({"results": []}));
        let seen = server.join().unwrap();
        assert_eq!(seen[0], request);
    }

    #[test]
    fn test_fetch_typed_envelope() {
        let (port, server) = spawn_server(1, json!({"status": 0, "body": {"files": ["a.txt"]}}));

        let client = OneShotClient::new(test_config(port));
        let request = Request::new(Method::Get, "/index/search", json!({"query": "a"}));
        let response: Response = client.fetch(&request).unwrap();

        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.body, json!({"files": ["a.txt"]}));
        server.join().unwrap();
    }

    #[test]
    fn test_fetch_opens_fresh_socket_per_call() {
        // Two fetches must show up as two distinct connections.
        let (port, server) = spawn_server(2, json!({"status": 0, "body": null}));

        let client = OneShotClient::new(test_config(port));
        let request = Request::new(Method::Get, "/index/search", json!({"query": "x"}));
        let _: Value = client.fetch(&request).unwrap();
        let _: Value = client.fetch(&request).unwrap();

        let seen = server.join().unwrap();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_fetch_connection_refused() {
        // Bind then immediately drop to get a port nothing listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let client = OneShotClient::new(test_config(port));
        let request = Request::new(Method::Get, "/index/search", json!({"query": "x"}));
        match client.fetch::<Value>(&request) {
            Err(ClientError::Connect(_)) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_fetch_truncated_response() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let _: Request = framing::read_value(&mut stream).unwrap();
            // Header promises a chunk that never arrives.
            use std::io::Write;
            stream.write_all(&2048u32.to_be_bytes()).unwrap();
            stream.write_all(&1u32.to_be_bytes()).unwrap();
            drop(stream);
        });

        let client = OneShotClient::new(test_config(port));
        let request = Request::new(Method::Get, "/index/search", json!({"query": "x"}));
        match client.fetch::<Value>(&request) {
            Err(ClientError::Frame(framing::FrameError::Truncated(_))) => {}
            other => panic!("unexpected: {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_fetch_does_not_set_connection_alive() {
        let (port, server) = spawn_server(1, json!({"status": 0, "body": null}));

        let client = OneShotClient::new(test_config(port));
        let request = Request::new(Method::Get, "/index/search", json!({"query": "x"}));
        let _: Value = client.fetch(&request).unwrap();

        let seen = server.join().unwrap();
        assert_eq!(seen[0].connection_alive, None);
    }
}
