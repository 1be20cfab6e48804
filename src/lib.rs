//! chunkline: a TCP client for a chunk-framed JSON protocol.
//!
//! Messages travel as an 8-byte header (chunk size and chunk count, both
//! big-endian u32) followed by the UTF-8 JSON payload split into
//! back-to-back chunks. Two clients speak it:
//! - [`OneShotClient`]: ephemeral mode, a fresh socket per request
//! - [`PersistentClient`]: persistent mode, one socket reused across
//!   sequential requests
//!
//! The payload carries a routing envelope (`meta.path` + `meta.method`
//! select a server-side route); [`routes`] builds requests for the index
//! server's routes.

pub mod client;
pub mod config;
pub mod envelope;
pub mod framing;
pub mod routes;

pub use client::{ClientError, OneShotClient, PersistentClient};
pub use config::{ClientConfig, ConnectionArgs};
pub use envelope::{Method, Request, RequestMeta, Response, Status};
