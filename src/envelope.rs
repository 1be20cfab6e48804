//! Application envelope carried in the JSON payload.
//!
//! Requests wrap a routing header and a route-specific body:
//!
//! ```json
//! {"meta": {"path": "/index/search", "method": "GET"}, "body": {...}, "connectionAlive": true}
//! ```
//!
//! Responses carry a numeric status code and an arbitrary body:
//!
//! ```json
//! {"status": 0, "body": {...}}
//! ```
//!
//! `connectionAlive` is advisory: a client holding its socket open across
//! requests sets it so the server keeps the connection around for the
//! next exchange.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request verb, dispatched together with the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// Routing header of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMeta {
    pub path: String,
    pub method: Method,
}

/// One request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub meta: RequestMeta,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub body: Value,
    #[serde(
        rename = "connectionAlive",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub connection_alive: Option<bool>,
}

impl Request {
    /// Build a request for the given route.
    pub fn new(method: Method, path: impl Into<String>, body: Value) -> Self {
        Self {
            meta: RequestMeta {
                path: path.into(),
                method,
            },
            body,
            connection_alive: None,
        }
    }

    /// Set the advisory keep-the-connection flag.
    pub fn connection_alive(mut self, alive: bool) -> Self {
        self.connection_alive = Some(alive);
        self
    }
}

/// Response status code, serialized as a JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Status {
    Ok,
    Processing,
    NotFound,
    BadRequest,
    InternalServerError,
}

/// Status code outside the defined range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidStatus(pub u8);

impl std::fmt::Display for InvalidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid response status code {}", self.0)
    }
}

impl std::error::Error for InvalidStatus {}

impl TryFrom<u8> for Status {
    type Error = InvalidStatus;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Status::Ok),
            1 => Ok(Status::Processing),
            2 => Ok(Status::NotFound),
            3 => Ok(Status::BadRequest),
            4 => Ok(Status::InternalServerError),
            other => Err(InvalidStatus(other)),
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        match status {
            Status::Ok => 0,
            Status::Processing => 1,
            Status::NotFound => 2,
            Status::BadRequest => 3,
            Status::InternalServerError => 4,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Ok => "OK",
            Status::Processing => "Processing",
            Status::NotFound => "Not Found",
            Status::BadRequest => "Bad Request",
            Status::InternalServerError => "Internal Server Error",
        };
        write!(f, "{}", name)
    }
}

impl Status {
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

/// One response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(default)]
    pub body: Value,
}

impl Response {
    /// Decode the body into a route-specific shape.
    pub fn parse_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.body.clone())
    }
}
