//! Configuration module for the client.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values.

use crate::framing::DEFAULT_CHUNK_SIZE;
use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Connection-related command-line arguments, flattened into the binary's
/// CLI alongside its subcommands.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Server host (e.g. 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Chunk size in bytes used to split outbound payloads
    #[arg(long)]
    pub chunk_size: Option<u32>,

    /// Connect timeout in milliseconds (0 = wait indefinitely)
    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// Read timeout in milliseconds (0 = wait indefinitely)
    #[arg(long)]
    pub read_timeout_ms: Option<u64>,

    /// Write timeout in milliseconds (0 = wait indefinitely)
    #[arg(long)]
    pub write_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection endpoint and framing configuration
#[derive(Debug, Deserialize)]
pub struct ConnectionConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Chunk size in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            chunk_size: default_chunk_size(),
        }
    }
}

/// Socket deadline configuration; 0 disables the respective deadline
#[derive(Debug, Deserialize)]
pub struct TimeoutConfig {
    /// Connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_ms: u64,
    /// Read timeout in milliseconds
    #[serde(default)]
    pub read_ms: u64,
    /// Write timeout in milliseconds
    #[serde(default)]
    pub write_ms: u64,
    /// TCP keepalive probe interval in seconds for persistent
    /// connections, 0 disables keepalive
    #[serde(default)]
    pub keepalive_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_timeout_ms(),
            read_ms: 0,
            write_ms: 0,
            keepalive_secs: 0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_chunk_size() -> u32 {
    DEFAULT_CHUNK_SIZE
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub chunk_size: u32,
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub keepalive: Option<Duration>,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            chunk_size: default_chunk_size(),
            connect_timeout: Some(Duration::from_millis(default_connect_timeout_ms())),
            read_timeout: None,
            write_timeout: None,
            keepalive: None,
            log_level: default_log_level(),
        }
    }
}

impl ClientConfig {
    /// Resolve configuration from parsed CLI args and the optional TOML
    /// file they point at. CLI arguments take precedence over TOML file
    /// values.
    pub fn resolve(args: &ConnectionArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = args.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        let config = ClientConfig {
            host: args.host.clone().unwrap_or(toml_config.connection.host),
            port: args.port.unwrap_or(toml_config.connection.port),
            chunk_size: args
                .chunk_size
                .unwrap_or(toml_config.connection.chunk_size),
            connect_timeout: timeout_from_ms(
                args.connect_timeout_ms
                    .unwrap_or(toml_config.timeouts.connect_ms),
            ),
            read_timeout: timeout_from_ms(
                args.read_timeout_ms.unwrap_or(toml_config.timeouts.read_ms),
            ),
            write_timeout: timeout_from_ms(
                args.write_timeout_ms
                    .unwrap_or(toml_config.timeouts.write_ms),
            ),
            keepalive: match toml_config.timeouts.keepalive_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            log_level: if args.log_level != "info" {
                args.log_level.clone()
            } else {
                toml_config.logging.level
            },
        };

        if config.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }

        Ok(config)
    }

    /// The configured server address as `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn timeout_from_ms(ms: u64) -> Option<Duration> {
    match ms {
        0 => None,
        ms => Some(Duration::from_millis(ms)),
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    ZeroChunkSize,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ZeroChunkSize => {
                write!(f, "chunk_size must be at least 1")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TomlConfig::default();
        assert_eq!(config.connection.host, "127.0.0.1");
        assert_eq!(config.connection.port, 8080);
        assert_eq!(config.connection.chunk_size, 2048);
        assert_eq!(config.timeouts.connect_ms, 5000);
        assert_eq!(config.timeouts.read_ms, 0);
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [connection]
            host = "10.0.0.5"
            port = 9090
            chunk_size = 4096

            [timeouts]
            connect_ms = 1000
            read_ms = 2000
            keepalive_secs = 30

            [logging]
            level = "debug"
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.connection.host, "10.0.0.5");
        assert_eq!(config.connection.port, 9090);
        assert_eq!(config.connection.chunk_size, 4096);
        assert_eq!(config.timeouts.connect_ms, 1000);
        assert_eq!(config.timeouts.read_ms, 2000);
        assert_eq!(config.timeouts.keepalive_secs, 30);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_cli_precedence() {
        let args = ConnectionArgs {
            host: Some("192.168.1.1".to_string()),
            port: Some(7070),
            chunk_size: Some(1024),
            read_timeout_ms: Some(250),
            log_level: "info".to_string(),
            ..Default::default()
        };

        let config = ClientConfig::resolve(&args).unwrap();
        assert_eq!(config.host, "192.168.1.1");
        assert_eq!(config.port, 7070);
        assert_eq!(config.chunk_size, 1024);
        assert_eq!(config.read_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.connect_timeout, Some(Duration::from_millis(5000)));
        assert_eq!(config.write_timeout, None);
        assert_eq!(config.address(), "192.168.1.1:7070");
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let args = ConnectionArgs {
            chunk_size: Some(0),
            log_level: "info".to_string(),
            ..Default::default()
        };
        match ClientConfig::resolve(&args) {
            Err(ConfigError::ZeroChunkSize) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let args = ConnectionArgs {
            connect_timeout_ms: Some(0),
            log_level: "info".to_string(),
            ..Default::default()
        };
        let config = ClientConfig::resolve(&args).unwrap();
        assert_eq!(config.connect_timeout, None);
    }
}
