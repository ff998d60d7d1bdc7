//! Server configuration module
//! Handles dynamic configuration parameters for the relay server

use crate::constants::{
    DEFAULT_HOST, DEFAULT_MAX_CONNECTIONS, DEFAULT_MAX_MESSAGE_SIZE,
    DEFAULT_MESSAGE_DURATION_MS, DEFAULT_NOTIFICATION_DURATION_MS, DEFAULT_OUTBOUND_QUEUE,
    DEFAULT_PORT, DEFAULT_SEND_TIMEOUT_MS,
};
use crate::core::serializer::WireFormat;
use crate::error::{RelayError, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on simultaneously open overlay connections
    pub max_connections: usize,
    /// Largest inbound frame accepted from a viewer
    pub max_message_size: usize,
    /// Per-connection bound on a single outbound delivery
    pub send_timeout: Duration,
    /// Depth of each connection's outbound queue
    pub outbound_queue: usize,
    /// Display time attached to chat lines sent through the server
    pub message_duration_ms: i32,
    /// Display time attached to notifications sent through the server
    pub notification_duration_ms: i32,
    pub wire_format: WireFormat,
    /// Directory of overlay assets handed to the static file collaborator
    pub asset_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            send_timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
            outbound_queue: DEFAULT_OUTBOUND_QUEUE,
            message_duration_ms: DEFAULT_MESSAGE_DURATION_MS,
            notification_duration_ms: DEFAULT_NOTIFICATION_DURATION_MS,
            wire_format: WireFormat::Named,
            asset_dir: None,
        }
    }
}

impl ServerConfig {
    /// Loopback configuration on an ephemeral port with short timeouts
    pub fn for_testing() -> Self {
        Self {
            port: 0,
            send_timeout: Duration::from_millis(200),
            outbound_queue: 4,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables if available
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let host = env::var("OVERLAY_RELAY_HOST").unwrap_or(defaults.host);
        let port = parse_var("OVERLAY_RELAY_PORT")?.unwrap_or(defaults.port);
        let max_connections =
            parse_var("OVERLAY_RELAY_MAX_CONN")?.unwrap_or(defaults.max_connections);
        let max_message_size =
            parse_var("OVERLAY_RELAY_MAX_MESSAGE_SIZE")?.unwrap_or(defaults.max_message_size);
        let send_timeout = parse_var("OVERLAY_RELAY_SEND_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.send_timeout);
        let outbound_queue =
            parse_var("OVERLAY_RELAY_OUTBOUND_QUEUE")?.unwrap_or(defaults.outbound_queue);
        let message_duration_ms = parse_var("OVERLAY_RELAY_MESSAGE_DURATION_MS")?
            .unwrap_or(defaults.message_duration_ms);
        let notification_duration_ms = parse_var("OVERLAY_RELAY_NOTIFICATION_DURATION_MS")?
            .unwrap_or(defaults.notification_duration_ms);
        let wire_format =
            parse_var("OVERLAY_RELAY_WIRE_FORMAT")?.unwrap_or(defaults.wire_format);
        let asset_dir = env::var("OVERLAY_RELAY_ASSET_DIR").ok().map(PathBuf::from);

        let config = Self {
            host,
            port,
            max_connections,
            max_message_size,
            send_timeout,
            outbound_queue,
            message_duration_ms,
            notification_duration_ms,
            wire_format,
            asset_dir,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(RelayError::ConfigError(
                "max_connections must be greater than zero".to_string(),
            ));
        }
        if self.outbound_queue == 0 {
            return Err(RelayError::ConfigError(
                "outbound_queue must be greater than zero".to_string(),
            ));
        }
        if self.send_timeout.is_zero() {
            return Err(RelayError::ConfigError(
                "send_timeout must be greater than zero".to_string(),
            ));
        }
        if self.message_duration_ms < 0 || self.notification_duration_ms < 0 {
            return Err(RelayError::ConfigError(
                "display durations cannot be negative".to_string(),
            ));
        }
        if let Some(dir) = &self.asset_dir {
            if !dir.is_dir() {
                return Err(RelayError::ConfigError(format!(
                    "asset directory does not exist: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Address string suitable for `SocketAddr` parsing
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Unset variables fall back to defaults, malformed ones are reported
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| RelayError::ConfigError(format!("{} is invalid: {}", name, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_reference_port() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 23399);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.wire_format, WireFormat::Named);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_for_testing_uses_ephemeral_port() {
        let config = ServerConfig::for_testing();
        assert_eq!(config.port, 0);
        assert!(config.send_timeout < Duration::from_secs(1));
    }

    #[test]
    fn test_validate_rejects_zero_queue() {
        let config = ServerConfig {
            outbound_queue: 0,
            ..ServerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("outbound_queue"));
    }

    #[test]
    fn test_validate_rejects_missing_asset_dir() {
        let config = ServerConfig {
            asset_dir: Some(PathBuf::from("/definitely/not/here/overlay-assets")),
            ..ServerConfig::default()
        };
        assert!(matches!(config.validate(), Err(RelayError::ConfigError(_))));
    }

    #[test]
    fn test_from_env_reads_overrides() {
        env::set_var("OVERLAY_RELAY_PORT", "24000");
        env::set_var("OVERLAY_RELAY_WIRE_FORMAT", "Generic");
        let config = ServerConfig::from_env().unwrap();
        env::remove_var("OVERLAY_RELAY_PORT");
        env::remove_var("OVERLAY_RELAY_WIRE_FORMAT");

        assert_eq!(config.port, 24000);
        assert_eq!(config.wire_format, WireFormat::Generic);
    }
}
