use std::net::{IpAddr, Ipv4Addr};
use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

/// The ports the server may listen on.
pub const VALID_PORTS: RangeInclusive<u16> = 1024..=49151;

/// The port used when none is configured.
pub const DEFAULT_PORT: u16 = 12345;

/// User preferences of the remote server.
///
/// # Example
///
/// ```
/// use bat_remote::RemoteConfig;
///
/// let config: RemoteConfig = serde_json::from_str(r#"{"http_port": 8080}"#).unwrap();
/// assert!(config.http_enable);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Whether the server should run.
    #[serde(default = "default_http_enable")]
    pub http_enable: bool,
    /// The port the server listens on.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

fn default_http_enable() -> bool {
    true
}

fn default_http_port() -> u16 {
    DEFAULT_PORT
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            http_enable: true,
            http_port: DEFAULT_PORT,
        }
    }
}

impl RemoteConfig {
    /// Check that the port is in [`VALID_PORTS`].
    pub fn validate(&self) -> Result<(), RemoteError> {
        if !VALID_PORTS.contains(&self.http_port) {
            return Err(RemoteError::InvalidPort(self.http_port));
        }
        Ok(())
    }
}

/// Settings of the server that are not user preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerOptions {
    /// The address the server binds to.
    pub host: IpAddr,
    /// How long a query waits for the main thread.
    pub request_timeout: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Settings of the main thread executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// The period between two drains of the task queue.
    pub tick: Duration,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() -> Result<(), serde_json::Error> {
        let config: RemoteConfig = serde_json::from_str("{}")?;
        assert_eq!(config, RemoteConfig::default());
        assert_eq!(config.http_port, 12345);
        assert!(config.http_enable);
        Ok(())
    }

    #[test]
    fn test_validate_port() {
        let config = |http_port| RemoteConfig {
            http_enable: true,
            http_port,
        };
        assert!(config(1024).validate().is_ok());
        assert!(config(49151).validate().is_ok());
        assert!(matches!(
            config(1023).validate(),
            Err(RemoteError::InvalidPort(1023))
        ));
        assert!(matches!(
            config(49152).validate(),
            Err(RemoteError::InvalidPort(49152))
        ));
    }
}
