//! Listener configuration for the relay server.

use crate::config::first_present;
use crate::error::ConfigError;

pub const HOST_VAR: &str = "RELAY_HOST";
pub const PORT_VAR: &str = "RELAY_PORT";
pub const MAX_BODY_VAR: &str = "RELAY_MAX_BODY_BYTES";

/// Configuration for the HTTP listener.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load listener settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(host) = first_present(&lookup, &[HOST_VAR]) {
            config.host = host;
        }
        if let Some(raw) = first_present(&lookup, &[PORT_VAR]) {
            config.port = raw.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    name: PORT_VAR,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(raw) = first_present(&lookup, &[MAX_BODY_VAR]) {
            config.max_body_size = raw.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    name: MAX_BODY_VAR,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(config)
    }

    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the body size limit.
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_from_lookup() {
        let config = ServerConfig::from_lookup(|name| match name {
            "RELAY_PORT" => Some("9090".to_string()),
            "RELAY_MAX_BODY_BYTES" => Some("1024".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9090");
        assert_eq!(config.max_body_size, 1024);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = ServerConfig::from_lookup(|name| {
            (name == "RELAY_PORT").then(|| "http".to_string())
        });
        assert!(result.is_err());
    }
}
