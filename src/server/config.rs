//! Server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::producer::ProducerConfig;
use crate::registry::RegistryConfig;

/// Port used when a bind address omits one
pub const DEFAULT_PORT: u16 = 8080;

/// Environment variable overriding the producer interval, in milliseconds
pub const ENV_WORKER_INTERVAL_MS: &str = "HARMONIC_WORKER_INTERVAL_MS";

/// Environment variable enabling the producer at startup (`true`/`1`)
pub const ENV_WORKER_ENABLED: &str = "HARMONIC_WORKER_ENABLED";

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent WebSocket connections (0 = unlimited)
    pub max_connections: usize,

    /// Connection registry settings
    pub registry: RegistryConfig,

    /// Background producer settings
    pub producer: ProducerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            max_connections: 0, // Unlimited
            registry: RegistryConfig::default(),
            producer: ProducerConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Default config with producer overrides read from the environment
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_WORKER_INTERVAL_MS) {
            match value.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.producer.interval = Duration::from_millis(ms),
                _ => tracing::warn!(
                    var = ENV_WORKER_INTERVAL_MS,
                    value = %value,
                    "Ignoring invalid producer interval"
                ),
            }
        }

        if let Some(value) = lookup(ENV_WORKER_ENABLED) {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.producer.start_enabled = true,
                "0" | "false" | "no" => self.producer.start_enabled = false,
                _ => tracing::warn!(
                    var = ENV_WORKER_ENABLED,
                    value = %value,
                    "Ignoring invalid producer flag"
                ),
            }
        }

        self
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum WebSocket connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the producer interval
    pub fn worker_interval(mut self, interval: Duration) -> Self {
        self.producer.interval = interval;
        self
    }

    /// Start the producer with the server
    pub fn worker_enabled(mut self, enabled: bool) -> Self {
        self.producer.start_enabled = enabled;
        self
    }

    /// Set the per-connection send timeout
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.registry.send_timeout = timeout;
        self
    }
}

/// Parse a bind address from the command line
///
/// Accepts formats:
/// - "localhost" -> 127.0.0.1:8080
/// - "localhost:9000" -> 127.0.0.1:9000
/// - "127.0.0.1" -> 127.0.0.1:8080
/// - "0.0.0.0:8081" -> 0.0.0.0:8081
pub fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.producer.interval, Duration::from_secs(5));
        assert!(!config.producer.start_enabled);
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .max_connections(50)
            .worker_interval(Duration::from_millis(250))
            .worker_enabled(true)
            .send_timeout(Duration::from_secs(1));

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.producer.interval, Duration::from_millis(250));
        assert!(config.producer.start_enabled);
        assert_eq!(config.registry.send_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::default().apply_env(|key| match key {
            ENV_WORKER_INTERVAL_MS => Some("1500".into()),
            ENV_WORKER_ENABLED => Some("TRUE".into()),
            _ => None,
        });

        assert_eq!(config.producer.interval, Duration::from_millis(1500));
        assert!(config.producer.start_enabled);
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let config = ServerConfig::default().apply_env(|key| match key {
            ENV_WORKER_INTERVAL_MS => Some("0".into()),
            ENV_WORKER_ENABLED => Some("maybe".into()),
            _ => None,
        });

        assert_eq!(config.producer.interval, Duration::from_secs(5));
        assert!(!config.producer.start_enabled);
    }

    #[test]
    fn test_parse_bind_addr() {
        assert_eq!(
            parse_bind_addr("localhost").unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_bind_addr("localhost:9000").unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(parse_bind_addr("0.0.0.0:8081").unwrap().port(), 8081);
        assert!(parse_bind_addr("not-an-address").is_err());
    }
}
