//! Client configuration

use std::env;

/// Default SimpleVOC endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8008";

/// Configuration options for a SimpleVOC connection
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server endpoint URL, `scheme://host:port` (default: http://localhost:8008)
    pub endpoint: String,
    /// Request timeout in milliseconds (default: 30000)
    pub timeout_ms: u64,
    /// Maximum idle connections kept per host by the pool (default: 20)
    pub max_idle_per_host: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: 30000,
            max_idle_per_host: 20,
        }
    }
}

impl ClientConfig {
    /// Configuration for a plain-HTTP server at `host:port`
    pub fn for_host(host: &str, port: u16) -> Self {
        Self {
            endpoint: format!("http://{}:{}", host, port),
            ..Default::default()
        }
    }

    /// Load configuration from `SIMPLEVOC_ENDPOINT`, `SIMPLEVOC_TIMEOUT_MS`
    /// and `SIMPLEVOC_MAX_IDLE_PER_HOST`. Unset or invalid values fall back
    /// to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let endpoint = env::var("SIMPLEVOC_ENDPOINT").unwrap_or(defaults.endpoint);
        let timeout_ms = env::var("SIMPLEVOC_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(defaults.timeout_ms);
        let max_idle_per_host = env::var("SIMPLEVOC_MAX_IDLE_PER_HOST")
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(defaults.max_idle_per_host);

        Self {
            endpoint,
            timeout_ms,
            max_idle_per_host,
        }
    }
}
