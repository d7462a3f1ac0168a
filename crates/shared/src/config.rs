//! Configuration management using environment variables

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Remote trigger store configuration
    pub etcd: EtcdConfig,

    /// Server configuration
    pub server: ServerConfig,
}

/// Remote trigger store (etcd) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EtcdConfig {
    /// Cluster endpoints
    pub endpoints: Vec<String>,

    /// Key prefix under which trigger definitions are stored.
    /// Always normalized to end with "/".
    pub prefix: String,

    /// Dial timeout in seconds for the initial connection
    pub connect_timeout_secs: u64,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Ok(Self {
            etcd: EtcdConfig {
                endpoints: env::var("ETCD_ENDPOINTS")
                    .unwrap_or_else(|_| "localhost:2379".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                prefix: normalize_prefix(
                    &env::var("TRIGGER_PREFIX").unwrap_or_else(|_| "/triggers/".to_string()),
                ),
                connect_timeout_secs: env::var("ETCD_CONNECT_TIMEOUT")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .map_err(|e| Error::config(format!("Invalid ETCD_CONNECT_TIMEOUT: {}", e)))?,
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|e| Error::config(format!("Invalid SERVER_PORT: {}", e)))?,
            },
        })
    }
}

/// Ensure a trigger key prefix ends with a path separator
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}
