//! Server configuration loaded from environment variables.
//!
//! - `HOST` (default `0.0.0.0`)
//! - `PORT` (default `3000`)
//! - `CORS_ORIGINS`: comma separated origins, `*` for any (default `*`)
//! - `AUDIT_LOG_PATH`: when set, prediction audit records are appended to this
//!   JSON-lines file instead of being kept in memory
//! - `STATUS_LOG_PATH`: when set, status checks are persisted to this JSON-lines
//!   file and reloaded on start
//! - `RUST_LOG`: tracing filter directives (default `info`)

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("PORT must be a valid port number, got '{0}'")]
    InvalidPort(String),
    #[error("{0} is not a valid listen address")]
    InvalidAddress(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl CorsOrigins {
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            CorsOrigins::Any
        } else {
            CorsOrigins::List(origins)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: CorsOrigins,
    pub audit_log_path: Option<PathBuf>,
    pub status_log_path: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: CorsOrigins::Any,
            audit_log_path: None,
            status_log_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let host = lookup("HOST").unwrap_or(defaults.host);
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => defaults.port,
        };
        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| CorsOrigins::parse(&raw))
            .unwrap_or(defaults.cors_origins);
        let audit_log_path = optional_path(lookup("AUDIT_LOG_PATH"));
        let status_log_path = optional_path(lookup("STATUS_LOG_PATH"));
        let log_filter = lookup("RUST_LOG")
            .filter(|f| !f.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        Ok(Self { host, port, cors_origins, audit_log_path, status_log_path, log_filter })
    }

    /// Tracing filter from `RUST_LOG` directives, `info` when they do not parse.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.log_filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidAddress(addr))
    }
}

fn optional_path(raw: Option<String>) -> Option<PathBuf> {
    raw.filter(|p| !p.trim().is_empty()).map(PathBuf::from)
}
