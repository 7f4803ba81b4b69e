//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use serde::Deserialize;
use std::net::Ipv4Addr;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Fallback signing key used when JWT_SECRET is unset.
/// Insecure by definition; deployments must override it.
const DEFAULT_JWT_SECRET: &str = "roster-dev-secret-key-change-in-production";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0),
            port: 3000,
        }
    }
}

/// Token signing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_JWT_SECRET.to_string(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3001".to_string()],
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// Unset variables fall back to defaults; set-but-unparseable ones
    /// are a startup failure rather than a silent default.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let server = ServerConfig {
            host: parse_host(std::env::var("HOST").ok())?,
            port: parse_port(std::env::var("PORT").ok())?,
        };

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| {
                warn!("JWT_SECRET not set, using default (INSECURE - set in production!)");
                DEFAULT_JWT_SECRET.to_string()
            }),
        };

        let cors = CorsConfig {
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        Ok(Self { server, jwt, cors })
    }
}

fn parse_host(value: Option<String>) -> Result<Ipv4Addr, ConfigError> {
    match value {
        Some(raw) => raw.parse().map_err(|_| {
            ConfigError::InvalidValue(format!("HOST must be an IPv4 address, got '{}'", raw))
        }),
        None => Ok(ServerConfig::default().host),
    }
}

fn parse_port(value: Option<String>) -> Result<u16, ConfigError> {
    match value {
        Some(raw) => raw.parse().map_err(|_| {
            ConfigError::InvalidValue(format!("PORT must be a port number, got '{}'", raw))
        }),
        None => Ok(ServerConfig::default().port),
    }
}
