//! Cart service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AXLE_API_DATABASE_URL` - MySQL connection string (falls back to
//!   `DATABASE_URL`)
//!
//! ## Optional
//! - `AXLE_API_HOST` - Bind address (default: 127.0.0.1)
//! - `AXLE_API_PORT` - Listen port (default: 4000)
//! - `AXLE_API_ALLOWED_ORIGIN` - Exact CORS origin for the storefront app;
//!   when unset, any origin is allowed (development mode)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart service configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// MySQL database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Exact allowed CORS origin; `None` allows any origin
    pub allowed_origin: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("AXLE_API_DATABASE_URL")?;
        let host = get_env_or_default("AXLE_API_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("AXLE_API_HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("AXLE_API_PORT", "4000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("AXLE_API_PORT".to_owned(), e.to_string()))?;
        let allowed_origin = get_optional_env("AXLE_API_ALLOWED_ORIGIN");
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            allowed_origin,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig {
            database_url: SecretString::from("mysql://localhost/axle"),
            host: "127.0.0.1".parse().unwrap(),
            port: 4000,
            allowed_origin: None,
            sentry_dsn: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 4000);
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidEnvVar("AXLE_API_PORT".to_owned(), "not a number".to_owned());
        assert_eq!(
            err.to_string(),
            "Invalid environment variable AXLE_API_PORT: not a number"
        );
    }
}
