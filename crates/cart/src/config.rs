//! Cart engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AXLE_CART_API_URL` - Base URL of the cart REST service
//!
//! ## Optional
//! - `AXLE_CART_STORAGE_PATH` - Guest cart file (default: axle_cart.json)
//! - `AXLE_CART_DEBOUNCE_MS` - Local write debounce in ms (default: 100)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default debounce window for guest-cart writes.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

const DEFAULT_STORAGE_PATH: &str = "axle_cart.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart engine configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Base URL of the cart REST service.
    pub api_base_url: Url,
    /// Path of the guest cart file.
    pub storage_path: PathBuf,
    /// Debounce window for guest-cart writes.
    pub debounce: Duration,
}

impl CartConfig {
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

        let api_base_url = get_required_env("AXLE_CART_API_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("AXLE_CART_API_URL".to_owned(), e.to_string())
            })?;

        let storage_path =
            PathBuf::from(get_env_or_default("AXLE_CART_STORAGE_PATH", DEFAULT_STORAGE_PATH));

        let debounce_ms = get_env_or_default(
            "AXLE_CART_DEBOUNCE_MS",
            &DEFAULT_DEBOUNCE.as_millis().to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("AXLE_CART_DEBOUNCE_MS".to_owned(), e.to_string())
        })?;

        Ok(Self {
            api_base_url,
            storage_path,
            debounce: Duration::from_millis(debounce_ms),
        })
    }
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("AXLE_CART_API_URL".to_owned());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: AXLE_CART_API_URL"
        );
    }

    #[test]
    fn test_default_debounce_is_short() {
        assert_eq!(DEFAULT_DEBOUNCE, Duration::from_millis(100));
    }
}
