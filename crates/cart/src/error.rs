//! Error types for the cart persistence boundary.
//!
//! These errors are produced by the local store and the remote cart client.
//! The engine itself never propagates them to consumers: background sync
//! failures are logged and swallowed, and a corrupted local cart is treated
//! as empty. The type exists so the stores have an honest `Result` surface
//! and so tests can assert on failure shapes.

use thiserror::Error;

/// Errors that can occur while persisting or loading a cart.
#[derive(Debug, Error)]
pub enum CartSyncError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The cart service answered with a non-2xx status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Persisted cart data could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Local store I/O failed.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = CartSyncError::Api {
            status: 503,
            message: "upstream unavailable".to_owned(),
        };
        assert_eq!(err.to_string(), "API error: 503 - upstream unavailable");
    }

    #[test]
    fn test_storage_error_wraps_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CartSyncError::from(io);
        assert!(matches!(err, CartSyncError::Storage(_)));
    }
}
