//! Error types for payment-gateway.

use thiserror::Error;

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed (network, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON we expect.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The gateway answered with a non-200 application code.
    #[error("Gateway rejected request: {message}")]
    Rejected { message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
