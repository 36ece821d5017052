//! Configuration for the payment gateway client.

use std::env;
use std::time::Duration;

use crate::error::GatewayError;

/// Default gateway endpoint.
pub const DEFAULT_API_URL: &str = "https://swahiliesapi.invict.site/Api";

/// API identifier sent with every request.
pub const DEFAULT_API_ID: u32 = 170;

/// Request timeout for gateway calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the payment gateway.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Single endpoint for all calls; the request `code` selects the operation.
    pub api_url: String,
    /// API key sent in the request body.
    pub api_key: String,
    /// Callback URL the gateway notifies after a charge.
    pub webhook_url: Option<String>,
    /// Whether charges are real (`is_live`).
    pub is_live: bool,
    /// API identifier (`api` field).
    pub api_id: u32,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Create a live configuration against the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            webhook_url: None,
            is_live: true,
            api_id: DEFAULT_API_ID,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a different endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set the callback URL passed on initiation.
    pub fn with_webhook_url(mut self, webhook_url: impl Into<String>) -> Self {
        self.webhook_url = Some(webhook_url.into());
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `PAYMENT_API_KEY`
    ///
    /// Optional:
    /// - `PAYMENT_API_URL` (default: the public gateway endpoint)
    /// - `PAYMENT_WEBHOOK_URL`
    /// - `PAYMENT_LIVE` (default: true)
    pub fn from_env() -> Result<Self, GatewayError> {
        let api_key = env::var("PAYMENT_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| GatewayError::Config("PAYMENT_API_KEY not set".to_string()))?;

        let mut config = Self::new(api_key);

        if let Ok(url) = env::var("PAYMENT_API_URL") {
            config.api_url = url;
        }
        config.webhook_url = env::var("PAYMENT_WEBHOOK_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        config.is_live = env::var("PAYMENT_LIVE")
            .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        Ok(config)
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("webhook_url", &self.webhook_url)
            .field("is_live", &self.is_live)
            .field("api_id", &self.api_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}
