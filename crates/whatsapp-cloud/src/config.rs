//! Configuration types for whatsapp-cloud.

use std::env;

use crate::error::CloudError;

/// Default Graph API host.
pub const DEFAULT_API_BASE: &str = "https://graph.facebook.com";

/// Default Graph API version.
pub const DEFAULT_API_VERSION: &str = "v18.0";

/// Configuration for the WhatsApp Cloud API.
#[derive(Clone)]
pub struct CloudConfig {
    /// Graph API host (e.g., "https://graph.facebook.com").
    pub api_base: String,
    /// Graph API version segment (e.g., "v18.0").
    pub api_version: String,
    /// Sender phone-number id assigned by Meta.
    pub phone_number_id: String,
    /// Bearer token used for sends.
    pub access_token: String,
    /// Token Meta echoes back during webhook subscription.
    pub verify_token: String,
    /// App secret for `X-Hub-Signature-256`. Signatures are not checked when unset.
    pub app_secret: Option<String>,
}

impl CloudConfig {
    /// Create a configuration against the default Graph API host and version.
    pub fn new(
        phone_number_id: impl Into<String>,
        access_token: impl Into<String>,
        verify_token: impl Into<String>,
    ) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            phone_number_id: phone_number_id.into(),
            access_token: access_token.into(),
            verify_token: verify_token.into(),
            app_secret: None,
        }
    }

    /// Point the client at a different host (e.g., a local stub).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Enable webhook signature verification.
    pub fn with_app_secret(mut self, app_secret: impl Into<String>) -> Self {
        self.app_secret = Some(app_secret.into());
        self
    }

    /// Load configuration from `WHATSAPP_*` environment variables.
    pub fn from_env() -> Result<Self, CloudError> {
        let required = |key: &str| {
            env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| CloudError::Config(format!("{} must be set", key)))
        };

        let mut config = Self::new(
            required("WHATSAPP_PHONE_NUMBER_ID")?,
            required("WHATSAPP_ACCESS_TOKEN")?,
            required("WHATSAPP_VERIFY_TOKEN")?,
        );

        if let Ok(base) = env::var("WHATSAPP_API_BASE") {
            config = config.with_api_base(base);
        }
        if let Ok(version) = env::var("WHATSAPP_API_VERSION") {
            config.api_version = version;
        }
        config.app_secret = env::var("WHATSAPP_APP_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Ok(config)
    }

    /// Get the message-send endpoint URL.
    pub fn messages_url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.api_base, self.api_version, self.phone_number_id
        )
    }
}

impl std::fmt::Debug for CloudConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudConfig")
            .field("api_base", &self.api_base)
            .field("api_version", &self.api_version)
            .field("phone_number_id", &self.phone_number_id)
            .field("access_token", &"<redacted>")
            .field("verify_token", &"<redacted>")
            .field("app_secret", &self.app_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
