//! WhatsApp Cloud API HTTP client.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::config::CloudConfig;
use crate::error::CloudError;
use crate::types::{ApiErrorResponse, ListSection, OutgoingMessage, ReplyButton, SendResponse};

/// Client for sending messages through the WhatsApp Cloud API.
#[derive(Clone)]
pub struct CloudClient {
    http: Client,
    config: CloudConfig,
}

impl CloudClient {
    /// Request timeout for sends.
    const TIMEOUT: Duration = Duration::from_secs(10);

    /// Build a client. No request is made until the first send.
    pub fn new(config: CloudConfig) -> Result<Self, CloudError> {
        if config.phone_number_id.is_empty() {
            return Err(CloudError::Config("phone_number_id is empty".to_string()));
        }
        if config.access_token.is_empty() {
            return Err(CloudError::Config("access_token is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(Self::TIMEOUT)
            .build()
            .map_err(CloudError::Http)?;

        Ok(Self { http, config })
    }

    /// Send any outgoing message.
    pub async fn send(&self, message: &OutgoingMessage) -> Result<SendResponse, CloudError> {
        let url = self.config.messages_url();
        debug!(to = %message.to, kind = message.kind(), "Sending WhatsApp message");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .json(message)
            .send()
            .await
            .map_err(CloudError::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(CloudError::Http)?;

        if !status.is_success() {
            let err = parse_api_error(status.as_u16(), &body);
            warn!(to = %message.to, error = %err, "WhatsApp send rejected");
            return Err(err);
        }

        parse_send_response(&body)
    }

    /// Send a text message.
    pub async fn send_text(&self, to: &str, body: &str) -> Result<SendResponse, CloudError> {
        self.send(&OutgoingMessage::text(to, body)).await
    }

    /// Send a message with reply buttons.
    pub async fn send_buttons(
        &self,
        to: &str,
        header: Option<&str>,
        body: &str,
        buttons: Vec<ReplyButton>,
    ) -> Result<SendResponse, CloudError> {
        self.send(&OutgoingMessage::buttons(to, header, body, buttons))
            .await
    }

    /// Send a list message.
    pub async fn send_list(
        &self,
        to: &str,
        header: Option<&str>,
        body: &str,
        button: &str,
        sections: Vec<ListSection>,
    ) -> Result<SendResponse, CloudError> {
        self.send(&OutgoingMessage::list(to, header, body, button, sections))
            .await
    }

    /// Send an image by URL.
    pub async fn send_image(
        &self,
        to: &str,
        link: &str,
        caption: Option<&str>,
    ) -> Result<SendResponse, CloudError> {
        self.send(&OutgoingMessage::image(to, link, caption)).await
    }

    /// Send a video by URL.
    pub async fn send_video(
        &self,
        to: &str,
        link: &str,
        caption: Option<&str>,
    ) -> Result<SendResponse, CloudError> {
        self.send(&OutgoingMessage::video(to, link, caption)).await
    }

    /// Get the configuration.
    pub fn config(&self) -> &CloudConfig {
        &self.config
    }
}

/// Parse the body of a successful send.
pub fn parse_send_response(body: &str) -> Result<SendResponse, CloudError> {
    Ok(serde_json::from_str(body)?)
}

/// Turn a non-2xx response into an error, using the Graph API error message
/// when the body carries one.
pub fn parse_api_error(status: u16, body: &str) -> CloudError {
    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.is_empty() {
                "Unknown API error".to_string()
            } else {
                body.chars().take(200).collect()
            }
        });

    CloudError::Api { status, message }
}

impl std::fmt::Debug for CloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudClient")
            .field("config", &self.config)
            .finish()
    }
}
