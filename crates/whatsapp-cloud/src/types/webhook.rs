//! Inbound webhook payload types.

use serde::{Deserialize, Serialize};

/// Query string of the subscription handshake (`GET /webhook`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookVerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

impl WebhookVerifyQuery {
    /// The challenge to echo back, if this is a `subscribe` request carrying
    /// the expected token.
    pub fn challenge_for(&self, expected_token: &str) -> Option<&str> {
        let mode = self.mode.as_deref()?;
        let token = self.verify_token.as_deref()?;

        if mode == "subscribe" && !expected_token.is_empty() && token == expected_token {
            Some(self.challenge.as_deref().unwrap_or_default())
        } else {
            None
        }
    }
}

/// Top-level notification body (`POST /webhook`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: WebhookValue,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub messaging_product: Option<String>,
    #[serde(default)]
    pub contacts: Vec<WebhookContact>,
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
    #[serde(default)]
    pub statuses: Vec<WebhookStatus>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookContact {
    pub wa_id: String,
    #[serde(default)]
    pub profile: Option<WebhookProfile>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookProfile {
    #[serde(default)]
    pub name: String,
}

/// One inbound message.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookMessage {
    #[serde(default)]
    pub id: String,
    pub from: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub text: Option<WebhookText>,
    #[serde(default)]
    pub interactive: Option<WebhookInteractive>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookText {
    pub body: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookInteractive {
    #[serde(rename = "type")]
    pub interactive_type: String,
    #[serde(default)]
    pub button_reply: Option<ReplyPayload>,
    #[serde(default)]
    pub list_reply: Option<ReplyPayload>,
}

/// Id and title of a tapped button or picked list row.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplyPayload {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Delivery status update for a message we sent.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookStatus {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub recipient_id: String,
}

/// An inbound user event the bot can act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Sender phone number as reported by the provider.
    pub from: String,
    pub message_id: String,
    pub kind: InboundKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    /// Free text.
    Text(String),
    /// A reply button was tapped.
    ButtonReply { id: String, title: String },
    /// A list row was picked.
    ListReply { id: String, title: String },
    /// Any other message type (image, audio, location, ...).
    Unsupported(String),
}

impl WebhookMessage {
    /// Classify this message.
    pub fn to_event(&self) -> InboundEvent {
        let kind = match self.message_type.as_str() {
            "text" => match &self.text {
                Some(text) => InboundKind::Text(text.body.clone()),
                None => InboundKind::Unsupported("text".to_string()),
            },
            "interactive" => match &self.interactive {
                Some(WebhookInteractive {
                    button_reply: Some(reply),
                    ..
                }) => InboundKind::ButtonReply {
                    id: reply.id.clone(),
                    title: reply.title.clone(),
                },
                Some(WebhookInteractive {
                    list_reply: Some(reply),
                    ..
                }) => InboundKind::ListReply {
                    id: reply.id.clone(),
                    title: reply.title.clone(),
                },
                Some(other) => InboundKind::Unsupported(other.interactive_type.clone()),
                None => InboundKind::Unsupported("interactive".to_string()),
            },
            other => InboundKind::Unsupported(other.to_string()),
        };

        InboundEvent {
            from: self.from.clone(),
            message_id: self.id.clone(),
            kind,
        }
    }
}

impl WebhookPayload {
    /// All inbound messages across entries and changes, in delivery order.
    /// Status-only notifications yield nothing.
    pub fn events(&self) -> Vec<InboundEvent> {
        self.entry
            .iter()
            .flat_map(|entry| entry.changes.iter())
            .flat_map(|change| change.value.messages.iter())
            .map(WebhookMessage::to_event)
            .collect()
    }

    /// Number of delivery status updates carried.
    pub fn status_count(&self) -> usize {
        self.entry
            .iter()
            .flat_map(|entry| entry.changes.iter())
            .map(|change| change.value.statuses.len())
            .sum()
    }
}
