//! Outbound messaging trait and implementations.

use async_trait::async_trait;
use whatsapp_cloud::{CloudClient, OutgoingMessage};

use crate::error::BotError;

/// Trait for delivering outbound messages.
///
/// Abstracted to support different transports (WhatsApp Cloud, tests, etc.)
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send one message.
    async fn send(&self, message: &OutgoingMessage) -> Result<(), BotError>;
}

#[async_trait]
impl Messenger for CloudClient {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), BotError> {
        CloudClient::send(self, message)
            .await
            .map(|_| ())
            .map_err(|e| BotError::SendFailed(e.to_string()))
    }
}
