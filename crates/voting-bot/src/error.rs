//! Error types for the voting bot.

use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while handling a conversation event.
#[derive(Debug, Error)]
pub enum BotError {
    /// Persistence failed.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Message sending failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Payment gateway call failed.
    #[error("payment gateway error: {0}")]
    Gateway(String),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;
