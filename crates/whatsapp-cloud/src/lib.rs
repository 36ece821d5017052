//! WhatsApp Cloud API client library.
//!
//! This crate covers the parts of the Cloud API a chat bot needs:
//!
//! - Sending text, reply-button, list, image, and video messages
//! - Parsing inbound webhook notifications into [`InboundEvent`]s
//! - Verifying the subscription handshake and `X-Hub-Signature-256`
//!
//! # Example
//!
//! ```no_run
//! use whatsapp_cloud::{CloudClient, CloudConfig, ReplyButton};
//!
//! # async fn example() -> Result<(), whatsapp_cloud::CloudError> {
//! let config = CloudConfig::new("1234567890", "access-token", "verify-token");
//! let client = CloudClient::new(config)?;
//!
//! client.send_text("255700000001", "Karibu!").await?;
//! client
//!     .send_buttons(
//!         "255700000001",
//!         Some("Comedian Bora wa Mwezi"),
//!         "Bonyeza kuanza",
//!         vec![ReplyButton::new("start_voting", "Anza")],
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod signature;
pub mod types;

pub use client::CloudClient;
pub use config::CloudConfig;
pub use error::CloudError;
pub use types::*;
