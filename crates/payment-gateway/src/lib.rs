//! Mobile-money payment gateway client.
//!
//! All calls go to one JSON endpoint; the request `code` selects between
//! initiating a charge and checking its status. Gateway status strings are
//! mapped onto [`GatewayStatus`].
//!
//! # Example
//!
//! ```no_run
//! use payment_gateway::{GatewayClient, GatewayConfig, GatewayStatus};
//!
//! # async fn example() -> payment_gateway::Result<()> {
//! let client = GatewayClient::new(GatewayConfig::new("api-key"))?;
//!
//! let charge = client.initiate("255712345678", 2000, None).await?;
//! let report = client
//!     .check_status(&charge.transaction_id, charge.reference.as_deref())
//!     .await?;
//! if report.status == GatewayStatus::Paid {
//!     println!("paid");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::GatewayClient;
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use types::{callback_order_id, GatewayStatus, Initiation, StatusReport};
