//! Conversation engine for the Chekabot comedian voting bot.
//!
//! This crate provides the [`Dispatcher`], which turns inbound WhatsApp
//! events into votes, payments, raffle tickets, and replies, and the
//! [`PaymentCheckWorker`], which settles payments the gateway has not
//! reported on yet.
//!
//! # Features
//!
//! - One free sponsored vote per user, shown together with an ad
//! - Paid tiers charged through mobile money with a user-supplied number
//! - Raffle tickets issued exactly once per confirmed vote
//! - `#` abandons any flow; `status` re-checks the latest open payment
//! - Durable scheduled checks that survive restarts
//!
//! # Architecture
//!
//! ```text
//! WhatsApp webhook / gateway callback (bot-server)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       DISPATCHER                            │
//! │                                                             │
//! │  1. Ensure the user exists                                  │
//! │         ↓                                                   │
//! │  2. Parse the event into a Command                          │
//! │         ↓                                                   │
//! │  3. Apply it to the phone's session:                        │
//! │     • comedian  → provisional vote, tier list               │
//! │     • free tier → ad + tickets                              │
//! │     • paid tier → ask number → initiate charge              │
//! │         ↓                                                   │
//! │  4. Reply through the Messenger                             │
//! └─────────────────────────────────────────────────────────────┘
//!          ↑
//! PaymentCheckWorker ── resolve_payment ── PaymentProvider
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use voting_bot::{BotConfig, Dispatcher, PaymentCheckWorker};
//!
//! let dispatcher = Arc::new(Dispatcher::new(
//!     database,
//!     Arc::new(cloud_client),
//!     Arc::new(gateway_client),
//!     BotConfig::from_env()?,
//! ));
//! PaymentCheckWorker::new(dispatcher.clone()).spawn();
//!
//! dispatcher.handle_payload(&payload).await?;
//! ```

pub mod catalog;
pub mod command;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod menu;
pub mod messenger;
pub mod mock;
pub mod session;
pub mod tickets;
pub mod worker;

pub use catalog::{ComedianRef, Tier, TIERS};
pub use command::Command;
pub use config::BotConfig;
pub use dispatcher::{CheckTrigger, Dispatcher, Resolution};
pub use error::{BotError, Result};
pub use gateway::PaymentProvider;
pub use messenger::Messenger;
pub use mock::{RecordingMessenger, ScriptedGateway};
pub use session::{SessionEntry, SessionManager, SessionStore, Step};
pub use worker::PaymentCheckWorker;
