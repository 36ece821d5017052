//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;
use voting_bot::Dispatcher;

/// Secrets used to authenticate webhook traffic.
#[derive(Clone, Default)]
pub struct WebhookSecrets {
    /// Token echoed during the subscription handshake.
    pub verify_token: String,
    /// App secret for `X-Hub-Signature-256`; signatures are not checked when unset.
    pub app_secret: Option<String>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Conversation dispatcher.
    pub dispatcher: Arc<Dispatcher>,
    pub webhook: WebhookSecrets,
    /// Bearer token for `/api/*`, if required.
    pub admin_token: Option<String>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        db: Database,
        dispatcher: Arc<Dispatcher>,
        webhook: WebhookSecrets,
        admin_token: Option<String>,
    ) -> Self {
        Self {
            db,
            dispatcher,
            webhook,
            admin_token,
        }
    }
}
