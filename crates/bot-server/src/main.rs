//! HTTP server for the Chekabot WhatsApp voting bot.
//!
//! Receives WhatsApp webhooks and payment gateway callbacks, runs the
//! scheduled payment checks, and serves the admin JSON API.

mod config;
mod error;
mod routes;
mod seed;
mod state;

use std::sync::Arc;

use database::Database;
use payment_gateway::{GatewayClient, GatewayConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;
use voting_bot::{BotConfig, Dispatcher, Messenger, PaymentCheckWorker, PaymentProvider};
use whatsapp_cloud::{CloudClient, CloudConfig};

use crate::config::Config;
use crate::state::{AppState, WebhookSecrets};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let bot_config = BotConfig::from_env()?;
    let cloud_config = CloudConfig::from_env()?;
    let gateway_config = GatewayConfig::from_env()?;
    info!(addr = %config.addr, "Starting bot server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    if config.seed_data {
        seed::seed_defaults(&db).await?;
    }

    let webhook = WebhookSecrets {
        verify_token: cloud_config.verify_token.clone(),
        app_secret: cloud_config.app_secret.clone(),
    };

    // Build adapters
    let messenger: Arc<dyn Messenger> = Arc::new(CloudClient::new(cloud_config)?);
    let payments: Arc<dyn PaymentProvider> = Arc::new(GatewayClient::new(gateway_config)?);
    let dispatcher = Arc::new(Dispatcher::new(db.clone(), messenger, payments, bot_config));

    // Scheduled payment checks
    PaymentCheckWorker::new(dispatcher.clone()).spawn();

    // Build application state
    let state = AppState::new(db, dispatcher, webhook, config.admin_token.clone());
    let app = routes::router(state);

    // Start server
    info!(addr = %config.addr, "Bot server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
