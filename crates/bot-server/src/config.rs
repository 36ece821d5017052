//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// Server configuration. Adapter settings (`WHATSAPP_*`, `PAYMENT_*`, bot
/// tunables) are loaded by their own crates.
#[derive(Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Bearer token required on `/api/*`. Open when unset.
    pub admin_token: Option<String>,
    /// Create default comedians and a voting session on start.
    pub seed_data: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `SERVER_ADDR` | Server bind address | `127.0.0.1:8000` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:chekabot.db?mode=rwc` |
    /// | `ADMIN_TOKEN` | Admin API bearer token | (unset) |
    /// | `SEED_DATA` | Seed default data | `false` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("SERVER_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:chekabot.db?mode=rwc".to_string());

        let admin_token = env::var("ADMIN_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        let seed_data = env::var("SEED_DATA")
            .map(|v| voting_bot::config::parse_flag(&v))
            .unwrap_or(false);

        Ok(Self {
            addr,
            database_url,
            admin_token,
            seed_data,
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("database_url", &self.database_url)
            .field("admin_token", &self.admin_token.as_ref().map(|_| "[REDACTED]"))
            .field("seed_data", &self.seed_data)
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid SERVER_ADDR format")]
    InvalidAddr,
}
