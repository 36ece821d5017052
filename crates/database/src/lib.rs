//! SQLite persistence layer for Chekabot.
//!
//! This crate provides async database operations for users, comedians,
//! votes, payments, and raffle tickets using SQLx with SQLite. Multi-row
//! state transitions (payment completion, flow cleanup) live in
//! [`lifecycle`] and run inside a single transaction each.
//!
//! # Example
//!
//! ```no_run
//! use database::{comedian, user, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:chekabot.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let (user, created) = user::get_or_create(db.pool(), "255700000001").await?;
//!     println!("user {} (new: {})", user.id, created);
//!
//!     for c in comedian::list_active(db.pool()).await? {
//!         println!("{}", c.name);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod ad;
pub mod comedian;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod payment;
pub mod payment_check;
pub mod ticket;
pub mod user;
pub mod validation;
pub mod video;
pub mod vote;
pub mod voting_session;

pub use error::{DatabaseError, Result};
pub use models::{
    Ad, Comedian, ComedianTally, Payment, PaymentCheck, PaymentStatus, Ticket, User, Vote,
    VotingSession, WelcomeVideo,
};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/chekabot.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) async fn test_db() -> Database {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = test_db().await;
        db.migrate().await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM payment_checks")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_foreign_keys_enforced() {
        let db = test_db().await;

        let result = sqlx::query(
            "INSERT INTO votes (comedian_id, voting_session_id, phone_number, quantity, amount) VALUES (999, 999, '255700000001', 1, 0)",
        )
        .execute(db.pool())
        .await;

        assert!(result.is_err());
    }
}
