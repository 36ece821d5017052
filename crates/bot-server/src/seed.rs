//! Default data for a fresh database.

use database::{comedian, voting_session, Database};
use tracing::info;

use crate::routes::sessions::{DEFAULT_ANNOUNCE_DAYS, DEFAULT_SESSION_DAYS};

/// Comedians created when seeding.
pub const DEFAULT_COMEDIANS: [&str; 5] = ["Eliud", "Nanga", "Brother K", "Ndaro", "Steve Mweusi"];

const DEFAULT_SESSION_NAME: &str = "Comedian Bora wa Mwezi";

/// Create the default comedians and an active voting session if absent.
pub async fn seed_defaults(db: &Database) -> database::Result<()> {
    let pool = db.pool();

    for name in DEFAULT_COMEDIANS {
        if comedian::find_by_name(pool, name).await?.is_none() {
            comedian::create_comedian(pool, name, None).await?;
        }
    }

    if voting_session::current_active(pool).await?.is_none() {
        voting_session::create_session_from_now(
            pool,
            DEFAULT_SESSION_NAME,
            DEFAULT_SESSION_DAYS,
            DEFAULT_ANNOUNCE_DAYS,
        )
        .await?;
    }

    info!("Seed data in place");
    Ok(())
}
