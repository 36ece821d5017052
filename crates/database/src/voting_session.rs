//! Voting session (contest window) operations.

use sqlx::SqlitePool;

use crate::models::VotingSession;
use crate::validation::validate_name;
use crate::{DatabaseError, Result};

/// Create an active voting session.
///
/// Dates are SQLite UTC timestamps (`YYYY-MM-DD HH:MM:SS`).
pub async fn create_session(
    pool: &SqlitePool,
    name: &str,
    start_date: &str,
    end_date: &str,
    winner_announcement_date: &str,
) -> Result<VotingSession> {
    validate_name("name", name)?;

    let session = sqlx::query_as::<_, VotingSession>(
        r#"
        INSERT INTO voting_sessions (name, start_date, end_date, winner_announcement_date)
        VALUES (?, ?, ?, ?)
        RETURNING id, name, is_active, start_date, end_date, winner_announcement_date, created_at
        "#,
    )
    .bind(name.trim())
    .bind(start_date)
    .bind(end_date)
    .bind(winner_announcement_date)
    .fetch_one(pool)
    .await?;

    tracing::info!(session_id = session.id, name = %session.name, "Created voting session");
    Ok(session)
}

/// Create an active session starting now, ending after `days`, with winners
/// announced after `announce_days`.
pub async fn create_session_from_now(
    pool: &SqlitePool,
    name: &str,
    days: i64,
    announce_days: i64,
) -> Result<VotingSession> {
    validate_name("name", name)?;

    let session = sqlx::query_as::<_, VotingSession>(
        r#"
        INSERT INTO voting_sessions (name, start_date, end_date, winner_announcement_date)
        VALUES (?, datetime('now'), datetime('now', ?), datetime('now', ?))
        RETURNING id, name, is_active, start_date, end_date, winner_announcement_date, created_at
        "#,
    )
    .bind(name.trim())
    .bind(format!("+{} days", days))
    .bind(format!("+{} days", announce_days))
    .fetch_one(pool)
    .await?;

    Ok(session)
}

/// Get a voting session by ID.
pub async fn get_session(pool: &SqlitePool, id: i64) -> Result<VotingSession> {
    sqlx::query_as::<_, VotingSession>(
        r#"
        SELECT id, name, is_active, start_date, end_date, winner_announcement_date, created_at
        FROM voting_sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("VotingSession", id))
}

/// The current contest: the most recently created active session.
pub async fn current_active(pool: &SqlitePool) -> Result<Option<VotingSession>> {
    let session = sqlx::query_as::<_, VotingSession>(
        r#"
        SELECT id, name, is_active, start_date, end_date, winner_announcement_date, created_at
        FROM voting_sessions
        WHERE is_active = 1
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// List all sessions, newest first.
pub async fn list_sessions(pool: &SqlitePool) -> Result<Vec<VotingSession>> {
    let sessions = sqlx::query_as::<_, VotingSession>(
        r#"
        SELECT id, name, is_active, start_date, end_date, winner_announcement_date, created_at
        FROM voting_sessions
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(sessions)
}

/// Flip the active flag.
pub async fn toggle_session(pool: &SqlitePool, id: i64) -> Result<VotingSession> {
    sqlx::query_as::<_, VotingSession>(
        r#"
        UPDATE voting_sessions
        SET is_active = NOT is_active
        WHERE id = ?
        RETURNING id, name, is_active, start_date, end_date, winner_announcement_date, created_at
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("VotingSession", id))
}
