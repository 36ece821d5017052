//! Vote operations.
//!
//! A vote is written provisionally (quantity 1, placeholder amount, unpaid)
//! as soon as a comedian is picked, then updated in place. Marking a vote
//! paid only happens inside [`crate::lifecycle`] transactions.

use sqlx::SqlitePool;

use crate::models::{ComedianTally, Vote};
use crate::{DatabaseError, Result};

const VOTE_COLUMNS: &str = "id, comedian_id, voting_session_id, phone_number, quantity, amount, \
     is_paid, is_free_vote, ad_id, created_at";

/// Create a provisional vote for a comedian in a voting session.
pub async fn create_provisional(
    pool: &SqlitePool,
    comedian_id: i64,
    voting_session_id: i64,
    phone_number: &str,
    placeholder_amount: i64,
) -> Result<Vote> {
    let vote = sqlx::query_as::<_, Vote>(&format!(
        r#"
        INSERT INTO votes (comedian_id, voting_session_id, phone_number, quantity, amount)
        VALUES (?, ?, ?, 1, ?)
        RETURNING {VOTE_COLUMNS}
        "#
    ))
    .bind(comedian_id)
    .bind(voting_session_id)
    .bind(phone_number)
    .bind(placeholder_amount)
    .fetch_one(pool)
    .await?;

    tracing::debug!(vote_id = vote.id, phone = %phone_number, "Created provisional vote");
    Ok(vote)
}

/// Get a vote by ID.
pub async fn get_vote(pool: &SqlitePool, id: i64) -> Result<Vote> {
    sqlx::query_as::<_, Vote>(&format!("SELECT {VOTE_COLUMNS} FROM votes WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Vote", id))
}

/// Set the chosen quantity and price on an unpaid vote.
///
/// Returns `NotFound` if the vote is gone or already paid.
pub async fn set_quantity(pool: &SqlitePool, id: i64, quantity: i64, amount: i64) -> Result<Vote> {
    sqlx::query_as::<_, Vote>(&format!(
        r#"
        UPDATE votes
        SET quantity = ?, amount = ?
        WHERE id = ? AND is_paid = 0
        RETURNING {VOTE_COLUMNS}
        "#
    ))
    .bind(quantity)
    .bind(amount)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Vote", id))
}

/// Whether the phone has an unpaid vote that is still part of a live flow:
/// either no payment yet, or a payment still awaiting the gateway.
pub async fn has_open_unpaid(pool: &SqlitePool, phone_number: &str) -> Result<bool> {
    let (exists,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM votes v
            LEFT JOIN payments p ON p.vote_id = v.id
            WHERE v.phone_number = ?
              AND v.is_paid = 0
              AND (p.id IS NULL OR p.status IN ('pending', 'initiated'))
        )
        "#,
    )
    .bind(phone_number)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// List the most recent votes, newest first.
pub async fn list_votes(pool: &SqlitePool, limit: i64) -> Result<Vec<Vote>> {
    let votes = sqlx::query_as::<_, Vote>(&format!(
        "SELECT {VOTE_COLUMNS} FROM votes ORDER BY created_at DESC, id DESC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(votes)
}

/// Paid-vote totals per comedian for one voting session, highest first.
///
/// Comedians without paid votes in the session are included with zeros.
pub async fn tally_for_session(
    pool: &SqlitePool,
    voting_session_id: i64,
) -> Result<Vec<ComedianTally>> {
    let tallies = sqlx::query_as::<_, ComedianTally>(
        r#"
        SELECT
            c.id AS comedian_id,
            c.name AS name,
            COALESCE(SUM(v.quantity), 0) AS total_votes,
            COALESCE(SUM(v.amount), 0) AS total_amount,
            COUNT(v.id) AS vote_count
        FROM comedians c
        LEFT JOIN votes v
            ON v.comedian_id = c.id
           AND v.voting_session_id = ?
           AND v.is_paid = 1
        GROUP BY c.id, c.name
        ORDER BY total_votes DESC, c.name
        "#,
    )
    .bind(voting_session_id)
    .fetch_all(pool)
    .await?;

    Ok(tallies)
}

/// Dashboard totals over paid votes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct VoteTotals {
    /// Number of paid vote rows.
    pub votes: i64,
    /// Sum of purchased vote quantities.
    pub quantity: i64,
    /// Sum of amounts in TZS.
    pub amount: i64,
    /// Paid votes that came from the free tier.
    pub free_votes: i64,
}

/// Sum paid votes across all sessions.
pub async fn totals(pool: &SqlitePool) -> Result<VoteTotals> {
    let (votes, quantity, amount, free_votes) = sqlx::query_as::<_, (i64, i64, i64, i64)>(
        r#"
        SELECT
            COUNT(*),
            COALESCE(SUM(quantity), 0),
            COALESCE(SUM(amount), 0),
            COALESCE(SUM(is_free_vote), 0)
        FROM votes
        WHERE is_paid = 1
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(VoteTotals {
        votes,
        quantity,
        amount,
        free_votes,
    })
}
