//! Transactional vote/payment/ticket transitions.
//!
//! Every function here commits all of its row writes together or none of
//! them. Transitions out of a payment are guarded on the payment still being
//! `pending` or `initiated`, so a second webhook delivery or a late status
//! check that loses the race simply observes `None` / `false`.

use sqlx::{SqliteConnection, SqlitePool};

use crate::models::PaymentStatus;
use crate::{ticket, DatabaseError, Result};

/// Redeem the one free vote a phone number is entitled to.
///
/// Marks the vote paid and free, records the ad shown, flips the user's
/// `has_used_free_vote`, and issues tickets. Returns `None` without writing
/// anything if the user already used the free vote or the vote is no longer
/// an unpaid vote of that phone.
pub async fn redeem_free_vote<F>(
    pool: &SqlitePool,
    vote_id: i64,
    phone_number: &str,
    quantity: i64,
    ad_id: Option<i64>,
    ticket_count: usize,
    generate: F,
) -> Result<Option<Vec<String>>>
where
    F: FnMut() -> String,
{
    let mut tx = pool.begin().await?;

    let flagged = sqlx::query(
        r#"
        UPDATE users
        SET has_used_free_vote = 1, last_interaction = datetime('now')
        WHERE phone_number = ? AND has_used_free_vote = 0
        "#,
    )
    .bind(phone_number)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if flagged == 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    let updated = sqlx::query(
        r#"
        UPDATE votes
        SET quantity = ?, amount = 0, is_paid = 1, is_free_vote = 1, ad_id = ?
        WHERE id = ? AND phone_number = ? AND is_paid = 0
        "#,
    )
    .bind(quantity)
    .bind(ad_id)
    .bind(vote_id)
    .bind(phone_number)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    let codes = ticket::issue_tickets(&mut tx, vote_id, ticket_count, generate).await?;
    tx.commit().await?;

    tracing::info!(vote_id, phone = %phone_number, tickets = codes.len(), "Free vote redeemed");
    Ok(Some(codes))
}

/// Settle a payment as paid: payment, vote, and tickets in one transaction.
///
/// Returns the issued ticket codes, or `None` if the payment was already
/// terminal.
pub async fn complete_payment<F>(
    pool: &SqlitePool,
    payment_id: i64,
    gateway_response: Option<&str>,
    ticket_count: usize,
    generate: F,
) -> Result<Option<Vec<String>>>
where
    F: FnMut() -> String,
{
    let mut tx = pool.begin().await?;

    let vote_id: Option<(i64,)> = sqlx::query_as(
        r#"
        UPDATE payments
        SET status = 'paid',
            gateway_response = COALESCE(?, gateway_response),
            updated_at = datetime('now')
        WHERE id = ? AND status IN ('pending', 'initiated')
        RETURNING vote_id
        "#,
    )
    .bind(gateway_response)
    .bind(payment_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((vote_id,)) = vote_id else {
        tx.rollback().await?;
        return Ok(None);
    };

    let updated = sqlx::query("UPDATE votes SET is_paid = 1 WHERE id = ? AND is_paid = 0")
        .bind(vote_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if updated == 0 {
        tx.rollback().await?;
        return Err(DatabaseError::not_found("Unpaid vote", vote_id));
    }

    let codes = ticket::issue_tickets(&mut tx, vote_id, ticket_count, generate).await?;

    sqlx::query("DELETE FROM payment_checks WHERE payment_id = ?")
        .bind(payment_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(payment_id, vote_id, tickets = codes.len(), "Payment completed");
    Ok(Some(codes))
}

/// Close an open payment as failed, cancelled, or expired.
///
/// The vote stays unpaid. Returns false if the payment was already terminal.
pub async fn close_payment(
    pool: &SqlitePool,
    payment_id: i64,
    status: PaymentStatus,
    gateway_response: Option<&str>,
) -> Result<bool> {
    if status.is_open() || status.is_settled() {
        return Err(DatabaseError::InvalidTransition(format!(
            "cannot close a payment as {}",
            status
        )));
    }

    let mut tx = pool.begin().await?;

    let closed = sqlx::query(
        r#"
        UPDATE payments
        SET status = ?,
            gateway_response = COALESCE(?, gateway_response),
            updated_at = datetime('now')
        WHERE id = ? AND status IN ('pending', 'initiated')
        "#,
    )
    .bind(status.as_str())
    .bind(gateway_response)
    .bind(payment_id)
    .execute(&mut *tx)
    .await?
    .rows_affected()
        == 1;

    sqlx::query("DELETE FROM payment_checks WHERE payment_id = ?")
        .bind(payment_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    if closed {
        tracing::info!(payment_id, status = %status, "Payment closed");
    }
    Ok(closed)
}

/// What clearing a phone's open flow removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearedFlow {
    pub cancelled_payments: u64,
    pub deleted_votes: u64,
}

/// Cancel every open payment of the phone and drop its provisional votes.
///
/// Afterwards the phone has no unpaid vote that is pending or payment-less.
pub async fn clear_open_flow(pool: &SqlitePool, phone_number: &str) -> Result<ClearedFlow> {
    let mut tx = pool.begin().await?;
    let cleared = clear_open_flow_on(&mut tx, phone_number).await?;
    tx.commit().await?;
    Ok(cleared)
}

/// Delete a user together with any open flow of their phone.
///
/// Returns the deleted user's phone number.
pub async fn delete_user_with_flow(pool: &SqlitePool, user_id: i64) -> Result<String> {
    let mut tx = pool.begin().await?;

    let phone: Option<(String,)> = sqlx::query_as("SELECT phone_number FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

    let Some((phone,)) = phone else {
        tx.rollback().await?;
        return Err(DatabaseError::not_found("User", user_id));
    };

    clear_open_flow_on(&mut tx, &phone).await?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(user_id, phone = %phone, "Deleted user and open flow");
    Ok(phone)
}

async fn clear_open_flow_on(
    conn: &mut SqliteConnection,
    phone_number: &str,
) -> Result<ClearedFlow> {
    let cancelled_payments = sqlx::query(
        r#"
        UPDATE payments
        SET status = 'cancelled', updated_at = datetime('now')
        WHERE status IN ('pending', 'initiated')
          AND vote_id IN (
              SELECT id FROM votes WHERE phone_number = ? AND is_paid = 0
          )
        "#,
    )
    .bind(phone_number)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    sqlx::query(
        r#"
        DELETE FROM payment_checks
        WHERE payment_id IN (
            SELECT p.id
            FROM payments p
            JOIN votes v ON v.id = p.vote_id
            WHERE v.phone_number = ?
              AND p.status NOT IN ('pending', 'initiated')
        )
        "#,
    )
    .bind(phone_number)
    .execute(&mut *conn)
    .await?;

    let deleted_votes = sqlx::query(
        r#"
        DELETE FROM votes
        WHERE phone_number = ?
          AND is_paid = 0
          AND NOT EXISTS (SELECT 1 FROM payments p WHERE p.vote_id = votes.id)
        "#,
    )
    .bind(phone_number)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if cancelled_payments > 0 || deleted_votes > 0 {
        tracing::info!(
            phone = %phone_number,
            cancelled_payments,
            deleted_votes,
            "Cleared open flow"
        );
    }

    Ok(ClearedFlow {
        cancelled_payments,
        deleted_votes,
    })
}
