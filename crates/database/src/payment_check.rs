//! Durable scheduled payment status checks.
//!
//! One row per payment. A worker claims a due row by pushing its `due_at`
//! forward (a lease); only one claimant can move a due row, so two workers
//! never run the same check. The row is removed when the payment settles or
//! the worker gives up, so a crash mid-check leaves it to be picked up again
//! once the lease runs out.

use sqlx::SqlitePool;

use crate::models::PaymentCheck;
use crate::Result;

/// Schedule (or reschedule) a status check `delay_secs` from now.
///
/// `attempts` is the number of checks already performed.
pub async fn schedule(
    pool: &SqlitePool,
    payment_id: i64,
    delay_secs: u64,
    attempts: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO payment_checks (payment_id, due_at, attempts)
        VALUES (?, datetime('now', ?), ?)
        ON CONFLICT(payment_id) DO UPDATE SET
            due_at = excluded.due_at,
            attempts = excluded.attempts
        "#,
    )
    .bind(payment_id)
    .bind(format!("+{} seconds", delay_secs))
    .bind(attempts)
    .execute(pool)
    .await?;

    tracing::debug!(payment_id, delay_secs, attempts, "Scheduled payment check");
    Ok(())
}

/// Checks whose due time has passed, oldest first.
pub async fn due(pool: &SqlitePool, limit: i64) -> Result<Vec<PaymentCheck>> {
    let checks = sqlx::query_as::<_, PaymentCheck>(
        r#"
        SELECT payment_id, due_at, attempts, created_at
        FROM payment_checks
        WHERE due_at <= datetime('now')
        ORDER BY due_at, payment_id
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(checks)
}

/// Claim a due check by leasing it for `lease_secs`.
///
/// Returns false if the check is not due (someone else holds the lease, or it
/// was removed).
pub async fn claim(pool: &SqlitePool, payment_id: i64, lease_secs: u64) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE payment_checks
        SET due_at = datetime('now', ?)
        WHERE payment_id = ? AND due_at <= datetime('now')
        "#,
    )
    .bind(format!("+{} seconds", lease_secs))
    .bind(payment_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Drop the scheduled check for a payment.
pub async fn remove(pool: &SqlitePool, payment_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM payment_checks WHERE payment_id = ?")
        .bind(payment_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Get the scheduled check for a payment, if any.
pub async fn get(pool: &SqlitePool, payment_id: i64) -> Result<Option<PaymentCheck>> {
    let check = sqlx::query_as::<_, PaymentCheck>(
        r#"
        SELECT payment_id, due_at, attempts, created_at
        FROM payment_checks
        WHERE payment_id = ?
        "#,
    )
    .bind(payment_id)
    .fetch_optional(pool)
    .await?;

    Ok(check)
}

/// Number of scheduled checks.
pub async fn pending_count(pool: &SqlitePool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM payment_checks")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
