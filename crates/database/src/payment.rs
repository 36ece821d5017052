//! Payment record operations.
//!
//! Terminal transitions (paid, failed, cancelled, expired) are in
//! [`crate::lifecycle`]; this module only creates payments and records the
//! gateway's acknowledgement.

use sqlx::SqlitePool;

use crate::models::Payment;
use crate::{DatabaseError, Result};

const PAYMENT_COLUMNS: &str = "id, vote_id, payment_id, amount, status, payment_method, \
     payer_phone, transaction_id, transaction_reference, gateway_response, created_at, updated_at";

/// Create a pending payment for a vote, with a fresh local UUID.
pub async fn create_pending(
    pool: &SqlitePool,
    vote_id: i64,
    amount: i64,
    payer_phone: &str,
) -> Result<Payment> {
    let payment_id = uuid::Uuid::new_v4().to_string();

    let payment = sqlx::query_as::<_, Payment>(&format!(
        r#"
        INSERT INTO payments (vote_id, payment_id, amount, status, payer_phone)
        VALUES (?, ?, ?, 'pending', ?)
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(vote_id)
    .bind(&payment_id)
    .bind(amount)
    .bind(payer_phone)
    .fetch_one(pool)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Payment for vote", &vote_id.to_string()))?;

    tracing::info!(
        payment_id = payment.id,
        vote_id,
        amount,
        "Created pending payment"
    );
    Ok(payment)
}

/// Record a successful gateway initiation: `pending` → `initiated`.
///
/// Returns false when the payment is no longer pending.
pub async fn mark_initiated(
    pool: &SqlitePool,
    id: i64,
    transaction_id: &str,
    transaction_reference: Option<&str>,
    gateway_response: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE payments
        SET status = 'initiated',
            transaction_id = ?,
            transaction_reference = ?,
            gateway_response = ?,
            updated_at = datetime('now')
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(transaction_id)
    .bind(transaction_reference)
    .bind(gateway_response)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Payment transaction", transaction_id))?;

    Ok(result.rows_affected() == 1)
}

/// Store the latest raw gateway response without changing status.
pub async fn record_response(pool: &SqlitePool, id: i64, gateway_response: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE payments
        SET gateway_response = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(gateway_response)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a payment by row ID.
pub async fn get_payment(pool: &SqlitePool, id: i64) -> Result<Payment> {
    sqlx::query_as::<_, Payment>(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Payment", id))
}

/// Get a payment by the gateway transaction (order) id.
pub async fn find_by_transaction_id(
    pool: &SqlitePool,
    transaction_id: &str,
) -> Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE transaction_id = ?"
    ))
    .bind(transaction_id)
    .fetch_optional(pool)
    .await?;

    Ok(payment)
}

/// The newest pending or initiated payment for votes cast from a phone.
pub async fn latest_open_for_phone(
    pool: &SqlitePool,
    phone_number: &str,
) -> Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(
        r#"
        SELECT p.id, p.vote_id, p.payment_id, p.amount, p.status, p.payment_method,
               p.payer_phone, p.transaction_id, p.transaction_reference, p.gateway_response,
               p.created_at, p.updated_at
        FROM payments p
        JOIN votes v ON v.id = p.vote_id
        WHERE v.phone_number = ?
          AND p.status IN ('pending', 'initiated')
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT 1
        "#,
    )
    .bind(phone_number)
    .fetch_optional(pool)
    .await?;

    Ok(payment)
}

/// Seconds elapsed since the payment was created.
pub async fn age_secs(pool: &SqlitePool, id: i64) -> Result<i64> {
    let age: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT CAST(strftime('%s', 'now') AS INTEGER) - CAST(strftime('%s', created_at) AS INTEGER)
        FROM payments
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    age.map(|(secs,)| secs)
        .ok_or_else(|| DatabaseError::not_found("Payment", id))
}

/// Count payments as (total, settled).
pub async fn count_payments(pool: &SqlitePool) -> Result<(i64, i64)> {
    let counts = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COUNT(*), COALESCE(SUM(status IN ('paid', 'completed')), 0)
        FROM payments
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;
    use crate::test_db;
    use crate::vote;

    #[tokio::test]
    async fn test_pending_then_initiated() {
        let db = test_db().await;
        let (comedian_id, session_id) = vote::tests::seed(db.pool()).await;
        let v = vote::create_provisional(db.pool(), comedian_id, session_id, "255700000001", 1000)
            .await
            .unwrap();

        let payment = create_pending(db.pool(), v.id, 2000, "255712345678")
            .await
            .unwrap();
        assert_eq!(payment.status(), PaymentStatus::Pending);
        assert_eq!(payment.payment_method, "mobile_money");
        assert!(uuid::Uuid::parse_str(&payment.payment_id).is_ok());

        assert!(mark_initiated(db.pool(), payment.id, "ord-1", Some("ref-1"), "{}")
            .await
            .unwrap());
        // Second acknowledgement is a no-op
        assert!(!mark_initiated(db.pool(), payment.id, "ord-1", Some("ref-1"), "{}")
            .await
            .unwrap());

        let fetched = find_by_transaction_id(db.pool(), "ord-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.status(), PaymentStatus::Initiated);
        assert_eq!(fetched.transaction_reference.as_deref(), Some("ref-1"));

        let open = latest_open_for_phone(db.pool(), "255700000001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(open.id, payment.id);
        assert!(latest_open_for_phone(db.pool(), "255712345678")
            .await
            .unwrap()
            .is_none());

        assert!(age_secs(db.pool(), payment.id).await.unwrap() < 5);
        assert_eq!(count_payments(db.pool()).await.unwrap(), (1, 0));
    }

    #[tokio::test]
    async fn test_one_payment_per_vote() {
        let db = test_db().await;
        let (comedian_id, session_id) = vote::tests::seed(db.pool()).await;
        let v = vote::create_provisional(db.pool(), comedian_id, session_id, "255700000001", 1000)
            .await
            .unwrap();

        create_pending(db.pool(), v.id, 1000, "255712345678")
            .await
            .unwrap();
        let result = create_pending(db.pool(), v.id, 1000, "255712345678").await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM payments WHERE vote_id = ?")
            .bind(v.id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
