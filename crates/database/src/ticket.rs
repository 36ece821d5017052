//! Raffle ticket operations.

use std::collections::HashMap;

use sqlx::{SqliteConnection, SqlitePool};

use crate::models::Ticket;
use crate::Result;

/// Whether a ticket code is already taken.
pub async fn code_exists(conn: &mut SqliteConnection, code: &str) -> Result<bool> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM tickets WHERE ticket_code = ?)")
            .bind(code)
            .fetch_one(&mut *conn)
            .await?;

    Ok(exists)
}

/// Issue `count` tickets for a vote on the given connection.
///
/// Codes come from `generate` and are redrawn until unused. Meant to run
/// inside a lifecycle transaction so the uniqueness check and the insert see
/// the same snapshot.
pub async fn issue_tickets<F>(
    conn: &mut SqliteConnection,
    vote_id: i64,
    count: usize,
    mut generate: F,
) -> Result<Vec<String>>
where
    F: FnMut() -> String,
{
    let mut codes = Vec::with_capacity(count);

    for _ in 0..count {
        let code = loop {
            let candidate = generate();
            if !code_exists(&mut *conn, &candidate).await? {
                break candidate;
            }
            tracing::debug!(code = %candidate, "Ticket code collision, redrawing");
        };

        sqlx::query("INSERT INTO tickets (vote_id, ticket_code) VALUES (?, ?)")
            .bind(vote_id)
            .bind(&code)
            .execute(&mut *conn)
            .await?;

        codes.push(code);
    }

    Ok(codes)
}

/// Tickets issued for a vote, in issue order.
pub async fn list_for_vote(pool: &SqlitePool, vote_id: i64) -> Result<Vec<Ticket>> {
    let tickets = sqlx::query_as::<_, Ticket>(
        r#"
        SELECT id, vote_id, ticket_code, created_at
        FROM tickets
        WHERE vote_id = ?
        ORDER BY id
        "#,
    )
    .bind(vote_id)
    .fetch_all(pool)
    .await?;

    Ok(tickets)
}

/// Ticket codes grouped by vote.
pub async fn codes_by_vote(pool: &SqlitePool) -> Result<HashMap<i64, Vec<String>>> {
    let rows = sqlx::query_as::<_, (i64, String)>(
        "SELECT vote_id, ticket_code FROM tickets ORDER BY vote_id, id",
    )
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<String>> = HashMap::new();
    for (vote_id, code) in rows {
        grouped.entry(vote_id).or_default().push(code);
    }

    Ok(grouped)
}

/// Total tickets issued.
pub async fn count_tickets(pool: &SqlitePool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tickets")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_db, vote};

    #[tokio::test]
    async fn test_issue_tickets_redraws_on_collision() {
        let db = test_db().await;
        let (comedian_id, session_id) = vote::tests::seed(db.pool()).await;
        let v = vote::create_provisional(db.pool(), comedian_id, session_id, "255700000001", 0)
            .await
            .unwrap();

        // The generator repeats "AAAAAA" before yielding fresh codes
        let mut draws = vec!["CCCCCC", "AAAAAA", "BBBBBB", "AAAAAA", "AAAAAA"].into_iter().rev();
        let mut conn = db.pool().acquire().await.unwrap();
        let codes = issue_tickets(&mut conn, v.id, 3, || {
            draws.next().unwrap().to_string()
        })
        .await
        .unwrap();
        drop(conn);

        assert_eq!(codes, vec!["AAAAAA", "BBBBBB", "CCCCCC"]);
        let stored: Vec<String> = list_for_vote(db.pool(), v.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.ticket_code)
            .collect();
        assert_eq!(stored, codes);
        assert_eq!(count_tickets(db.pool()).await.unwrap(), 3);
        assert_eq!(codes_by_vote(db.pool()).await.unwrap()[&v.id].len(), 3);
    }
}
