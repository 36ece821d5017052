//! User CRUD operations.

use sqlx::SqlitePool;

use crate::models::User;
use crate::{DatabaseError, Result};

const USER_COLUMNS: &str =
    "id, phone_number, is_first_time, has_used_free_vote, created_at, last_interaction";

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("User", id))
}

/// Get a user by phone number, if one exists.
pub async fn find_by_phone(pool: &SqlitePool, phone_number: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE phone_number = ?"
    ))
    .bind(phone_number)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Fetch the user for a phone number, creating it on first contact.
///
/// Returns the user and whether it was created by this call. Existing users
/// get their `last_interaction` refreshed.
pub async fn get_or_create(pool: &SqlitePool, phone_number: &str) -> Result<(User, bool)> {
    let inserted = sqlx::query(
        r#"
        INSERT OR IGNORE INTO users (phone_number)
        VALUES (?)
        "#,
    )
    .bind(phone_number)
    .execute(pool)
    .await?
    .rows_affected()
        > 0;

    if !inserted {
        sqlx::query(
            r#"
            UPDATE users
            SET last_interaction = datetime('now')
            WHERE phone_number = ?
            "#,
        )
        .bind(phone_number)
        .execute(pool)
        .await?;
    } else {
        tracing::info!(phone = %phone_number, "Created new user");
    }

    let user = find_by_phone(pool, phone_number)
        .await?
        .ok_or_else(|| DatabaseError::not_found("User", phone_number))?;

    Ok((user, inserted))
}

/// Clear the first-time flag after the first welcome has been sent.
pub async fn mark_welcomed(pool: &SqlitePool, phone_number: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET is_first_time = 0, last_interaction = datetime('now')
        WHERE phone_number = ?
        "#,
    )
    .bind(phone_number)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a user by ID.
///
/// This only removes the row. Use the bot's session manager to purge the
/// user's conversation state along with it.
pub async fn delete_user(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("User", id));
    }

    Ok(())
}

/// List users, newest first, optionally filtered by a phone-number fragment.
pub async fn list_users(pool: &SqlitePool, search: Option<&str>) -> Result<Vec<User>> {
    let users = match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(fragment) => {
            sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE phone_number LIKE ? ORDER BY created_at DESC, id DESC"
            ))
            .bind(format!("%{}%", fragment))
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, User>(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
            ))
            .fetch_all(pool)
            .await?
        }
    };

    Ok(users)
}

/// User counters for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct UserCounts {
    pub total: i64,
    pub first_time: i64,
    pub returning: i64,
    pub free_vote_used: i64,
    pub new_today: i64,
}

/// Count users by dashboard category.
pub async fn count_users(pool: &SqlitePool) -> Result<UserCounts> {
    let (total, first_time, free_vote_used, new_today) =
        sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(is_first_time), 0),
                COALESCE(SUM(has_used_free_vote), 0),
                COALESCE(SUM(date(created_at) = date('now')), 0)
            FROM users
            "#,
        )
        .fetch_one(pool)
        .await?;

    Ok(UserCounts {
        total,
        first_time,
        returning: total - first_time,
        free_vote_used,
        new_today,
    })
}
