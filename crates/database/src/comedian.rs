//! Comedian catalog operations.

use sqlx::SqlitePool;

use crate::models::Comedian;
use crate::validation::{validate_media_url, validate_name};
use crate::{DatabaseError, Result};

/// Create a comedian. Names are unique.
pub async fn create_comedian(
    pool: &SqlitePool,
    name: &str,
    image_url: Option<&str>,
) -> Result<Comedian> {
    let name = name.trim();
    validate_name("name", name)?;
    if let Some(url) = image_url {
        validate_media_url(url)?;
    }

    let comedian = sqlx::query_as::<_, Comedian>(
        r#"
        INSERT INTO comedians (name, image_url)
        VALUES (?, ?)
        RETURNING id, name, is_active, image_url, created_at
        "#,
    )
    .bind(name)
    .bind(image_url)
    .fetch_one(pool)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Comedian", name))?;

    tracing::info!(comedian_id = comedian.id, name = %comedian.name, "Created comedian");
    Ok(comedian)
}

/// Get a comedian by ID.
pub async fn get_comedian(pool: &SqlitePool, id: i64) -> Result<Comedian> {
    sqlx::query_as::<_, Comedian>(
        r#"
        SELECT id, name, is_active, image_url, created_at
        FROM comedians
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Comedian", id))
}

/// Get a comedian by exact name, if present.
pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Comedian>> {
    let comedian = sqlx::query_as::<_, Comedian>(
        r#"
        SELECT id, name, is_active, image_url, created_at
        FROM comedians
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(comedian)
}

/// List all comedians by name, optionally filtered by a name fragment.
pub async fn list_comedians(pool: &SqlitePool, search: Option<&str>) -> Result<Vec<Comedian>> {
    let pattern = match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(fragment) => format!("%{}%", fragment),
        None => "%".to_string(),
    };

    let comedians = sqlx::query_as::<_, Comedian>(
        r#"
        SELECT id, name, is_active, image_url, created_at
        FROM comedians
        WHERE name LIKE ?
        ORDER BY name
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(comedians)
}

/// List comedians users can vote for.
pub async fn list_active(pool: &SqlitePool) -> Result<Vec<Comedian>> {
    let comedians = sqlx::query_as::<_, Comedian>(
        r#"
        SELECT id, name, is_active, image_url, created_at
        FROM comedians
        WHERE is_active = 1
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(comedians)
}

/// Edit a comedian's name and image.
pub async fn update_comedian(
    pool: &SqlitePool,
    id: i64,
    name: &str,
    image_url: Option<&str>,
) -> Result<Comedian> {
    let name = name.trim();
    validate_name("name", name)?;
    if let Some(url) = image_url {
        validate_media_url(url)?;
    }

    sqlx::query_as::<_, Comedian>(
        r#"
        UPDATE comedians
        SET name = ?, image_url = ?
        WHERE id = ?
        RETURNING id, name, is_active, image_url, created_at
        "#,
    )
    .bind(name)
    .bind(image_url)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Comedian", name))?
    .ok_or_else(|| DatabaseError::not_found("Comedian", id))
}

/// Flip the active flag.
pub async fn toggle_comedian(pool: &SqlitePool, id: i64) -> Result<Comedian> {
    sqlx::query_as::<_, Comedian>(
        r#"
        UPDATE comedians
        SET is_active = NOT is_active
        WHERE id = ?
        RETURNING id, name, is_active, image_url, created_at
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Comedian", id))
}

/// Delete a comedian. Votes for the comedian are removed with it.
pub async fn delete_comedian(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM comedians WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Comedian", id));
    }

    Ok(())
}

/// Count comedians as (total, active).
pub async fn count_comedians(pool: &SqlitePool) -> Result<(i64, i64)> {
    let counts = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COALESCE(SUM(is_active), 0) FROM comedians",
    )
    .fetch_one(pool)
    .await?;

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;

    #[tokio::test]
    async fn test_comedian_crud() {
        let db = test_db().await;

        let eliud = create_comedian(db.pool(), "Eliud", None).await.unwrap();
        assert!(eliud.is_active);
        assert!(eliud.image_url.is_none());

        let updated = update_comedian(
            db.pool(),
            eliud.id,
            "Eliud Samwel",
            Some("https://cdn.example.com/eliud.jpg"),
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Eliud Samwel");
        assert_eq!(
            updated.image_url.as_deref(),
            Some("https://cdn.example.com/eliud.jpg")
        );

        let toggled = toggle_comedian(db.pool(), eliud.id).await.unwrap();
        assert!(!toggled.is_active);
        assert!(list_active(db.pool()).await.unwrap().is_empty());
        assert_eq!(count_comedians(db.pool()).await.unwrap(), (1, 0));

        delete_comedian(db.pool(), eliud.id).await.unwrap();
        assert!(matches!(
            get_comedian(db.pool(), eliud.id).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_db().await;
        create_comedian(db.pool(), "Nanga", None).await.unwrap();

        let result = create_comedian(db.pool(), "Nanga", None).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_invalid_input_rejected() {
        let db = test_db().await;

        assert!(matches!(
            create_comedian(db.pool(), "  ", None).await,
            Err(DatabaseError::Validation(_))
        ));
        assert!(matches!(
            create_comedian(db.pool(), "Ndaro", Some("not-a-url")).await,
            Err(DatabaseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_search_is_sorted() {
        let db = test_db().await;
        create_comedian(db.pool(), "Steve Mweusi", None).await.unwrap();
        create_comedian(db.pool(), "Brother K", None).await.unwrap();
        create_comedian(db.pool(), "Ndaro", None).await.unwrap();

        let names: Vec<String> = list_comedians(db.pool(), None)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Brother K", "Ndaro", "Steve Mweusi"]);

        let found = list_comedians(db.pool(), Some("mweusi")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(find_by_name(db.pool(), "Ndaro").await.unwrap().is_some());
    }
}
