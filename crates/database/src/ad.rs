//! Sponsor ad operations.

use sqlx::SqlitePool;

use crate::models::Ad;
use crate::validation::{validate_media_url, validate_name};
use crate::{DatabaseError, Result};

/// Fields accepted when creating or editing an ad.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdInput {
    pub title: String,
    pub sponsor_name: String,
    pub description: String,
    pub image_url: Option<String>,
}

impl AdInput {
    fn validate(&self) -> Result<()> {
        validate_name("title", &self.title)?;
        if let Some(url) = &self.image_url {
            validate_media_url(url)?;
        }
        Ok(())
    }
}

/// Create an active ad.
pub async fn create_ad(pool: &SqlitePool, input: &AdInput) -> Result<Ad> {
    input.validate()?;

    let ad = sqlx::query_as::<_, Ad>(
        r#"
        INSERT INTO ads (title, sponsor_name, description, image_url)
        VALUES (?, ?, ?, ?)
        RETURNING id, title, sponsor_name, description, image_url, is_active, created_at
        "#,
    )
    .bind(input.title.trim())
    .bind(input.sponsor_name.trim())
    .bind(input.description.trim())
    .bind(input.image_url.as_deref())
    .fetch_one(pool)
    .await?;

    tracing::info!(ad_id = ad.id, sponsor = %ad.sponsor_name, "Created ad");
    Ok(ad)
}

/// Get an ad by ID.
pub async fn get_ad(pool: &SqlitePool, id: i64) -> Result<Ad> {
    sqlx::query_as::<_, Ad>(
        r#"
        SELECT id, title, sponsor_name, description, image_url, is_active, created_at
        FROM ads
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Ad", id))
}

/// List ads, newest first, optionally filtered by title or sponsor.
pub async fn list_ads(pool: &SqlitePool, search: Option<&str>) -> Result<Vec<Ad>> {
    let pattern = match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(fragment) => format!("%{}%", fragment),
        None => "%".to_string(),
    };

    let ads = sqlx::query_as::<_, Ad>(
        r#"
        SELECT id, title, sponsor_name, description, image_url, is_active, created_at
        FROM ads
        WHERE title LIKE ? OR sponsor_name LIKE ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(pattern.as_str())
    .bind(pattern.as_str())
    .fetch_all(pool)
    .await?;

    Ok(ads)
}

/// Pick one active ad at random.
pub async fn random_active(pool: &SqlitePool) -> Result<Option<Ad>> {
    let ad = sqlx::query_as::<_, Ad>(
        r#"
        SELECT id, title, sponsor_name, description, image_url, is_active, created_at
        FROM ads
        WHERE is_active = 1
        ORDER BY RANDOM()
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(ad)
}

/// Replace an ad's editable fields.
pub async fn update_ad(pool: &SqlitePool, id: i64, input: &AdInput) -> Result<Ad> {
    input.validate()?;

    sqlx::query_as::<_, Ad>(
        r#"
        UPDATE ads
        SET title = ?, sponsor_name = ?, description = ?, image_url = ?
        WHERE id = ?
        RETURNING id, title, sponsor_name, description, image_url, is_active, created_at
        "#,
    )
    .bind(input.title.trim())
    .bind(input.sponsor_name.trim())
    .bind(input.description.trim())
    .bind(input.image_url.as_deref())
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Ad", id))
}

/// Flip the active flag.
pub async fn toggle_ad(pool: &SqlitePool, id: i64) -> Result<Ad> {
    sqlx::query_as::<_, Ad>(
        r#"
        UPDATE ads
        SET is_active = NOT is_active
        WHERE id = ?
        RETURNING id, title, sponsor_name, description, image_url, is_active, created_at
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Ad", id))
}

/// Delete an ad. Votes that showed it keep their row with `ad_id` cleared.
pub async fn delete_ad(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM ads WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Ad", id));
    }

    Ok(())
}

/// Count ads as (total, active).
pub async fn count_ads(pool: &SqlitePool) -> Result<(i64, i64)> {
    let counts =
        sqlx::query_as::<_, (i64, i64)>("SELECT COUNT(*), COALESCE(SUM(is_active), 0) FROM ads")
            .fetch_one(pool)
            .await?;

    Ok(counts)
}
