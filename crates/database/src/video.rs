//! Welcome video operations.

use sqlx::SqlitePool;

use crate::models::WelcomeVideo;
use crate::validation::{validate_media_url, validate_name};
use crate::{DatabaseError, Result};

/// Add a welcome video.
pub async fn create_video(
    pool: &SqlitePool,
    title: &str,
    video_url: &str,
    sort_order: i64,
) -> Result<WelcomeVideo> {
    validate_name("title", title)?;
    validate_media_url(video_url)?;

    let video = sqlx::query_as::<_, WelcomeVideo>(
        r#"
        INSERT INTO welcome_videos (title, video_url, sort_order)
        VALUES (?, ?, ?)
        RETURNING id, title, video_url, sort_order, is_active, created_at
        "#,
    )
    .bind(title.trim())
    .bind(video_url.trim())
    .bind(sort_order)
    .fetch_one(pool)
    .await?;

    Ok(video)
}

/// List all videos in send order.
pub async fn list_videos(pool: &SqlitePool) -> Result<Vec<WelcomeVideo>> {
    let videos = sqlx::query_as::<_, WelcomeVideo>(
        r#"
        SELECT id, title, video_url, sort_order, is_active, created_at
        FROM welcome_videos
        ORDER BY sort_order, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(videos)
}

/// List active videos in send order.
pub async fn list_active(pool: &SqlitePool) -> Result<Vec<WelcomeVideo>> {
    let videos = sqlx::query_as::<_, WelcomeVideo>(
        r#"
        SELECT id, title, video_url, sort_order, is_active, created_at
        FROM welcome_videos
        WHERE is_active = 1
        ORDER BY sort_order, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(videos)
}

/// Replace a video's fields.
pub async fn update_video(
    pool: &SqlitePool,
    id: i64,
    title: &str,
    video_url: &str,
    sort_order: i64,
    is_active: bool,
) -> Result<WelcomeVideo> {
    validate_name("title", title)?;
    validate_media_url(video_url)?;

    sqlx::query_as::<_, WelcomeVideo>(
        r#"
        UPDATE welcome_videos
        SET title = ?, video_url = ?, sort_order = ?, is_active = ?
        WHERE id = ?
        RETURNING id, title, video_url, sort_order, is_active, created_at
        "#,
    )
    .bind(title.trim())
    .bind(video_url.trim())
    .bind(sort_order)
    .bind(is_active)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("WelcomeVideo", id))
}

/// Delete a video.
pub async fn delete_video(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM welcome_videos WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("WelcomeVideo", id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_db;

    #[tokio::test]
    async fn test_active_videos_follow_sort_order() {
        let db = test_db().await;

        let second = create_video(db.pool(), "Behind the scenes", "https://v.example.com/2.mp4", 2)
            .await
            .unwrap();
        let first = create_video(db.pool(), "Intro", "https://v.example.com/1.mp4", 1)
            .await
            .unwrap();
        let hidden = create_video(db.pool(), "Old", "https://v.example.com/0.mp4", 0)
            .await
            .unwrap();
        update_video(db.pool(), hidden.id, "Old", &hidden.video_url, 0, false)
            .await
            .unwrap();

        let ids: Vec<i64> = list_active(db.pool())
            .await
            .unwrap()
            .iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert_eq!(list_videos(db.pool()).await.unwrap().len(), 3);

        delete_video(db.pool(), second.id).await.unwrap();
        assert!(matches!(
            delete_video(db.pool(), second.id).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_video_url_validated() {
        let db = test_db().await;
        let result = create_video(db.pool(), "Intro", "intro.mp4", 0).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));
    }
}
