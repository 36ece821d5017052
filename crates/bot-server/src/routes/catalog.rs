//! Comedians, sponsor ads, and welcome videos.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::ad::AdInput;
use database::{ad, comedian, video, Ad, Comedian, WelcomeVideo};
use serde::Deserialize;
use serde_json::{json, Value};

use super::users::SearchQuery;
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ComedianBody {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

pub async fn list_comedians(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Comedian>>> {
    Ok(Json(
        comedian::list_comedians(state.db.pool(), query.term()).await?,
    ))
}

pub async fn create_comedian(
    State(state): State<AppState>,
    Json(body): Json<ComedianBody>,
) -> Result<(StatusCode, Json<Comedian>)> {
    let created =
        comedian::create_comedian(state.db.pool(), &body.name, body.image_url.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_comedian(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ComedianBody>,
) -> Result<Json<Comedian>> {
    let updated =
        comedian::update_comedian(state.db.pool(), id, &body.name, body.image_url.as_deref())
            .await?;
    Ok(Json(updated))
}

pub async fn toggle_comedian(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Comedian>> {
    Ok(Json(comedian::toggle_comedian(state.db.pool(), id).await?))
}

pub async fn delete_comedian(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    comedian::delete_comedian(state.db.pool(), id).await?;
    Ok(Json(json!({ "deleted": id })))
}

#[derive(Debug, Deserialize)]
pub struct AdBody {
    pub title: String,
    pub sponsor_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<AdBody> for AdInput {
    fn from(body: AdBody) -> Self {
        AdInput {
            title: body.title,
            sponsor_name: body.sponsor_name,
            description: body.description,
            image_url: body.image_url,
        }
    }
}

pub async fn list_ads(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Ad>>> {
    Ok(Json(ad::list_ads(state.db.pool(), query.term()).await?))
}

pub async fn create_ad(
    State(state): State<AppState>,
    Json(body): Json<AdBody>,
) -> Result<(StatusCode, Json<Ad>)> {
    let created = ad::create_ad(state.db.pool(), &body.into()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_ad(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<AdBody>,
) -> Result<Json<Ad>> {
    Ok(Json(ad::update_ad(state.db.pool(), id, &body.into()).await?))
}

pub async fn toggle_ad(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Ad>> {
    Ok(Json(ad::toggle_ad(state.db.pool(), id).await?))
}

pub async fn delete_ad(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>> {
    ad::delete_ad(state.db.pool(), id).await?;
    Ok(Json(json!({ "deleted": id })))
}

#[derive(Debug, Deserialize)]
pub struct VideoBody {
    pub title: String,
    pub video_url: String,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

pub async fn list_videos(State(state): State<AppState>) -> Result<Json<Vec<WelcomeVideo>>> {
    Ok(Json(video::list_videos(state.db.pool()).await?))
}

pub async fn create_video(
    State(state): State<AppState>,
    Json(body): Json<VideoBody>,
) -> Result<(StatusCode, Json<WelcomeVideo>)> {
    let created =
        video::create_video(state.db.pool(), &body.title, &body.video_url, body.sort_order).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_video(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<VideoBody>,
) -> Result<Json<WelcomeVideo>> {
    let updated = video::update_video(
        state.db.pool(),
        id,
        &body.title,
        &body.video_url,
        body.sort_order,
        body.is_active,
    )
    .await?;
    Ok(Json(updated))
}

pub async fn delete_video(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    video::delete_video(state.db.pool(), id).await?;
    Ok(Json(json!({ "deleted": id })))
}
