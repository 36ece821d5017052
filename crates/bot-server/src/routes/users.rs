//! User administration.

use axum::extract::{Path, Query, State};
use axum::Json;
use database::{user, User};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::Result;
use crate::state::AppState;

/// `?search=` filter shared by the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

impl SearchQuery {
    pub fn term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// List users, optionally filtered by phone number fragment.
pub async fn list_api(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<User>>> {
    let users = user::list_users(state.db.pool(), query.term()).await?;
    Ok(Json(users))
}

/// Delete a user, ending their session and any open flow first.
pub async fn delete_api(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Value>> {
    let phone = state.dispatcher.sessions().delete_user(id).await?;
    info!(user_id = id, phone = %phone, "User deleted by admin");
    Ok(Json(json!({ "deleted": id })))
}
