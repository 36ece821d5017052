//! Voting session (contest) administration.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::{voting_session, VotingSession};
use serde::Deserialize;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Length of a session created without explicit dates.
pub const DEFAULT_SESSION_DAYS: i64 = 30;
/// Days until winners are announced for such a session.
pub const DEFAULT_ANNOUNCE_DAYS: i64 = 35;

/// New session. Give all three dates (`YYYY-MM-DD HH:MM:SS`) or none.
#[derive(Debug, Deserialize)]
pub struct SessionBody {
    pub name: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub winner_announcement_date: Option<String>,
}

pub async fn list_api(State(state): State<AppState>) -> Result<Json<Vec<VotingSession>>> {
    Ok(Json(voting_session::list_sessions(state.db.pool()).await?))
}

pub async fn create_api(
    State(state): State<AppState>,
    Json(body): Json<SessionBody>,
) -> Result<(StatusCode, Json<VotingSession>)> {
    let pool = state.db.pool();

    let created = match (&body.start_date, &body.end_date, &body.winner_announcement_date) {
        (Some(start), Some(end), Some(announce)) => {
            voting_session::create_session(pool, &body.name, start, end, announce).await?
        }
        (None, None, None) => {
            voting_session::create_session_from_now(
                pool,
                &body.name,
                DEFAULT_SESSION_DAYS,
                DEFAULT_ANNOUNCE_DAYS,
            )
            .await?
        }
        _ => {
            return Err(ApiError::BadRequest(
                "give start_date, end_date and winner_announcement_date together".to_string(),
            ))
        }
    };

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn toggle_api(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<VotingSession>> {
    Ok(Json(voting_session::toggle_session(state.db.pool(), id).await?))
}
