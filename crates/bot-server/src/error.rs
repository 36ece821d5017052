//! Error types for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use database::DatabaseError;
use thiserror::Error;
use voting_bot::BotError;

/// Errors returned by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Conversation handling failed. Always a 500.
    #[error("Bot error: {0}")]
    Bot(BotError),

    /// Malformed request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing or wrong credentials.
    #[error("Unauthorized")]
    Unauthorized,

    /// Resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<BotError> for ApiError {
    fn from(err: BotError) -> Self {
        match err {
            BotError::Database(db) => ApiError::Database(db),
            other => ApiError::Bot(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Database(DatabaseError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            ApiError::Database(
                DatabaseError::Validation(_)
                | DatabaseError::AlreadyExists { .. }
                | DatabaseError::InvalidTransition(_),
            ) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Bot(err) => {
                tracing::error!("Bot error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for route handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_errors_are_server_errors() {
        let missing = ApiError::Bot(BotError::Database(DatabaseError::NotFound {
            entity: "Comedian",
            id: "1".to_string(),
        }));
        assert_eq!(missing.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let admin_missing = ApiError::Database(DatabaseError::NotFound {
            entity: "Comedian",
            id: "1".to_string(),
        });
        assert_eq!(admin_missing.into_response().status(), StatusCode::NOT_FOUND);
    }
}
