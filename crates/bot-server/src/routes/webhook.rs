//! WhatsApp webhook and payment gateway callback.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use tracing::{info, warn};
use voting_bot::Resolution;
use whatsapp_cloud::signature::{self, SIGNATURE_HEADER};
use whatsapp_cloud::{WebhookPayload, WebhookVerifyQuery};

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Subscription handshake: echo the challenge when the token matches.
pub async fn verify(
    State(state): State<AppState>,
    Query(query): Query<WebhookVerifyQuery>,
) -> Response {
    match query.challenge_for(&state.webhook.verify_token) {
        Some(challenge) => {
            info!("Webhook verified");
            (StatusCode::OK, challenge.to_string()).into_response()
        }
        None => {
            warn!(mode = ?query.mode, "Webhook verification failed");
            (StatusCode::FORBIDDEN, "Forbidden").into_response()
        }
    }
}

/// Message delivery.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    if let Some(secret) = state.webhook.app_secret.as_deref() {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !signature::verify(secret, &body, header) {
            warn!("Webhook signature mismatch");
            return Err(ApiError::Unauthorized);
        }
    }

    let payload: WebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        warn!("Malformed webhook body: {}", e);
        ApiError::BadRequest(format!("invalid JSON: {}", e))
    })?;

    let statuses = payload.status_count();
    // Anything the dispatcher fails on is a server fault, whatever its cause.
    let handled = state
        .dispatcher
        .handle_payload(&payload)
        .await
        .map_err(ApiError::Bot)?;
    info!(messages = handled, statuses, "Webhook received");

    Ok(Json(json!({ "status": "ok", "messages": handled })))
}

/// Asynchronous notification from the payment gateway.
///
/// The body only names the order; the outcome is re-queried from the gateway.
pub async fn payment_callback(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    let notification: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON: {}", e)))?;

    let outcome = match state
        .dispatcher
        .handle_gateway_callback(&notification)
        .await
        .map_err(ApiError::Bot)?
    {
        None => "ignored",
        Some(Resolution::Paid { .. }) => "paid",
        Some(Resolution::Closed(_)) => "closed",
        Some(Resolution::StillPending(_)) => "pending",
        Some(Resolution::AlreadyFinal(_)) => "already_final",
    };

    Ok(Json(json!({ "status": "ok", "outcome": outcome })))
}
