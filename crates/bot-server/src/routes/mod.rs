//! Route handlers for the bot server.

pub mod catalog;
pub mod dashboard;
pub mod health;
pub mod sessions;
pub mod users;
pub mod webhook;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/stats", get(dashboard::stats_api))
        .route("/votes", get(dashboard::votes_api))
        .route("/vote-stats", get(dashboard::vote_stats_api))
        .route("/users", get(users::list_api))
        .route("/users/:id", axum::routing::delete(users::delete_api))
        .route(
            "/comedians",
            get(catalog::list_comedians).post(catalog::create_comedian),
        )
        .route(
            "/comedians/:id",
            patch(catalog::update_comedian).delete(catalog::delete_comedian),
        )
        .route("/comedians/:id/toggle", post(catalog::toggle_comedian))
        .route("/ads", get(catalog::list_ads).post(catalog::create_ad))
        .route(
            "/ads/:id",
            patch(catalog::update_ad).delete(catalog::delete_ad),
        )
        .route("/ads/:id/toggle", post(catalog::toggle_ad))
        .route("/videos", get(catalog::list_videos).post(catalog::create_video))
        .route(
            "/videos/:id",
            patch(catalog::update_video).delete(catalog::delete_video),
        )
        .route(
            "/voting-sessions",
            get(sessions::list_api).post(sessions::create_api),
        )
        .route("/voting-sessions/:id/toggle", post(sessions::toggle_api))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Provider webhooks
        .route("/webhook", get(webhook::verify).post(webhook::receive))
        .route("/webhook/payment", post(webhook::payment_callback))
        // Admin API
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Require `Authorization: Bearer <ADMIN_TOKEN>` when a token is configured.
async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    if let Some(expected) = state.admin_token.as_deref() {
        let provided = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        if provided != Some(expected) {
            return Err(ApiError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, StatusCode};
    use database::{comedian, user, voting_session, Database};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use voting_bot::{
        BotConfig, Dispatcher, Messenger, PaymentProvider, RecordingMessenger, ScriptedGateway,
    };
    use whatsapp_cloud::signature;

    use super::*;
    use crate::state::WebhookSecrets;

    struct TestApp {
        db: Database,
        messenger: Arc<RecordingMessenger>,
        state: AppState,
    }

    impl TestApp {
        async fn new(app_secret: Option<&str>, admin_token: Option<&str>) -> Self {
            let db = Database::connect("sqlite::memory:").await.unwrap();
            db.migrate().await.unwrap();

            let messenger = Arc::new(RecordingMessenger::new());
            let dispatcher = Arc::new(Dispatcher::new(
                db.clone(),
                messenger.clone() as Arc<dyn Messenger>,
                Arc::new(ScriptedGateway::new()) as Arc<dyn PaymentProvider>,
                BotConfig::default(),
            ));
            let state = AppState::new(
                db.clone(),
                dispatcher,
                WebhookSecrets {
                    verify_token: "verify-me".to_string(),
                    app_secret: app_secret.map(str::to_string),
                },
                admin_token.map(str::to_string),
            );

            Self {
                db,
                messenger,
                state,
            }
        }

        async fn call(&self, request: axum::http::Request<Body>) -> (StatusCode, String) {
            let response = router(self.state.clone()).oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, String::from_utf8_lossy(&bytes).into_owned())
        }
    }

    fn get_req(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn json_req(method: Method, uri: &str, body: &Value) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn text_payload(from: &str, text: &str) -> Value {
        json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "WABA_ID",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "messages": [{
                            "from": from,
                            "id": "wamid.1",
                            "type": "text",
                            "text": { "body": text }
                        }]
                    }
                }]
            }]
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new(None, None).await;
        let (status, body) = app.call(get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("ok"));
    }

    #[tokio::test]
    async fn test_webhook_verification() {
        let app = TestApp::new(None, None).await;

        let (status, body) = app
            .call(get_req(
                "/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=1158201444",
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "1158201444");

        let (status, _) = app
            .call(get_req(
                "/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=1158201444",
            ))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_webhook_dispatches_messages() {
        let app = TestApp::new(None, None).await;

        let (status, body) = app
            .call(json_req(
                Method::POST,
                "/webhook",
                &text_payload("255700000001", "Habari"),
            ))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"messages\":1"));
        assert_eq!(app.messenger.messages_to("255700000001").len(), 1);
        assert!(user::find_by_phone(app.db.pool(), "255700000001")
            .await
            .unwrap()
            .is_some());
    }

    fn list_payload(from: &str, id: &str) -> Value {
        json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "WABA_ID",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "messages": [{
                            "from": from,
                            "id": "wamid.2",
                            "type": "interactive",
                            "interactive": {
                                "type": "list_reply",
                                "list_reply": { "id": id, "title": "" }
                            }
                        }]
                    }
                }]
            }]
        })
    }

    #[tokio::test]
    async fn test_webhook_answers_ok_when_session_comedian_is_deleted() {
        let app = TestApp::new(None, None).await;
        let pool = app.db.pool();
        let eliud = comedian::create_comedian(pool, "Eliud", None).await.unwrap();
        voting_session::create_session_from_now(pool, "Oktoba", 30, 35)
            .await
            .unwrap();

        let pick = list_payload("255700000001", &format!("comedian_{}", eliud.id));
        let (status, _) = app.call(json_req(Method::POST, "/webhook", &pick)).await;
        assert_eq!(status, StatusCode::OK);

        comedian::delete_comedian(pool, eliud.id).await.unwrap();
        app.messenger.take();

        let quantity = list_payload("255700000001", "quantity_5");
        let (status, _) = app.call(json_req(Method::POST, "/webhook", &quantity)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!app.messenger.messages_to("255700000001").is_empty());
    }

    #[tokio::test]
    async fn test_webhook_dispatch_failure_is_server_error() {
        let app = TestApp::new(None, None).await;
        sqlx::query("DROP TABLE users").execute(app.db.pool()).await.unwrap();

        let (status, body) = app
            .call(json_req(
                Method::POST,
                "/webhook",
                &text_payload("255700000001", "Habari"),
            ))
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("error"));
    }

    #[tokio::test]
    async fn test_webhook_rejects_malformed_json() {
        let app = TestApp::new(None, None).await;
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/webhook")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = app.call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("error"));
    }

    #[tokio::test]
    async fn test_webhook_signature() {
        let app = TestApp::new(Some("app-secret"), None).await;
        let payload = text_payload("255700000001", "Habari").to_string();

        let unsigned = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/webhook")
            .body(Body::from(payload.clone()))
            .unwrap();
        let (status, _) = app.call(unsigned).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(app.messenger.messages().is_empty());

        let signed = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/webhook")
            .header(
                signature::SIGNATURE_HEADER,
                signature::sign("app-secret", payload.as_bytes()),
            )
            .body(Body::from(payload))
            .unwrap();
        let (status, _) = app.call(signed).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_payment_callback_for_unknown_order() {
        let app = TestApp::new(None, None).await;

        let (status, body) = app
            .call(json_req(
                Method::POST,
                "/webhook/payment",
                &json!({ "order_id": "missing" }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("ignored"));

        let bad = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/webhook/payment")
            .body(Body::from("nope"))
            .unwrap();
        let (status, _) = app.call(bad).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_token_required() {
        let app = TestApp::new(None, Some("admin-secret")).await;

        let (status, _) = app.call(get_req("/api/stats")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let request = axum::http::Request::builder()
            .uri("/api/stats")
            .header(AUTHORIZATION, "Bearer admin-secret")
            .body(Body::empty())
            .unwrap();
        let (status, body) = app.call(request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"users\""));

        // Webhooks stay reachable without the admin token.
        let (status, _) = app.call(get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_comedian_crud() {
        let app = TestApp::new(None, None).await;

        let (status, body) = app
            .call(json_req(
                Method::POST,
                "/api/comedians",
                &json!({ "name": "Eliud" }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let created: Value = serde_json::from_str(&body).unwrap();
        let id = created["id"].as_i64().unwrap();

        let (status, _) = app
            .call(json_req(
                Method::POST,
                "/api/comedians",
                &json!({ "name": "Eliud" }),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .call(json_req(
                Method::POST,
                &format!("/api/comedians/{}/toggle", id),
                &json!({}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"is_active\":false"));

        let (status, body) = app.call(get_req("/api/comedians?search=eli")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Eliud"));

        let (status, _) = app
            .call(json_req(Method::POST, "/api/comedians/999/toggle", &json!({})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_user_clears_flow() {
        let app = TestApp::new(None, None).await;
        let (u, _) = user::get_or_create(app.db.pool(), "255700000001")
            .await
            .unwrap();

        let request = axum::http::Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/users/{}", u.id))
            .body(Body::empty())
            .unwrap();
        let (status, _) = app.call(request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(user::find_by_phone(app.db.pool(), "255700000001")
            .await
            .unwrap()
            .is_none());

        let missing = axum::http::Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/users/{}", u.id))
            .body(Body::empty())
            .unwrap();
        let (status, _) = app.call(missing).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_vote_stats_needs_active_session() {
        let app = TestApp::new(None, None).await;

        let (status, _) = app.call(get_req("/api/vote-stats")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .call(json_req(
                Method::POST,
                "/api/voting-sessions",
                &json!({ "name": "Oktoba", "start_date": "2026-10-01 00:00:00" }),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .call(json_req(
                Method::POST,
                "/api/voting-sessions",
                &json!({ "name": "Oktoba" }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = app.call(get_req("/api/vote-stats")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Oktoba"));
    }
}
