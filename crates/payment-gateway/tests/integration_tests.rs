//! Integration tests for payment-gateway.
//!
//! These never reach the real gateway: they cover configuration, request
//! shapes, response parsing, and the client against a local mock server.

use payment_gateway::client::{parse_initiate_response, parse_status_response};
use payment_gateway::types::{GatewayRequest, InitiateData, StatusData, CODE_INITIATE, CODE_STATUS};
use payment_gateway::{GatewayClient, GatewayConfig, GatewayError, GatewayStatus};
use std::time::Duration;

use mockito::Matcher;
use serde_json::json;

mod config_tests {
    use super::*;

    #[test]
    fn test_gateway_config_new() {
        let config = GatewayConfig::new("key");
        assert_eq!(config.api_url, "https://swahiliesapi.invict.site/Api");
        assert_eq!(config.api_id, 170);
        assert!(config.is_live);
        assert!(config.webhook_url.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_gateway_config_builders() {
        let config = GatewayConfig::new("key")
            .with_api_url("http://127.0.0.1:9100/Api")
            .with_webhook_url("https://bot.example.com/webhook/payment");
        assert_eq!(config.api_url, "http://127.0.0.1:9100/Api");
        assert_eq!(
            config.webhook_url.as_deref(),
            Some("https://bot.example.com/webhook/payment")
        );
    }

    #[test]
    fn test_gateway_config_debug_redacts_key() {
        let debug = format!("{:?}", GatewayConfig::new("very-secret-key"));
        assert!(!debug.contains("very-secret-key"));
    }

    #[test]
    fn test_client_requires_key() {
        assert!(matches!(
            GatewayClient::new(GatewayConfig::new("")),
            Err(GatewayError::Config(_))
        ));
        assert!(GatewayClient::new(GatewayConfig::new("key")).is_ok());
    }
}

mod request_tests {
    use super::*;

    #[test]
    fn test_initiate_request_shape() {
        let request = GatewayRequest {
            api: 170,
            code: CODE_INITIATE,
            data: InitiateData {
                api_key: "key",
                order_id: "9f2c",
                amount: 2000,
                is_live: true,
                phone_number: "255712345678",
                webhook_url: Some("https://bot.example.com/webhook/payment"),
            },
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "api": 170,
                "code": 104,
                "data": {
                    "api_key": "key",
                    "order_id": "9f2c",
                    "amount": 2000,
                    "is_live": true,
                    "phone_number": "255712345678",
                    "webhook_url": "https://bot.example.com/webhook/payment"
                }
            })
        );
    }

    #[test]
    fn test_status_request_shape() {
        let request = GatewayRequest {
            api: 170,
            code: CODE_STATUS,
            data: StatusData {
                api_key: "key",
                order_id: "9f2c",
                reference_id: "9f2c",
            },
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["code"], 105);
        assert_eq!(value["data"]["reference_id"], "9f2c");
    }
}

mod response_tests {
    use super::*;

    #[test]
    fn test_initiate_success() {
        let body = r#"{"code":200,"message":"ok","selcom":"{\"reference\":\"S0012\",\"resultcode\":\"000\"}"}"#;
        let initiation = parse_initiate_response("order-1", body).unwrap();

        assert_eq!(initiation.transaction_id, "order-1");
        assert_eq!(initiation.reference.as_deref(), Some("S0012"));
        assert_eq!(initiation.raw, body);
    }

    #[test]
    fn test_initiate_rejected() {
        let body = r#"{"code":400,"message":"Invalid phone number"}"#;
        match parse_initiate_response("order-1", body) {
            Err(GatewayError::Rejected { message }) => assert_eq!(message, "Invalid phone number"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_initiate_bad_json() {
        assert!(matches!(
            parse_initiate_response("order-1", "<html>502</html>"),
            Err(GatewayError::Json(_))
        ));
    }

    #[test]
    fn test_status_mapping_from_body() {
        let cases = [
            ("COMPLETED", GatewayStatus::Paid),
            ("success", GatewayStatus::Paid),
            ("pending", GatewayStatus::Pending),
            ("failed", GatewayStatus::Failed),
            ("cancelled", GatewayStatus::Cancelled),
            ("expired", GatewayStatus::Expired),
            ("reversed", GatewayStatus::Unknown),
        ];

        for (raw, expected) in cases {
            let body = json!({ "code": 200, "data": { "status": raw } }).to_string();
            let report = parse_status_response("order-1", &body).unwrap();
            assert_eq!(report.status, expected, "gateway status {}", raw);
            assert_eq!(report.gateway_status, raw);
        }
    }

    #[test]
    fn test_status_missing_is_unknown() {
        let report = parse_status_response("order-1", r#"{"code":200,"data":{}}"#).unwrap();
        assert_eq!(report.status, GatewayStatus::Unknown);
        assert_eq!(report.gateway_status, "unknown");
    }

    #[test]
    fn test_status_rejected() {
        assert!(matches!(
            parse_status_response("order-1", r#"{"code":404,"message":"Order not found"}"#),
            Err(GatewayError::Rejected { .. })
        ));
    }
}

mod http_tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> GatewayClient {
        GatewayClient::new(GatewayConfig::new("key").with_api_url(format!("{}/Api", server.url())))
            .unwrap()
    }

    #[tokio::test]
    async fn test_initiate_over_http() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/Api")
            .match_body(Matcher::PartialJson(json!({
                "api": 170,
                "code": 104,
                "data": { "api_key": "key", "amount": 2000, "phone_number": "255712345678" }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":200,"message":"ok","selcom":{"reference":"S0012"}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let initiation = client.initiate("255712345678", 2000, None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(initiation.transaction_id.len(), 32);
        assert_eq!(initiation.reference.as_deref(), Some("S0012"));
    }

    #[tokio::test]
    async fn test_check_status_over_http() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/Api")
            .match_body(Matcher::PartialJson(json!({
                "code": 105,
                "data": { "order_id": "order-1", "reference_id": "S0012" }
            })))
            .with_status(200)
            .with_body(r#"{"code":200,"data":{"status":"COMPLETED"}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let report = client.check_status("order-1", Some("S0012")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(report.status, GatewayStatus::Paid);
        assert_eq!(report.gateway_status, "COMPLETED");
    }

    #[tokio::test]
    async fn test_rejected_code_over_http() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/Api")
            .with_status(200)
            .with_body(r#"{"code":400,"message":"Insufficient balance"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        match client.initiate("255712345678", 1000, None).await {
            Err(GatewayError::Rejected { message }) => assert_eq!(message, "Insufficient balance"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_over_http() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/Api")
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create_async()
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.check_status("order-1", None).await,
            Err(GatewayError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client =
            GatewayClient::new(GatewayConfig::new("key").with_api_url(format!("http://{}/Api", addr)))
                .unwrap();
        assert!(matches!(
            client.check_status("order-1", None).await,
            Err(GatewayError::Http(_))
        ));
    }

    #[tokio::test]
    async fn test_request_times_out() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = GatewayClient::new(
            GatewayConfig::new("key")
                .with_api_url(format!("http://{}/Api", addr))
                .with_timeout(Duration::from_millis(200)),
        )
        .unwrap();

        match client.check_status("order-1", None).await {
            Err(GatewayError::Http(e)) => assert!(e.is_timeout()),
            other => panic!("unexpected result: {:?}", other),
        }
        server.abort();
    }
}
