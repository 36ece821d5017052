//! Payment gateway HTTP client.

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::types::{
    GatewayRequest, GatewayResponse, GatewayStatus, InitiateData, Initiation, StatusData,
    StatusReport, CODE_INITIATE, CODE_STATUS,
};

/// Client for the mobile-money gateway.
///
/// One call per operation, no retries. Both operations are safe to repeat:
/// a status check never changes gateway state.
#[derive(Clone)]
pub struct GatewayClient {
    http: Client,
    config: GatewayConfig,
}

impl GatewayClient {
    /// Build a client from configuration.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(GatewayError::Config("api_key is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GatewayError::Http)?;

        Ok(Self { http, config })
    }

    /// Start a mobile-money charge against `phone_number`.
    ///
    /// A fresh order id is generated per call and returned as the
    /// transaction id.
    pub async fn initiate(
        &self,
        phone_number: &str,
        amount: i64,
        package_id: Option<&str>,
    ) -> Result<Initiation> {
        let order_id = uuid::Uuid::new_v4().simple().to_string();

        let request = GatewayRequest {
            api: self.config.api_id,
            code: CODE_INITIATE,
            data: InitiateData {
                api_key: &self.config.api_key,
                order_id: &order_id,
                amount,
                is_live: self.config.is_live,
                phone_number,
                webhook_url: self.config.webhook_url.as_deref(),
            },
        };

        debug!(order_id = %order_id, amount, package = ?package_id, "Initiating payment");
        let body = self.post(&request).await?;
        let initiation = parse_initiate_response(&order_id, &body)?;

        info!(
            transaction_id = %initiation.transaction_id,
            reference = ?initiation.reference,
            amount,
            "Payment initiated"
        );
        Ok(initiation)
    }

    /// Ask the gateway for the current status of a charge.
    ///
    /// `reference_id` defaults to the transaction id.
    pub async fn check_status(
        &self,
        transaction_id: &str,
        reference_id: Option<&str>,
    ) -> Result<StatusReport> {
        let request = GatewayRequest {
            api: self.config.api_id,
            code: CODE_STATUS,
            data: StatusData {
                api_key: &self.config.api_key,
                order_id: transaction_id,
                reference_id: reference_id.unwrap_or(transaction_id),
            },
        };

        let body = self.post(&request).await?;
        let report = parse_status_response(transaction_id, &body)?;

        info!(
            transaction_id = %transaction_id,
            gateway_status = %report.gateway_status,
            status = %report.status,
            "Payment status checked"
        );
        Ok(report)
    }

    /// Get the configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn post<T: Serialize>(&self, request: &T) -> Result<String> {
        let response = self
            .http
            .post(&self.config.api_url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!("Payment gateway request failed: {}", e);
                GatewayError::Http(e)
            })?;

        response.text().await.map_err(GatewayError::Http)
    }
}

/// Interpret an initiation response body.
pub fn parse_initiate_response(order_id: &str, body: &str) -> Result<Initiation> {
    let response: GatewayResponse = serde_json::from_str(body)?;

    if !response.is_ok() {
        let message = response.error_message();
        warn!(order_id = %order_id, "Payment initiation rejected: {}", message);
        return Err(GatewayError::Rejected { message });
    }

    Ok(Initiation {
        transaction_id: order_id.to_string(),
        reference: response.reference(),
        raw: body.to_string(),
    })
}

/// Interpret a status response body.
pub fn parse_status_response(transaction_id: &str, body: &str) -> Result<StatusReport> {
    let response: GatewayResponse = serde_json::from_str(body)?;

    if !response.is_ok() {
        let message = response.error_message();
        warn!(transaction_id = %transaction_id, "Payment status check rejected: {}", message);
        return Err(GatewayError::Rejected { message });
    }

    let gateway_status = response.gateway_status();
    Ok(StatusReport {
        transaction_id: transaction_id.to_string(),
        status: GatewayStatus::from_gateway(&gateway_status),
        gateway_status,
        raw: body.to_string(),
    })
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("config", &self.config)
            .finish()
    }
}
