//! Gateway request/response types and status vocabulary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request `code` for initiating a charge.
pub const CODE_INITIATE: u32 = 104;
/// Request `code` for checking a charge.
pub const CODE_STATUS: u32 = 105;
/// Application-level success code in responses.
pub const CODE_OK: i64 = 200;

/// Envelope of every gateway request.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayRequest<T: Serialize> {
    pub api: u32,
    pub code: u32,
    pub data: T,
}

/// Payload for [`CODE_INITIATE`].
#[derive(Debug, Clone, Serialize)]
pub struct InitiateData<'a> {
    pub api_key: &'a str,
    pub order_id: &'a str,
    pub amount: i64,
    pub is_live: bool,
    pub phone_number: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<&'a str>,
}

/// Payload for [`CODE_STATUS`].
#[derive(Debug, Clone, Serialize)]
pub struct StatusData<'a> {
    pub api_key: &'a str,
    pub order_id: &'a str,
    pub reference_id: &'a str,
}

/// Loosely typed gateway response. Fields vary by operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayResponse {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    /// Processor details; sometimes a JSON object, sometimes a JSON string.
    #[serde(default)]
    pub selcom: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl GatewayResponse {
    pub fn is_ok(&self) -> bool {
        self.code == Some(CODE_OK)
    }

    /// Error message for a rejected request.
    pub fn error_message(&self) -> String {
        self.message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "Unknown error".to_string())
    }

    /// Processor reference, from `selcom.reference` whether `selcom` is an
    /// object or an encoded string.
    pub fn reference(&self) -> Option<String> {
        let selcom = match self.selcom.as_ref()? {
            Value::String(s) => serde_json::from_str::<Value>(s).ok()?,
            other => other.clone(),
        };

        selcom
            .get("reference")
            .and_then(Value::as_str)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
    }

    /// Raw status string from `data.status`.
    pub fn gateway_status(&self) -> String {
        self.data
            .as_ref()
            .and_then(|d| d.get("status"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string()
    }
}

/// Internal view of a gateway status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStatus {
    Paid,
    Pending,
    Failed,
    Cancelled,
    Expired,
    Unknown,
}

impl GatewayStatus {
    /// Map the gateway's vocabulary (case-insensitive). Unmapped values are `Unknown`.
    pub fn from_gateway(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            "completed" | "success" => Self::Paid,
            "pending" => Self::Pending,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            "expired" => Self::Expired,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A charge the gateway accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initiation {
    /// Order id we generated; identifies the charge in later calls.
    pub transaction_id: String,
    /// Processor reference, when returned.
    pub reference: Option<String>,
    /// Raw response body for audit.
    pub raw: String,
}

/// Outcome of a status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub transaction_id: String,
    pub status: GatewayStatus,
    /// Status string as the gateway sent it.
    pub gateway_status: String,
    /// Raw response body for audit.
    pub raw: String,
}

/// Order id carried by an asynchronous gateway notification, either at the
/// top level or under `data`.
pub fn callback_order_id(body: &Value) -> Option<String> {
    body.get("order_id")
        .or_else(|| body.get("data").and_then(|d| d.get("order_id")))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_mapping() {
        assert_eq!(GatewayStatus::from_gateway("completed"), GatewayStatus::Paid);
        assert_eq!(GatewayStatus::from_gateway("SUCCESS"), GatewayStatus::Paid);
        assert_eq!(GatewayStatus::from_gateway("Pending"), GatewayStatus::Pending);
        assert_eq!(GatewayStatus::from_gateway("failed"), GatewayStatus::Failed);
        assert_eq!(GatewayStatus::from_gateway("cancelled"), GatewayStatus::Cancelled);
        assert_eq!(GatewayStatus::from_gateway("expired"), GatewayStatus::Expired);
        assert_eq!(GatewayStatus::from_gateway("refunded"), GatewayStatus::Unknown);
        assert_eq!(GatewayStatus::from_gateway(""), GatewayStatus::Unknown);
    }

    #[test]
    fn test_reference_from_string_or_object() {
        let encoded = GatewayResponse {
            selcom: Some(json!("{\"reference\":\"S123\"}")),
            ..Default::default()
        };
        assert_eq!(encoded.reference().as_deref(), Some("S123"));

        let object = GatewayResponse {
            selcom: Some(json!({ "reference": "S456" })),
            ..Default::default()
        };
        assert_eq!(object.reference().as_deref(), Some("S456"));

        let garbage = GatewayResponse {
            selcom: Some(json!("not json")),
            ..Default::default()
        };
        assert_eq!(garbage.reference(), None);
        assert_eq!(GatewayResponse::default().reference(), None);
    }

    #[test]
    fn test_callback_order_id() {
        assert_eq!(
            callback_order_id(&json!({ "order_id": "abc" })).as_deref(),
            Some("abc")
        );
        assert_eq!(
            callback_order_id(&json!({ "data": { "order_id": "def" } })).as_deref(),
            Some("def")
        );
        assert_eq!(callback_order_id(&json!({ "order_id": "" })), None);
        assert_eq!(callback_order_id(&json!({})), None);
    }
}
