//! Payment provider trait.

use async_trait::async_trait;
use payment_gateway::{GatewayClient, Initiation, StatusReport};

/// Initiates mobile-money charges and reports their status.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Start a charge against `phone_number`.
    async fn initiate(
        &self,
        phone_number: &str,
        amount: i64,
        package_id: Option<&str>,
    ) -> payment_gateway::Result<Initiation>;

    /// Current status of a charge.
    async fn check_status(
        &self,
        transaction_id: &str,
        reference_id: Option<&str>,
    ) -> payment_gateway::Result<StatusReport>;
}

#[async_trait]
impl PaymentProvider for GatewayClient {
    async fn initiate(
        &self,
        phone_number: &str,
        amount: i64,
        package_id: Option<&str>,
    ) -> payment_gateway::Result<Initiation> {
        GatewayClient::initiate(self, phone_number, amount, package_id).await
    }

    async fn check_status(
        &self,
        transaction_id: &str,
        reference_id: Option<&str>,
    ) -> payment_gateway::Result<StatusReport> {
        GatewayClient::check_status(self, transaction_id, reference_id).await
    }
}
