//! In-process test doubles for the messenger and the payment provider.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use payment_gateway::{GatewayError, GatewayStatus, Initiation, StatusReport};
use whatsapp_cloud::OutgoingMessage;

use crate::error::BotError;
use crate::gateway::PaymentProvider;
use crate::messenger::Messenger;

/// A messenger that keeps every message it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<OutgoingMessage>>,
    failing: AtomicBool,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following send fail (nothing is recorded while failing).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All recorded messages, oldest first.
    pub fn messages(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Recorded messages addressed to `phone`.
    pub fn messages_to(&self, phone: &str) -> Vec<OutgoingMessage> {
        self.messages().into_iter().filter(|m| m.to == phone).collect()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<OutgoingMessage> {
        self.sent
            .lock()
            .map(|mut s| std::mem::take(&mut *s))
            .unwrap_or_default()
    }

    /// Whether any recorded message body contains `needle`.
    pub fn any_body_contains(&self, needle: &str) -> bool {
        self.messages()
            .iter()
            .any(|m| m.body_text().is_some_and(|b| b.contains(needle)))
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), BotError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BotError::SendFailed("recording messenger set to fail".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }
}

/// A payment provider with scripted answers.
///
/// Initiations succeed with transaction ids `TX1`, `TX2`, ... unless
/// [`ScriptedGateway::fail_initiation`] was called. Status checks answer
/// `pending` unless scripted per transaction.
#[derive(Debug)]
pub struct ScriptedGateway {
    initiate_error: Mutex<Option<String>>,
    statuses: Mutex<HashMap<String, Result<GatewayStatus, String>>>,
    default_status: Mutex<GatewayStatus>,
    initiations: Mutex<Vec<(String, i64)>>,
    counter: AtomicUsize,
    status_checks: AtomicUsize,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self {
            initiate_error: Mutex::new(None),
            statuses: Mutex::new(HashMap::new()),
            default_status: Mutex::new(GatewayStatus::Pending),
            initiations: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
            status_checks: AtomicUsize::new(0),
        }
    }
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the following initiations with `message`.
    pub fn fail_initiation(&self, message: &str) {
        if let Ok(mut err) = self.initiate_error.lock() {
            *err = Some(message.to_string());
        }
    }

    /// Answer `status` for `transaction_id` from now on.
    pub fn set_status(&self, transaction_id: &str, status: GatewayStatus) {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.insert(transaction_id.to_string(), Ok(status));
        }
    }

    /// Fail status checks for `transaction_id` with `message`.
    pub fn fail_status(&self, transaction_id: &str, message: &str) {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.insert(transaction_id.to_string(), Err(message.to_string()));
        }
    }

    /// Answer `status` for transactions without a scripted status.
    pub fn set_default_status(&self, status: GatewayStatus) {
        if let Ok(mut default) = self.default_status.lock() {
            *default = status;
        }
    }

    /// `(phone, amount)` of every initiation attempt.
    pub fn initiations(&self) -> Vec<(String, i64)> {
        self.initiations.lock().map(|i| i.clone()).unwrap_or_default()
    }

    /// Number of status checks made.
    pub fn status_checks(&self) -> usize {
        self.status_checks.load(Ordering::SeqCst)
    }

    /// Transaction id handed out by the latest successful initiation.
    pub fn last_transaction_id(&self) -> Option<String> {
        match self.counter.load(Ordering::SeqCst) {
            0 => None,
            n => Some(format!("TX{}", n)),
        }
    }
}

#[async_trait]
impl PaymentProvider for ScriptedGateway {
    async fn initiate(
        &self,
        phone_number: &str,
        amount: i64,
        _package_id: Option<&str>,
    ) -> payment_gateway::Result<Initiation> {
        if let Ok(mut initiations) = self.initiations.lock() {
            initiations.push((phone_number.to_string(), amount));
        }

        let rejected = self.initiate_error.lock().ok().and_then(|e| e.clone());
        if let Some(message) = rejected {
            return Err(GatewayError::Rejected { message });
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Initiation {
            transaction_id: format!("TX{}", n),
            reference: Some(format!("REF{}", n)),
            raw: format!(r#"{{"code":200,"order":"TX{}"}}"#, n),
        })
    }

    async fn check_status(
        &self,
        transaction_id: &str,
        _reference_id: Option<&str>,
    ) -> payment_gateway::Result<StatusReport> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);

        let scripted = self
            .statuses
            .lock()
            .ok()
            .and_then(|s| s.get(transaction_id).cloned());
        let status = match scripted {
            Some(Ok(status)) => status,
            Some(Err(message)) => return Err(GatewayError::Rejected { message }),
            None => self
                .default_status
                .lock()
                .map(|s| *s)
                .unwrap_or(GatewayStatus::Pending),
        };

        Ok(StatusReport {
            transaction_id: transaction_id.to_string(),
            status,
            gateway_status: status.as_str().to_string(),
            raw: format!(r#"{{"code":200,"data":{{"status":"{}"}}}}"#, status),
        })
    }
}
