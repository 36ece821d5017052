//! Scheduled payment status checks.
//!
//! Checks are rows in `payment_checks`, so they survive restarts. The worker
//! polls for due rows, leases each one, and resolves its payment through the
//! dispatcher like any other trigger. A row is only removed once its payment
//! is settled or the worker gives up on it.

use std::sync::Arc;
use std::time::Duration;

use database::{payment_check, DatabaseError};
use payment_gateway::GatewayStatus;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::dispatcher::{CheckTrigger, Dispatcher, Resolution};
use crate::error::{BotError, Result};

/// Polls and runs due payment checks.
pub struct PaymentCheckWorker {
    dispatcher: Arc<Dispatcher>,
    poll_interval: Duration,
    lease: Duration,
    batch_size: i64,
}

/// How long a claimed check stays hidden from other polls. Longer than a
/// gateway status request can take.
const CHECK_LEASE: Duration = Duration::from_secs(120);

impl PaymentCheckWorker {
    /// Create a worker polling at the dispatcher's configured interval.
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        let poll_interval = dispatcher.config().payment_check_poll;
        Self {
            dispatcher,
            poll_interval,
            lease: CHECK_LEASE,
            batch_size: 20,
        }
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run every check that is due now. Returns how many were run.
    pub async fn run_once(&self) -> Result<usize> {
        let pool = self.dispatcher.database().pool();
        let config = self.dispatcher.config();
        let due = payment_check::due(pool, self.batch_size).await?;
        let mut ran = 0;

        for check in due {
            if !payment_check::claim(pool, check.payment_id, self.lease.as_secs()).await? {
                debug!(payment_id = check.payment_id, "Check claimed elsewhere");
                continue;
            }
            ran += 1;

            let attempt = check.attempts + 1;
            let outcome = self
                .dispatcher
                .resolve_payment(check.payment_id, CheckTrigger::Scheduled { attempt })
                .await;

            // Unknown answers (including gateway errors) are not capped; the
            // payment expiry ends them.
            let again = match outcome {
                Ok(Resolution::StillPending(GatewayStatus::Unknown)) => true,
                Ok(Resolution::StillPending(_)) => {
                    if attempt >= config.payment_max_checks {
                        warn!(payment_id = check.payment_id, attempt, "Giving up scheduled checks");
                    }
                    attempt < config.payment_max_checks
                }
                Ok(resolution) => {
                    debug!(payment_id = check.payment_id, resolution = ?resolution, "Check finished");
                    false
                }
                Err(BotError::Database(DatabaseError::NotFound { .. })) => {
                    debug!(payment_id = check.payment_id, "Payment no longer exists");
                    false
                }
                Err(e) => {
                    error!(payment_id = check.payment_id, attempt, "Payment check failed: {}", e);
                    attempt < config.payment_max_checks
                }
            };

            if again {
                payment_check::schedule(
                    pool,
                    check.payment_id,
                    config.payment_check_delay.as_secs(),
                    attempt,
                )
                .await?;
            } else {
                payment_check::remove(pool, check.payment_id).await?;
            }
        }

        Ok(ran)
    }

    /// Poll forever.
    pub async fn run(self) {
        let mut ticker = interval(self.poll_interval);
        info!(poll_interval = ?self.poll_interval, "Starting payment check worker");

        loop {
            ticker.tick().await;

            match self.run_once().await {
                Ok(0) => {}
                Ok(n) => debug!(checks = n, "Ran payment checks"),
                Err(e) => error!("Error polling payment checks: {}", e),
            }

            let purged = self.dispatcher.sessions().purge_expired().await;
            if purged > 0 {
                debug!(purged, "Purged expired sessions");
            }
        }
    }

    /// Run the worker on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
