//! Conversation sessions.
//!
//! A session is the per-phone record of where a user is in the voting flow.
//! Entries live in memory and expire after a fixed idle time; the votes and
//! payments they point at live in the database. [`SessionManager`] is the
//! only place that reads or clears both together.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use database::lifecycle::{self, ClearedFlow};
use database::{vote, Database};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::Result;

/// Step of the voting flow a session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Comedian chosen, waiting for a tier.
    QuantitySelection,
    /// Paid tier chosen, waiting for the number to charge.
    WaitingForPaymentPhone,
    /// Charge initiated, waiting for the gateway.
    ProcessingPayment,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuantitySelection => "quantity_selection",
            Self::WaitingForPaymentPhone => "waiting_for_payment_phone",
            Self::ProcessingPayment => "processing_payment",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one user's flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub comedian_id: i64,
    pub vote_id: i64,
    pub step: Step,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<i64>,
}

impl SessionEntry {
    /// A fresh session right after a comedian was picked.
    pub fn new(comedian_id: i64, vote_id: i64) -> Self {
        Self {
            comedian_id,
            vote_id,
            step: Step::QuantitySelection,
            payment_id: None,
        }
    }

    /// Same session at another step.
    pub fn at(mut self, step: Step) -> Self {
        self.step = step;
        self
    }

    /// Same session linked to a payment.
    pub fn with_payment(mut self, payment_id: i64) -> Self {
        self.payment_id = Some(payment_id);
        self
    }
}

/// Volatile per-phone session entries with a fixed time-to-live.
///
/// The TTL restarts on every write.
pub struct SessionStore {
    entries: RwLock<HashMap<String, (SessionEntry, Instant)>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create an empty store whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Get the live entry for a phone, dropping it if it has expired.
    pub async fn get(&self, phone: &str) -> Option<SessionEntry> {
        {
            let entries = self.entries.read().await;
            match entries.get(phone) {
                None => return None,
                Some((entry, expires_at)) if *expires_at > Instant::now() => {
                    return Some(entry.clone())
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(phone)
            .is_some_and(|(_, expires_at)| *expires_at <= Instant::now())
        {
            entries.remove(phone);
            debug!(phone = %phone, "Session expired");
        }
        None
    }

    /// Store an entry for a phone, replacing any previous one.
    pub async fn set(&self, phone: &str, entry: SessionEntry) {
        let expires_at = Instant::now() + self.ttl;
        self.entries
            .write()
            .await
            .insert(phone.to_string(), (entry, expires_at));
    }

    /// Remove the entry for a phone. Returns whether one existed.
    pub async fn delete(&self, phone: &str) -> bool {
        self.entries.write().await.remove(phone).is_some()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        before - entries.len()
    }

    /// Number of stored entries, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Owns everything that makes up "an ongoing flow" for a phone: the session
/// entry and the open, unpaid votes in the database.
pub struct SessionManager {
    store: SessionStore,
    database: Database,
}

impl SessionManager {
    pub fn new(database: Database, ttl: Duration) -> Self {
        Self {
            store: SessionStore::new(ttl),
            database,
        }
    }

    pub async fn get(&self, phone: &str) -> Option<SessionEntry> {
        self.store.get(phone).await
    }

    pub async fn set(&self, phone: &str, entry: SessionEntry) {
        debug!(phone = %phone, step = %entry.step, vote_id = entry.vote_id, "Session set");
        self.store.set(phone, entry).await;
    }

    /// True while the phone has a live session entry or an unpaid vote that
    /// is still open (no payment yet, or payment pending/initiated).
    pub async fn has_ongoing(&self, phone: &str) -> Result<bool> {
        if self.store.get(phone).await.is_some() {
            return Ok(true);
        }
        Ok(vote::has_open_unpaid(self.database.pool(), phone).await?)
    }

    /// Abandon the phone's flow: cancel its open payments, delete its
    /// provisional votes, and drop the session entry.
    pub async fn clear(&self, phone: &str) -> Result<ClearedFlow> {
        let cleared = lifecycle::clear_open_flow(self.database.pool(), phone).await?;
        let had_entry = self.store.delete(phone).await;

        info!(
            phone = %phone,
            had_entry,
            cancelled_payments = cleared.cancelled_payments,
            deleted_votes = cleared.deleted_votes,
            "Session cleared"
        );
        Ok(cleared)
    }

    /// Drop the session entry once its flow reached a terminal state.
    pub async fn finish(&self, phone: &str) {
        if self.store.delete(phone).await {
            debug!(phone = %phone, "Session finished");
        }
    }

    /// Drop the session entry only if it still tracks `vote_id`.
    ///
    /// Used by payment resolution, which may run after the user moved on.
    pub async fn finish_vote(&self, phone: &str, vote_id: i64) {
        if self.store.get(phone).await.is_some_and(|e| e.vote_id == vote_id) {
            self.finish(phone).await;
        }
    }

    /// Delete a user and everything that keeps a flow of theirs alive.
    ///
    /// Returns the deleted user's phone number.
    pub async fn delete_user(&self, user_id: i64) -> Result<String> {
        let phone = lifecycle::delete_user_with_flow(self.database.pool(), user_id).await?;
        self.store.delete(&phone).await;
        Ok(phone)
    }

    /// Drop expired session entries.
    pub async fn purge_expired(&self) -> usize {
        self.store.purge_expired().await
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::{comedian, payment, user, voting_session};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn provisional_vote(db: &Database, phone: &str) -> (i64, i64) {
        let c = comedian::create_comedian(db.pool(), "Eliud", None).await.unwrap();
        let s = voting_session::create_session_from_now(db.pool(), "Mwezi", 30, 35)
            .await
            .unwrap();
        let v = vote::create_provisional(db.pool(), c.id, s.id, phone, 1000)
            .await
            .unwrap();
        (c.id, v.id)
    }

    #[test]
    fn test_step_names() {
        assert_eq!(Step::QuantitySelection.as_str(), "quantity_selection");
        assert_eq!(
            serde_json::to_value(Step::WaitingForPaymentPhone).unwrap(),
            "waiting_for_payment_phone"
        );
        assert_eq!(Step::ProcessingPayment.to_string(), "processing_payment");
    }

    #[tokio::test]
    async fn test_store_set_get_delete() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert!(store.get("255700000001").await.is_none());

        store.set("255700000001", SessionEntry::new(1, 2)).await;
        let entry = store.get("255700000001").await.unwrap();
        assert_eq!(entry.step, Step::QuantitySelection);
        assert_eq!(entry.vote_id, 2);

        assert!(store.delete("255700000001").await);
        assert!(!store.delete("255700000001").await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_entries_expire() {
        let store = SessionStore::new(Duration::from_millis(20));
        store.set("255700000001", SessionEntry::new(1, 2)).await;
        store.set("255700000002", SessionEntry::new(1, 3)).await;

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(store.get("255700000001").await.is_none());
        assert_eq!(store.len().await, 1);
        assert_eq!(store.purge_expired().await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_has_ongoing_from_either_source() {
        let db = test_db().await;
        let sessions = SessionManager::new(db.clone(), Duration::from_secs(60));

        assert!(!sessions.has_ongoing("255700000001").await.unwrap());

        sessions.set("255700000001", SessionEntry::new(1, 1)).await;
        assert!(sessions.has_ongoing("255700000001").await.unwrap());
        sessions.finish("255700000001").await;
        assert!(!sessions.has_ongoing("255700000001").await.unwrap());

        // An open unpaid vote alone counts as ongoing.
        provisional_vote(&db, "255700000001").await;
        assert!(sessions.has_ongoing("255700000001").await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_touches_both_sources() {
        let db = test_db().await;
        let sessions = SessionManager::new(db.clone(), Duration::from_secs(60));
        let (comedian_id, vote_id) = provisional_vote(&db, "255700000001").await;
        let p = payment::create_pending(db.pool(), vote_id, 2000, "255712345678")
            .await
            .unwrap();
        sessions
            .set(
                "255700000001",
                SessionEntry::new(comedian_id, vote_id)
                    .at(Step::ProcessingPayment)
                    .with_payment(p.id),
            )
            .await;

        let cleared = sessions.clear("255700000001").await.unwrap();
        assert_eq!(cleared.cancelled_payments, 1);
        assert!(!sessions.has_ongoing("255700000001").await.unwrap());
        assert!(sessions.get("255700000001").await.is_none());

        let p = payment::get_payment(db.pool(), p.id).await.unwrap();
        assert_eq!(p.status, "cancelled");
    }

    #[tokio::test]
    async fn test_delete_user_ends_session() {
        let db = test_db().await;
        let sessions = SessionManager::new(db.clone(), Duration::from_secs(60));
        let (u, _) = user::get_or_create(db.pool(), "255700000001").await.unwrap();
        let (comedian_id, vote_id) = provisional_vote(&db, "255700000001").await;
        sessions
            .set("255700000001", SessionEntry::new(comedian_id, vote_id))
            .await;

        let phone = sessions.delete_user(u.id).await.unwrap();
        assert_eq!(phone, "255700000001");
        assert!(!sessions.has_ongoing("255700000001").await.unwrap());
        assert!(user::find_by_phone(db.pool(), "255700000001")
            .await
            .unwrap()
            .is_none());
    }
}
