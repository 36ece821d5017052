//! Conversation dispatcher.
//!
//! Turns inbound WhatsApp events into state transitions, database writes,
//! and replies. The state of a phone is its session entry (if any):
//!
//! ```text
//! IDLE ──comedian──▶ QUANTITY_SELECTION ──paid tier──▶ WAITING_FOR_PAYMENT_PHONE
//!   ▲                      │                                   │ valid number
//!   │                  free tier                               ▼
//!   └──── paid / failed / cancelled / expired ◀──────── PROCESSING_PAYMENT
//! ```
//!
//! `#` (or "Futa Session") returns to IDLE from anywhere. Payment outcomes
//! go through [`Dispatcher::resolve_payment`], shared by manual checks,
//! the "Nimelipa" button, gateway callbacks, and the scheduled-check worker.

use std::sync::Arc;

use database::validation::validate_payment_phone;
use database::{
    ad, comedian, lifecycle, payment, payment_check, user, video, vote, voting_session,
};
use database::{Comedian, Database, DatabaseError, Payment, PaymentStatus, User, Vote};
use payment_gateway::{callback_order_id, GatewayStatus};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use whatsapp_cloud::{InboundEvent, OutgoingMessage, WebhookPayload};

use crate::catalog::{self, ComedianRef, Tier};
use crate::command::{self, Command};
use crate::config::BotConfig;
use crate::error::Result;
use crate::gateway::PaymentProvider;
use crate::menu;
use crate::messenger::Messenger;
use crate::session::{SessionEntry, SessionManager, Step};
use crate::tickets::generate_code;

/// What asked for a payment to be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckTrigger {
    /// Scheduled check number `attempt`, starting at 1.
    Scheduled { attempt: i64 },
    /// `status` / `hali` / `check` text.
    Manual,
    /// "Nimelipa" button.
    Confirmed,
    /// Gateway callback.
    Callback,
}

impl CheckTrigger {
    /// Whether a still-pending outcome re-prompts the user.
    fn prompts_when_pending(&self) -> bool {
        match self {
            Self::Scheduled { attempt } => *attempt == 1,
            Self::Manual | Self::Confirmed => true,
            Self::Callback => false,
        }
    }
}

/// Outcome of resolving a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Settled by this call; tickets were issued.
    Paid { ticket_codes: Vec<String> },
    /// Closed by this call as failed, cancelled, or expired.
    Closed(PaymentStatus),
    /// The gateway has no final answer yet.
    StillPending(GatewayStatus),
    /// The payment was already terminal.
    AlreadyFinal(PaymentStatus),
}

/// Drives the voting conversation for every phone.
pub struct Dispatcher {
    database: Database,
    sessions: SessionManager,
    messenger: Arc<dyn Messenger>,
    payments: Arc<dyn PaymentProvider>,
    config: BotConfig,
}

impl Dispatcher {
    pub fn new(
        database: Database,
        messenger: Arc<dyn Messenger>,
        payments: Arc<dyn PaymentProvider>,
        config: BotConfig,
    ) -> Self {
        let sessions = SessionManager::new(database.clone(), config.session_ttl);
        Self {
            database,
            sessions,
            messenger,
            payments,
            config,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Handle every message of a webhook delivery, in order.
    ///
    /// A failing message does not stop the rest; the first error is
    /// returned after all messages were tried.
    pub async fn handle_payload(&self, payload: &WebhookPayload) -> Result<usize> {
        let events = payload.events();
        let mut first_error = None;

        for event in &events {
            if let Err(e) = self.handle_event(event).await {
                error!(
                    phone = %event.from,
                    message_id = %event.message_id,
                    "Failed to handle message: {}",
                    e
                );
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(events.len()),
        }
    }

    /// Handle one inbound message.
    pub async fn handle_event(&self, event: &InboundEvent) -> Result<()> {
        let phone = event.from.as_str();
        let command = command::parse(&event.kind);
        info!(phone = %phone, message_id = %event.message_id, command = ?command, "Inbound message");

        let (user, _) = user::get_or_create(self.database.pool(), phone).await?;

        match command {
            Command::Clear => self.clear_and_welcome(&user).await,
            Command::CheckStatus => self.manual_status_check(phone).await,
            Command::ConfirmPayment(tx) => self.confirm_payment(phone, &tx).await,
            Command::CancelPayment(tx) => self.cancel_payment(&user, &tx).await,
            Command::StartVoting => self.start_voting(phone).await,
            Command::PlayAgain => self.welcome_or_ongoing(&user).await,
            Command::SelectComedian(comedian) => self.select_comedian(&user, &comedian).await,
            Command::SelectQuantity(quantity) => self.select_quantity(&user, quantity).await,
            Command::Text(text) => self.handle_text(&user, &text).await,
            Command::Unknown(id) => {
                debug!(phone = %phone, id = %id, "Unrecognised input");
                self.welcome_or_ongoing(&user).await
            }
        }
    }

    async fn handle_text(&self, user: &User, text: &str) -> Result<()> {
        let phone = user.phone_number.as_str();

        match self.sessions.get(phone).await {
            Some(entry) if entry.step == Step::WaitingForPaymentPhone => {
                self.take_payment_phone(phone, entry, text).await
            }
            Some(_) => {
                self.send(menu::ongoing_session(phone)).await;
                Ok(())
            }
            None => self.welcome_or_ongoing(user).await,
        }
    }

    /// Welcome when idle; otherwise remind the user a flow is in progress.
    async fn welcome_or_ongoing(&self, user: &User) -> Result<()> {
        if self.sessions.has_ongoing(&user.phone_number).await? {
            self.send(menu::ongoing_session(&user.phone_number)).await;
            return Ok(());
        }
        self.send_welcome(user).await
    }

    async fn send_welcome(&self, user: &User) -> Result<()> {
        let pool = self.database.pool();
        let phone = user.phone_number.as_str();

        self.send(menu::welcome(phone, user.is_first_time)).await;

        if user.is_first_time || self.config.welcome_videos_for_returning {
            for v in video::list_active(pool).await? {
                self.send(menu::welcome_video(phone, &v)).await;
            }
        }

        if user.is_first_time {
            user::mark_welcomed(pool, phone).await?;
        }
        Ok(())
    }

    async fn clear_and_welcome(&self, user: &User) -> Result<()> {
        self.sessions.clear(&user.phone_number).await?;
        self.send(menu::session_cleared(&user.phone_number)).await;
        self.send_welcome(user).await
    }

    async fn start_voting(&self, phone: &str) -> Result<()> {
        self.sessions.clear(phone).await?;
        self.send_comedian_list(phone).await
    }

    async fn send_comedian_list(&self, phone: &str) -> Result<()> {
        let comedians = comedian::list_active(self.database.pool()).await?;
        if comedians.is_empty() {
            self.send(menu::no_comedians(phone)).await;
        } else {
            self.send(menu::comedian_list(phone, &comedians)).await;
        }
        Ok(())
    }

    /// Find the active comedian a list row refers to.
    pub async fn resolve_comedian(&self, reference: &ComedianRef) -> Result<Option<Comedian>> {
        let pool = self.database.pool();

        match reference {
            ComedianRef::Id(id) => match comedian::get_comedian(pool, *id).await {
                Ok(c) if c.is_active => Ok(Some(c)),
                Ok(_) | Err(DatabaseError::NotFound { .. }) => Ok(None),
                Err(e) => Err(e.into()),
            },
            ComedianRef::Slug(slug) => Ok(comedian::list_active(pool)
                .await?
                .into_iter()
                .find(|c| catalog::slugify(&c.name) == *slug)),
        }
    }

    async fn select_comedian(&self, user: &User, reference: &ComedianRef) -> Result<()> {
        let pool = self.database.pool();
        let phone = user.phone_number.as_str();

        let past_selection = self
            .sessions
            .get(phone)
            .await
            .is_some_and(|e| e.step != Step::QuantitySelection);
        if past_selection || payment::latest_open_for_phone(pool, phone).await?.is_some() {
            self.send(menu::ongoing_session(phone)).await;
            return Ok(());
        }

        let Some(comedian) = self.resolve_comedian(reference).await? else {
            warn!(phone = %phone, reference = ?reference, "Comedian not found");
            self.send(menu::comedian_not_found(phone)).await;
            return self.send_comedian_list(phone).await;
        };

        let Some(voting) = voting_session::current_active(pool).await? else {
            info!(phone = %phone, "No active voting session");
            self.send(menu::no_active_session(phone)).await;
            return Ok(());
        };

        // Provisional votes of an abandoned selection are replaced.
        lifecycle::clear_open_flow(pool, phone).await?;
        let provisional = vote::create_provisional(
            pool,
            comedian.id,
            voting.id,
            phone,
            self.config.placeholder_amount,
        )
        .await?;
        self.sessions
            .set(phone, SessionEntry::new(comedian.id, provisional.id))
            .await;

        info!(
            phone = %phone,
            comedian = %comedian.name,
            vote_id = provisional.id,
            "Comedian selected"
        );

        if let Some(image) = menu::comedian_image(phone, &comedian) {
            self.send(image).await;
        }
        self.send(menu::quantity_list(phone, &comedian.name, !user.has_used_free_vote))
            .await;
        Ok(())
    }

    async fn select_quantity(&self, user: &User, quantity: i64) -> Result<()> {
        let pool = self.database.pool();
        let phone = user.phone_number.as_str();

        let Some(entry) = self.sessions.get(phone).await else {
            self.send(menu::session_expired(phone)).await;
            return self.send_welcome(user).await;
        };
        if entry.step != Step::QuantitySelection {
            self.send(menu::ongoing_session(phone)).await;
            return Ok(());
        }

        let comedian = match comedian::get_comedian(pool, entry.comedian_id).await {
            Ok(found) => found,
            Err(DatabaseError::NotFound { .. }) => {
                warn!(phone = %phone, comedian_id = entry.comedian_id, "Session comedian is gone");
                self.sessions.clear(phone).await?;
                self.send(menu::comedian_not_found(phone)).await;
                return self.send_comedian_list(phone).await;
            }
            Err(e) => return Err(e.into()),
        };

        let Some(tier) = catalog::tier_for_quantity(quantity) else {
            warn!(phone = %phone, quantity, "Quantity not offered");
            self.send(menu::quantity_list(phone, &comedian.name, !user.has_used_free_vote))
                .await;
            return Ok(());
        };

        if tier.is_free() {
            return self.redeem_free_vote(user, &entry, &comedian, tier).await;
        }

        match vote::set_quantity(pool, entry.vote_id, tier.quantity, tier.price).await {
            Ok(_) => {}
            Err(DatabaseError::NotFound { .. }) => {
                self.sessions.finish(phone).await;
                self.send(menu::session_expired(phone)).await;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        self.sessions
            .set(phone, entry.at(Step::WaitingForPaymentPhone))
            .await;
        self.send(menu::ask_payment_phone(phone, tier)).await;
        Ok(())
    }

    async fn redeem_free_vote(
        &self,
        user: &User,
        entry: &SessionEntry,
        comedian: &Comedian,
        tier: &Tier,
    ) -> Result<()> {
        let pool = self.database.pool();
        let phone = user.phone_number.as_str();

        let redeemed = if user.has_used_free_vote {
            None
        } else {
            let ad = ad::random_active(pool).await?;
            lifecycle::redeem_free_vote(
                pool,
                entry.vote_id,
                phone,
                tier.quantity,
                ad.as_ref().map(|a| a.id),
                tier.tickets,
                generate_code,
            )
            .await?
            .map(|codes| (codes, ad))
        };

        let Some((codes, ad)) = redeemed else {
            info!(phone = %phone, "Free vote already used");
            self.send(menu::free_vote_used(phone)).await;
            self.send(menu::quantity_list(phone, &comedian.name, false)).await;
            return Ok(());
        };

        self.sessions.finish(phone).await;

        if let Some(ad) = &ad {
            self.send(menu::ad(phone, ad)).await;
        }
        let voted = vote::get_vote(pool, entry.vote_id).await?;
        self.send_confirmation(&voted, &codes).await
    }

    async fn take_payment_phone(&self, phone: &str, entry: SessionEntry, text: &str) -> Result<()> {
        let pool = self.database.pool();

        if let Err(e) = validate_payment_phone(text) {
            debug!(phone = %phone, "Rejected payment phone: {}", e);
            self.send(menu::invalid_payment_phone(phone)).await;
            return Ok(());
        }
        let payer_phone = text.trim();

        let vote = match vote::get_vote(pool, entry.vote_id).await {
            Ok(v) => v,
            Err(DatabaseError::NotFound { .. }) => {
                self.sessions.finish(phone).await;
                self.send(menu::session_expired(phone)).await;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let pending = match payment::create_pending(pool, vote.id, vote.amount, payer_phone).await {
            Ok(p) => p,
            Err(DatabaseError::AlreadyExists { .. }) => {
                warn!(phone = %phone, vote_id = vote.id, "Vote already has a payment");
                self.send(menu::vote_error(phone)).await;
                self.sessions.clear(phone).await?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        self.sessions
            .set(
                phone,
                entry.at(Step::ProcessingPayment).with_payment(pending.id),
            )
            .await;

        self.start_payment(phone, &pending, &vote).await
    }

    async fn start_payment(&self, phone: &str, pending: &Payment, vote: &Vote) -> Result<()> {
        let pool = self.database.pool();
        let package = format!("votes_{}", vote.quantity);

        match self
            .payments
            .initiate(&pending.payer_phone, pending.amount, Some(&package))
            .await
        {
            Ok(initiation) => {
                let recorded = payment::mark_initiated(
                    pool,
                    pending.id,
                    &initiation.transaction_id,
                    initiation.reference.as_deref(),
                    &initiation.raw,
                )
                .await?;

                if !recorded {
                    warn!(
                        payment_id = pending.id,
                        "Payment left pending before initiation was recorded"
                    );
                    return Ok(());
                }

                payment_check::schedule(
                    pool,
                    pending.id,
                    self.config.payment_check_delay.as_secs(),
                    0,
                )
                .await?;

                info!(
                    phone = %phone,
                    payment_id = pending.id,
                    transaction_id = %initiation.transaction_id,
                    amount = pending.amount,
                    "Payment initiated"
                );
                self.send(menu::payment_initiated(
                    phone,
                    pending.amount,
                    &initiation.transaction_id,
                ))
                .await;
            }
            Err(e) => {
                warn!(phone = %phone, payment_id = pending.id, "Payment initiation failed: {}", e);
                lifecycle::close_payment(
                    pool,
                    pending.id,
                    PaymentStatus::Failed,
                    Some(&e.to_string()),
                )
                .await?;
                self.send(menu::payment_start_failed(phone)).await;
                self.sessions.clear(phone).await?;
            }
        }
        Ok(())
    }

    async fn manual_status_check(&self, phone: &str) -> Result<()> {
        let Some(open) = payment::latest_open_for_phone(self.database.pool(), phone).await? else {
            self.send(menu::no_pending_payment(phone)).await;
            return Ok(());
        };

        self.resolve_payment(open.id, CheckTrigger::Manual).await?;
        Ok(())
    }

    /// The payment with this transaction id, if it belongs to a vote of `phone`.
    async fn payment_of(&self, phone: &str, transaction_id: &str) -> Result<Option<Payment>> {
        let pool = self.database.pool();

        let Some(found) = payment::find_by_transaction_id(pool, transaction_id).await? else {
            return Ok(None);
        };
        let owner = vote::get_vote(pool, found.vote_id).await?;
        if owner.phone_number != phone {
            warn!(phone = %phone, transaction_id = %transaction_id, "Payment belongs to another phone");
            return Ok(None);
        }
        Ok(Some(found))
    }

    async fn confirm_payment(&self, phone: &str, transaction_id: &str) -> Result<()> {
        let Some(found) = self.payment_of(phone, transaction_id).await? else {
            self.send(menu::no_pending_payment(phone)).await;
            return Ok(());
        };

        if let Resolution::AlreadyFinal(status) =
            self.resolve_payment(found.id, CheckTrigger::Confirmed).await?
        {
            self.send(menu::payment_already_final(phone, status)).await;
        }
        Ok(())
    }

    async fn cancel_payment(&self, user: &User, transaction_id: &str) -> Result<()> {
        let pool = self.database.pool();
        let phone = user.phone_number.as_str();

        let Some(found) = self.payment_of(phone, transaction_id).await? else {
            self.send(menu::no_pending_payment(phone)).await;
            return Ok(());
        };

        if lifecycle::close_payment(pool, found.id, PaymentStatus::Cancelled, None).await? {
            info!(phone = %phone, payment_id = found.id, "Payment cancelled by user");
            self.send(menu::payment_closed(phone, PaymentStatus::Cancelled))
                .await;
            self.sessions.clear(phone).await?;
            self.send_welcome(user).await
        } else {
            let current = payment::get_payment(pool, found.id).await?;
            self.send(menu::payment_already_final(phone, current.status()))
                .await;
            Ok(())
        }
    }

    /// Ask the gateway about an open payment and apply the answer.
    ///
    /// Safe to call repeatedly and concurrently: only one caller can move a
    /// payment out of pending/initiated, later callers get
    /// [`Resolution::AlreadyFinal`]. A payment whose status stays `unknown`
    /// past the configured expiry is expired here.
    pub async fn resolve_payment(&self, payment_id: i64, trigger: CheckTrigger) -> Result<Resolution> {
        let pool = self.database.pool();

        let current = payment::get_payment(pool, payment_id).await?;
        if !current.status().is_open() {
            return Ok(Resolution::AlreadyFinal(current.status()));
        }

        let voted = vote::get_vote(pool, current.vote_id).await?;
        let phone = voted.phone_number.as_str();

        let (status, raw) = match current.transaction_id.as_deref() {
            Some(tx) => match self
                .payments
                .check_status(tx, current.transaction_reference.as_deref())
                .await
            {
                Ok(report) => (report.status, Some(report.raw)),
                Err(e) => {
                    warn!(payment_id, transaction_id = %tx, "Payment status check failed: {}", e);
                    (GatewayStatus::Unknown, None)
                }
            },
            None => (GatewayStatus::Unknown, None),
        };

        info!(payment_id, status = %status, trigger = ?trigger, "Payment status checked");

        match status {
            GatewayStatus::Paid => {
                let issued = lifecycle::complete_payment(
                    pool,
                    payment_id,
                    raw.as_deref(),
                    catalog::ticket_count(voted.quantity),
                    generate_code,
                )
                .await?;

                let Some(codes) = issued else {
                    let latest = payment::get_payment(pool, payment_id).await?;
                    return Ok(Resolution::AlreadyFinal(latest.status()));
                };

                self.sessions.finish_vote(phone, voted.id).await;
                let paid_vote = vote::get_vote(pool, voted.id).await?;
                self.send_confirmation(&paid_vote, &codes).await?;
                Ok(Resolution::Paid {
                    ticket_codes: codes,
                })
            }
            GatewayStatus::Failed => {
                self.close(&current, &voted, PaymentStatus::Failed, raw.as_deref())
                    .await
            }
            GatewayStatus::Cancelled => {
                self.close(&current, &voted, PaymentStatus::Cancelled, raw.as_deref())
                    .await
            }
            GatewayStatus::Expired => {
                self.close(&current, &voted, PaymentStatus::Expired, raw.as_deref())
                    .await
            }
            GatewayStatus::Pending | GatewayStatus::Unknown => {
                if let Some(raw) = &raw {
                    payment::record_response(pool, payment_id, raw).await?;
                }

                if status == GatewayStatus::Unknown {
                    let age = payment::age_secs(pool, payment_id).await?;
                    if age >= self.config.payment_expiry.as_secs() as i64 {
                        info!(payment_id, age_secs = age, "Expiring payment with unknown status");
                        return self
                            .close(&current, &voted, PaymentStatus::Expired, None)
                            .await;
                    }
                }

                if trigger.prompts_when_pending() {
                    if let Some(tx) = current.transaction_id.as_deref() {
                        self.send(menu::payment_pending(phone, tx)).await;
                    }
                }
                Ok(Resolution::StillPending(status))
            }
        }
    }

    async fn close(
        &self,
        current: &Payment,
        voted: &Vote,
        status: PaymentStatus,
        raw: Option<&str>,
    ) -> Result<Resolution> {
        let pool = self.database.pool();

        if !lifecycle::close_payment(pool, current.id, status, raw).await? {
            let latest = payment::get_payment(pool, current.id).await?;
            return Ok(Resolution::AlreadyFinal(latest.status()));
        }

        self.sessions
            .finish_vote(&voted.phone_number, voted.id)
            .await;
        self.send(menu::payment_closed(&voted.phone_number, status))
            .await;
        Ok(Resolution::Closed(status))
    }

    /// Handle the gateway's asynchronous notification.
    ///
    /// The body only identifies the payment; its status is fetched from the
    /// gateway again. Returns `None` for notifications about unknown orders.
    pub async fn handle_gateway_callback(&self, body: &Value) -> Result<Option<Resolution>> {
        let Some(order_id) = callback_order_id(body) else {
            warn!("Payment callback without order_id");
            return Ok(None);
        };

        let Some(found) = payment::find_by_transaction_id(self.database.pool(), &order_id).await?
        else {
            warn!(transaction_id = %order_id, "Payment callback for unknown order");
            return Ok(None);
        };

        info!(payment_id = found.id, transaction_id = %order_id, "Payment callback received");
        self.resolve_payment(found.id, CheckTrigger::Callback)
            .await
            .map(Some)
    }

    async fn send_confirmation(&self, voted: &Vote, codes: &[String]) -> Result<()> {
        let pool = self.database.pool();
        let comedian = comedian::get_comedian(pool, voted.comedian_id).await;
        let contest = voting_session::get_session(pool, voted.voting_session_id).await;

        match (comedian, contest) {
            (Ok(comedian), Ok(contest)) => {
                self.send(menu::confirmation(
                    &voted.phone_number,
                    &comedian.name,
                    voted.quantity,
                    codes,
                    &contest.winner_announcement_date,
                ))
                .await;
                Ok(())
            }
            (Err(DatabaseError::NotFound { .. }), _) | (_, Err(DatabaseError::NotFound { .. })) => {
                // Tickets are already issued; still tell the voter their codes.
                warn!(vote_id = voted.id, "Confirmation without comedian or session details");
                self.send(menu::tickets_issued(&voted.phone_number, voted.quantity, codes))
                    .await;
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => Err(e.into()),
        }
    }

    /// Send a message; failures are logged and otherwise ignored.
    async fn send(&self, message: OutgoingMessage) {
        if let Err(e) = self.messenger.send(&message).await {
            warn!(to = %message.to, kind = message.kind(), "Failed to send message: {}", e);
        }
    }
}
