//! Database models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A WhatsApp user, identified by the phone number the provider reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    /// Phone number as delivered by the provider (e.g., "255700000001").
    pub phone_number: String,
    /// True until the first welcome has been sent.
    pub is_first_time: bool,
    /// The sponsored free vote can be redeemed once per user.
    pub has_used_free_vote: bool,
    pub created_at: String,
    pub last_interaction: String,
}

/// A contest window. The first active session is the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct VotingSession {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub start_date: String,
    pub end_date: String,
    pub winner_announcement_date: String,
    pub created_at: String,
}

/// A nominee that users can vote for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Comedian {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub image_url: Option<String>,
    pub created_at: String,
}

/// Sponsor creative shown when a free vote is redeemed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Ad {
    pub id: i64,
    pub title: String,
    pub sponsor_name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

/// A video sent after the welcome message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WelcomeVideo {
    pub id: i64,
    pub title: String,
    pub video_url: String,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: String,
}

/// A vote. Created provisionally on comedian selection and completed in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Vote {
    pub id: i64,
    pub comedian_id: i64,
    pub voting_session_id: i64,
    pub phone_number: String,
    pub quantity: i64,
    /// Amount in whole TZS.
    pub amount: i64,
    pub is_paid: bool,
    pub is_free_vote: bool,
    pub ad_id: Option<i64>,
    pub created_at: String,
}

/// A mobile-money payment backing one paid vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub vote_id: i64,
    /// Locally generated UUID.
    pub payment_id: String,
    pub amount: i64,
    pub status: String,
    pub payment_method: String,
    /// Phone number charged (may differ from the chatting number).
    pub payer_phone: String,
    /// Order id sent to the gateway; set once initiation succeeds.
    pub transaction_id: Option<String>,
    pub transaction_reference: Option<String>,
    /// Raw gateway response kept for audit.
    pub gateway_response: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Payment {
    /// Parsed status. Unrecognised values are treated as pending.
    pub fn status(&self) -> PaymentStatus {
        self.status.parse().unwrap_or(PaymentStatus::Pending)
    }
}

/// A raffle ticket issued for a confirmed vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub vote_id: i64,
    pub ticket_code: String,
    pub created_at: String,
}

/// A durable, scheduled payment status check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PaymentCheck {
    pub payment_id: i64,
    pub due_at: String,
    /// Number of checks already performed for this payment.
    pub attempts: i64,
    pub created_at: String,
}

/// Per-comedian totals for a voting session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ComedianTally {
    pub comedian_id: i64,
    pub name: String,
    pub total_votes: i64,
    pub total_amount: i64,
    pub vote_count: i64,
}

/// Payment lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Initiated,
    Completed,
    Paid,
    Failed,
    Cancelled,
    Expired,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Initiated => "initiated",
            Self::Completed => "completed",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    /// Whether the payment still awaits a gateway outcome.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Initiated)
    }

    /// Whether the payment settled successfully.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Paid | Self::Completed)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "initiated" => Ok(Self::Initiated),
            "completed" => Ok(Self::Completed),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_round_trips_through_str() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Initiated,
            PaymentStatus::Completed,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Cancelled,
            PaymentStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<PaymentStatus>(), Ok(status));
        }
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_payment_status_classes() {
        assert!(PaymentStatus::Pending.is_open());
        assert!(PaymentStatus::Initiated.is_open());
        assert!(!PaymentStatus::Paid.is_open());
        assert!(PaymentStatus::Paid.is_settled());
        assert!(PaymentStatus::Completed.is_settled());
        assert!(!PaymentStatus::Expired.is_settled());
    }
}
