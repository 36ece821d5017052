//! Dashboard statistics and vote reporting.

use axum::extract::{Query, State};
use axum::Json;
use database::user::UserCounts;
use database::vote::VoteTotals;
use database::{
    ad, comedian, payment, payment_check, ticket, user, vote, voting_session, ComedianTally, Vote,
    VotingSession,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Active/total pair.
#[derive(Clone, Serialize)]
pub struct Counts {
    pub total: i64,
    pub active: i64,
}

/// Dashboard statistics.
#[derive(Clone, Serialize)]
pub struct Stats {
    pub users: UserCounts,
    pub comedians: Counts,
    pub ads: Counts,
    pub votes: VoteTotals,
    pub payments: PaymentCounts,
    pub tickets: i64,
    pub pending_checks: i64,
}

#[derive(Clone, Serialize)]
pub struct PaymentCounts {
    pub total: i64,
    pub settled: i64,
}

/// Get dashboard statistics as JSON.
pub async fn stats_api(State(state): State<AppState>) -> Result<Json<Stats>> {
    let pool = state.db.pool();

    let (comedians_total, comedians_active) = comedian::count_comedians(pool).await?;
    let (ads_total, ads_active) = ad::count_ads(pool).await?;
    let (payments_total, payments_settled) = payment::count_payments(pool).await?;

    Ok(Json(Stats {
        users: user::count_users(pool).await?,
        comedians: Counts {
            total: comedians_total,
            active: comedians_active,
        },
        ads: Counts {
            total: ads_total,
            active: ads_active,
        },
        votes: vote::totals(pool).await?,
        payments: PaymentCounts {
            total: payments_total,
            settled: payments_settled,
        },
        tickets: ticket::count_tickets(pool).await?,
        pending_checks: payment_check::pending_count(pool).await?,
    }))
}

#[derive(Deserialize)]
pub struct VotesQuery {
    pub limit: Option<i64>,
}

/// A vote with its raffle ticket codes.
#[derive(Serialize)]
pub struct VoteRow {
    #[serde(flatten)]
    pub vote: Vote,
    pub ticket_codes: Vec<String>,
}

/// Most recent votes, newest first.
pub async fn votes_api(
    State(state): State<AppState>,
    Query(query): Query<VotesQuery>,
) -> Result<Json<Vec<VoteRow>>> {
    let pool = state.db.pool();
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);

    let votes = vote::list_votes(pool, limit).await?;
    let mut codes = ticket::codes_by_vote(pool).await?;

    let rows = votes
        .into_iter()
        .map(|v| VoteRow {
            ticket_codes: codes.remove(&v.id).unwrap_or_default(),
            vote: v,
        })
        .collect();

    Ok(Json(rows))
}

#[derive(Serialize)]
pub struct VoteStats {
    pub session: VotingSession,
    pub comedians: Vec<ComedianTally>,
}

/// Per-comedian totals for the current voting session.
pub async fn vote_stats_api(State(state): State<AppState>) -> Result<Json<VoteStats>> {
    let pool = state.db.pool();

    let session = voting_session::current_active(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("no active voting session".to_string()))?;
    let comedians = vote::tally_for_session(pool, session.id).await?;

    Ok(Json(VoteStats { session, comedians }))
}
