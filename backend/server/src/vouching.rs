//! # Vouching
//!
//! Request flow behind the endpoints, kept apart from axum so it can run against any store.
//!
//! ## Creating a vouch
//! 1. Validate ids and comment, refuse self vouches.
//! 2. Look up the voucher's reputation, refuse negative tiers, derive the impact.
//! 3. Let the store insert atomically. It alone decides whether the limits allow the vouch.
//! 4. Rejected: look up the wait and add it to the message. If the lookup fails the plain message
//!    goes out instead, never blocking the user.
//! 5. Accepted: tell the user when the next vouch becomes possible, if we can.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use vouch::{
    ReputationTier, VouchKey, VouchRecord, VouchType,
    cooldown::{MAX_VOUCHES_PER_WINDOW, next_allowed_for_records},
    format_duration,
};

use crate::{
    error::AppError,
    store::{Direction, LeaderboardEntry, LeaderboardSort, Page, StoreError, VouchStore},
    utils::{sanitize_comment, validate_id},
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewVouch {
    pub voucher_id: String,
    pub target_id: String,
    pub game_id: String,
    pub vouch_type: VouchType,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VouchCreated {
    pub vouch: VouchRecord,
    /// Signed change applied to the target's reputation.
    pub impact: i64,
    pub next_allowed_ms: Option<i64>,
    pub next_allowed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CooldownAdvice {
    pub allowed: bool,
    pub wait_ms: i64,
    pub wait: String,
}

impl CooldownAdvice {
    fn from_ms(wait_ms: i64) -> Self {
        Self {
            allowed: wait_ms == 0,
            wait_ms,
            wait: format_duration(wait_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReputationSummary {
    pub user_id: String,
    pub reputation: i64,
    pub tier: ReputationTier,
    pub label: &'static str,
    pub impact: i64,
}

fn validated_key(voucher_id: &str, target_id: &str, game_id: &str) -> Result<VouchKey, AppError> {
    Ok(VouchKey::new(
        validate_id("voucher_id", voucher_id)?,
        validate_id("target_id", target_id)?,
        validate_id("game_id", game_id)?,
    ))
}

/// Milliseconds until `key` may vouch again, from the two most recent vouches.
pub async fn next_allowed_ms(
    store: &dyn VouchStore,
    key: &VouchKey,
    now: DateTime<Utc>,
) -> Result<i64, StoreError> {
    let recent = store.recent_vouches(key, MAX_VOUCHES_PER_WINDOW).await?;

    Ok(next_allowed_for_records(now, &recent).num_milliseconds())
}

pub async fn create_vouch(
    store: &dyn VouchStore,
    request: NewVouch,
    now: DateTime<Utc>,
) -> Result<VouchCreated, AppError> {
    let key = validated_key(&request.voucher_id, &request.target_id, &request.game_id)?;
    let comment = sanitize_comment(request.comment.as_deref())?;

    if key.voucher_id == key.target_id {
        return Err(AppError::SelfVouch);
    }

    let tier = ReputationTier::from_reputation(store.reputation(&key.voucher_id).await?);
    if !tier.can_vouch() {
        return Err(AppError::VouchingForbidden);
    }

    let record = VouchRecord {
        id: Uuid::new_v4().to_string(),
        voucher_id: key.voucher_id.clone(),
        target_id: key.target_id.clone(),
        game_id: key.game_id.clone(),
        vouch_type: request.vouch_type,
        impact: tier.impact(),
        comment,
        created_at: now,
    };

    match store.insert_vouch(&record).await {
        Ok(()) => {}
        Err(StoreError::Other(error)) => return Err(AppError::InternalError(error)),
        Err(rejection) => {
            info!(
                "Vouch {} -> {} in {} rejected: {rejection}",
                key.voucher_id, key.target_id, key.game_id
            );

            let message = match next_allowed_ms(store, &key, now).await {
                Ok(wait_ms) => format!(
                    "{rejection} You can try again in {}.",
                    format_duration(wait_ms)
                ),
                Err(error) => {
                    warn!("Failed to compute next allowed time: {error}");
                    rejection.to_string()
                }
            };

            return Err(AppError::Rejected(message));
        }
    }

    info!(
        "Vouch {} -> {} in {} created ({})",
        key.voucher_id,
        key.target_id,
        key.game_id,
        record.signed_impact()
    );

    let wait_ms = next_allowed_ms(store, &key, now)
        .await
        .map_err(|error| warn!("Failed to compute next allowed time: {error}"))
        .ok();

    Ok(VouchCreated {
        impact: record.signed_impact(),
        next_allowed_ms: wait_ms,
        next_allowed: wait_ms.map(format_duration),
        vouch: record,
    })
}

pub async fn cooldown(
    store: &dyn VouchStore,
    voucher_id: &str,
    target_id: &str,
    game_id: &str,
    now: DateTime<Utc>,
) -> Result<CooldownAdvice, AppError> {
    let key = validated_key(voucher_id, target_id, game_id)?;

    Ok(CooldownAdvice::from_ms(
        next_allowed_ms(store, &key, now).await?,
    ))
}

pub async fn reputation(
    store: &dyn VouchStore,
    user_id: &str,
) -> Result<ReputationSummary, AppError> {
    let user_id = validate_id("user_id", user_id)?;
    let reputation = store.reputation(user_id).await?;
    let tier = ReputationTier::from_reputation(reputation);

    Ok(ReputationSummary {
        user_id: user_id.to_string(),
        reputation,
        tier,
        label: tier.label(),
        impact: tier.impact(),
    })
}

pub async fn leaderboard(
    store: &dyn VouchStore,
    sort: LeaderboardSort,
    page: Page,
) -> Result<Vec<LeaderboardEntry>, AppError> {
    Ok(store.leaderboard(sort, page).await?)
}

pub async fn vouches_for(
    store: &dyn VouchStore,
    user_id: &str,
    direction: Direction,
    page: Page,
) -> Result<Vec<VouchRecord>, AppError> {
    let user_id = validate_id("user_id", user_id)?;

    Ok(store.vouches_for(user_id, direction, page).await?)
}
