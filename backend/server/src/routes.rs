use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State as Extract, rejection::JsonRejection},
};
use chrono::Utc;
use serde::Deserialize;
use vouch::VouchRecord;

use crate::{
    error::AppError,
    state::State,
    store::{Direction, LeaderboardEntry, LeaderboardSort, Page},
    vouching::{
        self, CooldownAdvice, NewVouch, ReputationSummary, VouchCreated, cooldown, create_vouch,
        leaderboard,
    },
};

#[derive(Deserialize)]
pub struct CooldownQuery {
    voucher_id: String,
    target_id: String,
    game_id: String,
}

#[derive(Deserialize)]
pub struct UserQuery {
    user_id: String,
}

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default)]
    sort: LeaderboardSort,
    page: Option<u32>,
    limit: Option<u32>,
}

#[derive(Deserialize)]
pub struct VouchesQuery {
    user_id: String,
    #[serde(default)]
    direction: Direction,
    page: Option<u32>,
    limit: Option<u32>,
}

pub async fn create_vouch_handler(
    Extract(state): Extract<Arc<State>>,
    payload: Result<Json<NewVouch>, JsonRejection>,
) -> Result<Json<VouchCreated>, AppError> {
    let Json(payload) = payload?;

    Ok(Json(
        create_vouch(state.store.as_ref(), payload, Utc::now()).await?,
    ))
}

pub async fn cooldown_handler(
    Extract(state): Extract<Arc<State>>,
    Query(query): Query<CooldownQuery>,
) -> Result<Json<CooldownAdvice>, AppError> {
    Ok(Json(
        cooldown(
            state.store.as_ref(),
            &query.voucher_id,
            &query.target_id,
            &query.game_id,
            Utc::now(),
        )
        .await?,
    ))
}

pub async fn reputation_handler(
    Extract(state): Extract<Arc<State>>,
    Query(query): Query<UserQuery>,
) -> Result<Json<ReputationSummary>, AppError> {
    Ok(Json(
        vouching::reputation(state.store.as_ref(), &query.user_id).await?,
    ))
}

pub async fn leaderboard_handler(
    Extract(state): Extract<Arc<State>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let page = Page::new(query.page, query.limit);

    Ok(Json(
        leaderboard(state.store.as_ref(), query.sort, page).await?,
    ))
}

pub async fn vouches_handler(
    Extract(state): Extract<Arc<State>>,
    Query(query): Query<VouchesQuery>,
) -> Result<Json<Vec<VouchRecord>>, AppError> {
    let page = Page::new(query.page, query.limit);

    Ok(Json(
        vouching::vouches_for(state.store.as_ref(), &query.user_id, query.direction, page).await?,
    ))
}
