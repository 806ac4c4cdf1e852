//! # Store
//!
//! Durable state behind the vouch endpoints.
//!
//! The store is the only authority on whether a vouch is accepted. [`VouchStore::insert_vouch`]
//! checks the daily cap and the sliding window and writes in one atomic step, so two concurrent
//! requests can never both slip past the limits. Rejections come back typed, never as text to
//! be pattern matched.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vouch::{VouchKey, VouchRecord};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("You have already vouched for this user today in this game.")]
    UniqueViolation,

    #[error(
        "You have reached the limit: you cannot vouch more than twice within 48 hours for the same person/game."
    )]
    RateLimitViolation,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Received,
    Given,
}

/// Ordering of the leaderboard, always highest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardSort {
    #[default]
    Reputation,
    /// Total vouches received.
    Vouches,
    /// Positive vouches received.
    Positive,
    /// Most recent vouch given or received.
    Recent,
}

/// One page of a listing. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    /// Inclusive index range, as Redis expects.
    pub fn bounds(&self) -> (isize, isize) {
        let start = self.offset() as isize;
        (start, start + self.limit as isize - 1)
    }

    pub fn rank(&self, index: usize) -> usize {
        self.offset() + index + 1
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub reputation: i64,
    pub total_vouches: u64,
    pub positive_vouches: u64,
    pub negative_vouches: u64,
    pub last_active: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait VouchStore: Send + Sync {
    /// Most recent first, at most `limit`.
    async fn recent_vouches(
        &self,
        key: &VouchKey,
        limit: usize,
    ) -> Result<Vec<VouchRecord>, StoreError>;

    /// Atomically checks both limits against `record.created_at`, persists the record and moves
    /// the target's reputation by `record.signed_impact()`.
    async fn insert_vouch(&self, record: &VouchRecord) -> Result<(), StoreError>;

    /// Unknown users sit at 0.
    async fn reputation(&self, user_id: &str) -> Result<i64, StoreError>;

    /// Everyone who gave or received a vouch. Counts are of vouches received.
    async fn leaderboard(
        &self,
        sort: LeaderboardSort,
        page: Page,
    ) -> Result<Vec<LeaderboardEntry>, StoreError>;

    async fn vouches_for(
        &self,
        user_id: &str,
        direction: Direction,
        page: Page,
    ) -> Result<Vec<VouchRecord>, StoreError>;
}
