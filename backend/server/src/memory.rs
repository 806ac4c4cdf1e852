//! In-process [`VouchStore`], used by tests and for running without Redis.
use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use vouch::{
    VouchKey, VouchRecord, VouchType,
    cooldown::{MAX_VOUCHES_PER_WINDOW, window},
};

use crate::store::{Direction, LeaderboardEntry, LeaderboardSort, Page, StoreError, VouchStore};

#[derive(Default)]
struct Inner {
    vouches: Vec<VouchRecord>,
    reputation: HashMap<String, i64>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a reputation without going through vouches.
    pub async fn set_reputation(&self, user_id: &str, reputation: i64) {
        self.inner
            .lock()
            .await
            .reputation
            .insert(user_id.to_string(), reputation);
    }
}

/// Newest first. Ties keep the later insert first.
fn newest_first<'a>(records: impl DoubleEndedIterator<Item = &'a VouchRecord>) -> Vec<VouchRecord> {
    let mut records: Vec<VouchRecord> = records.rev().cloned().collect();
    records.sort_by_key(|record| Reverse(record.created_at));
    records
}

#[derive(Default)]
struct Activity {
    received: u64,
    positive: u64,
    last_active: Option<DateTime<Utc>>,
}

impl Activity {
    fn touch(&mut self, at: DateTime<Utc>) {
        self.last_active = self.last_active.max(Some(at));
    }
}

fn sort_score(sort: LeaderboardSort, entry: &LeaderboardEntry) -> i64 {
    match sort {
        LeaderboardSort::Reputation => entry.reputation,
        LeaderboardSort::Vouches => entry.total_vouches as i64,
        LeaderboardSort::Positive => entry.positive_vouches as i64,
        LeaderboardSort::Recent => entry
            .last_active
            .map_or(i64::MIN, |last_active| last_active.timestamp_millis()),
    }
}

fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset())
        .take(page.limit as usize)
        .collect()
}

#[async_trait]
impl VouchStore for MemoryStore {
    async fn recent_vouches(
        &self,
        key: &VouchKey,
        limit: usize,
    ) -> Result<Vec<VouchRecord>, StoreError> {
        let inner = self.inner.lock().await;
        let mut records = newest_first(inner.vouches.iter().filter(|record| key.matches(record)));
        records.truncate(limit);

        Ok(records)
    }

    async fn insert_vouch(&self, record: &VouchRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let key = record.key();
        let day = record.created_at.date_naive();
        let window_start = record.created_at - window();

        let triple = || inner.vouches.iter().filter(|existing| key.matches(existing));

        if triple().any(|existing| existing.created_at.date_naive() == day) {
            return Err(StoreError::UniqueViolation);
        }

        if triple()
            .filter(|existing| existing.created_at > window_start)
            .count()
            >= MAX_VOUCHES_PER_WINDOW
        {
            return Err(StoreError::RateLimitViolation);
        }

        inner.vouches.push(record.clone());
        *inner
            .reputation
            .entry(record.target_id.clone())
            .or_default() += record.signed_impact();
        inner
            .reputation
            .entry(record.voucher_id.clone())
            .or_default();

        Ok(())
    }

    async fn reputation(&self, user_id: &str) -> Result<i64, StoreError> {
        let inner = self.inner.lock().await;

        Ok(inner.reputation.get(user_id).copied().unwrap_or(0))
    }

    async fn leaderboard(
        &self,
        sort: LeaderboardSort,
        page: Page,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let inner = self.inner.lock().await;

        let mut activity: HashMap<&str, Activity> = HashMap::new();
        for record in &inner.vouches {
            let target = activity.entry(&record.target_id).or_default();
            target.received += 1;
            if record.vouch_type == VouchType::Positive {
                target.positive += 1;
            }
            target.touch(record.created_at);
            activity
                .entry(&record.voucher_id)
                .or_default()
                .touch(record.created_at);
        }

        let mut entries: Vec<LeaderboardEntry> = inner
            .reputation
            .iter()
            .map(|(user_id, reputation)| {
                let activity = activity.remove(user_id.as_str()).unwrap_or_default();
                LeaderboardEntry {
                    rank: 0,
                    user_id: user_id.clone(),
                    reputation: *reputation,
                    total_vouches: activity.received,
                    positive_vouches: activity.positive,
                    negative_vouches: activity.received - activity.positive,
                    last_active: activity.last_active,
                }
            })
            .collect();
        entries.sort_by(|a, b| {
            sort_score(sort, b)
                .cmp(&sort_score(sort, a))
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        Ok(paginate(entries, page)
            .into_iter()
            .enumerate()
            .map(|(index, entry)| LeaderboardEntry {
                rank: page.rank(index),
                ..entry
            })
            .collect())
    }

    async fn vouches_for(
        &self,
        user_id: &str,
        direction: Direction,
        page: Page,
    ) -> Result<Vec<VouchRecord>, StoreError> {
        let inner = self.inner.lock().await;
        let records = newest_first(inner.vouches.iter().filter(|record| match direction {
            Direction::Received => record.target_id == user_id,
            Direction::Given => record.voucher_id == user_id,
        }));

        Ok(paginate(records, page))
    }
}
