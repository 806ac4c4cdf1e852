//! # Redis
//!
//! RAM database holding every vouch and the reputation of every user who received one.
//!
//! ## Keys
//!
//! - `vouch:history:{voucher}:{target}:{game}`: sorted set, record JSON scored by `created_at` in
//!   milliseconds. Read newest first to get the two most recent vouches of a triple.
//! - `vouch:day:{voucher}:{target}:{game}:{YYYY-MM-DD}`: marker for the daily cap, expires at the
//!   next UTC midnight.
//! - `vouch:received:{user}` / `vouch:given:{user}`: sorted sets for profile listings.
//! - `reputation`: sorted set, user id scored by reputation. Doubles as the leaderboard.
//! - `leaderboard:vouches` / `leaderboard:positive`: sorted sets, user id scored by vouches
//!   received and positive vouches received.
//! - `leaderboard:recent`: sorted set, user id scored by the latest vouch given or received.
//!
//! Every voucher and target lands in all four user sets, at 0 if need be, so each leaderboard
//! ordering ranks the same users.
//!
//! Ids are validated to `[A-Za-z0-9_-]` before they get here, so `:` never collides.
//!
//! ## Writes
//!
//! A single Lua script checks the daily marker, counts the window and writes every key, so Redis
//! serializes concurrent vouches for us.
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use redis::{
    AsyncCommands, Client, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use chrono::{DateTime, Utc};
use tracing::debug;
use vouch::{
    VouchKey, VouchRecord, VouchType,
    cooldown::{MAX_VOUCHES_PER_WINDOW, next_utc_midnight, window},
};

use crate::store::{
    Direction, LeaderboardEntry, LeaderboardSort, Page, StoreError, VouchStore,
};

pub const REPUTATION_KEY: &str = "reputation";
pub const VOUCHES_KEY: &str = "leaderboard:vouches";
pub const POSITIVE_KEY: &str = "leaderboard:positive";
pub const RECENT_KEY: &str = "leaderboard:recent";

const INSERT_VOUCH: &str = r#"
if redis.call('EXISTS', KEYS[2]) == 1 then
    return -1
end
if redis.call('ZCOUNT', KEYS[1], ARGV[2], '+inf') >= tonumber(ARGV[3]) then
    return -2
end
redis.call('SET', KEYS[2], '1', 'EX', ARGV[5])
redis.call('ZADD', KEYS[1], ARGV[1], ARGV[4])
redis.call('ZADD', KEYS[3], ARGV[1], ARGV[4])
redis.call('ZADD', KEYS[4], ARGV[1], ARGV[4])
redis.call('ZINCRBY', KEYS[5], ARGV[6], ARGV[7])
redis.call('ZINCRBY', KEYS[5], 0, ARGV[8])
redis.call('ZINCRBY', KEYS[6], 1, ARGV[7])
redis.call('ZINCRBY', KEYS[6], 0, ARGV[8])
redis.call('ZINCRBY', KEYS[7], ARGV[9], ARGV[7])
redis.call('ZINCRBY', KEYS[7], 0, ARGV[8])
redis.call('ZADD', KEYS[8], 'GT', ARGV[1], ARGV[7], ARGV[1], ARGV[8])
return 1
"#;

const INSERTED: i64 = 1;
const DUPLICATE_DAY: i64 = -1;
const WINDOW_FULL: i64 = -2;

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, anyhow::Error> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url).context("Invalid Redis URL")?;
    let connection_manager = client
        .get_connection_manager_with_config(config)
        .await
        .context("Failed to connect to Redis")?;

    Ok(connection_manager)
}

pub fn history_key(key: &VouchKey) -> String {
    format!(
        "vouch:history:{}:{}:{}",
        key.voucher_id, key.target_id, key.game_id
    )
}

pub fn day_key(record: &VouchRecord) -> String {
    format!(
        "vouch:day:{}:{}:{}:{}",
        record.voucher_id,
        record.target_id,
        record.game_id,
        record.created_at.format("%Y-%m-%d")
    )
}

/// Seconds the daily marker has to live, rounded up so it never lapses before midnight.
pub fn day_marker_ttl(created_at: DateTime<Utc>) -> i64 {
    let until_midnight = next_utc_midnight(created_at) - created_at;
    let partial = i64::from(until_midnight.subsec_nanos() > 0);

    (until_midnight.num_seconds() + partial).max(1)
}

fn sort_key(sort: LeaderboardSort) -> &'static str {
    match sort {
        LeaderboardSort::Reputation => REPUTATION_KEY,
        LeaderboardSort::Vouches => VOUCHES_KEY,
        LeaderboardSort::Positive => POSITIVE_KEY,
        LeaderboardSort::Recent => RECENT_KEY,
    }
}

pub fn listing_key(user_id: &str, direction: Direction) -> String {
    match direction {
        Direction::Received => format!("vouch:received:{user_id}"),
        Direction::Given => format!("vouch:given:{user_id}"),
    }
}

pub struct RedisStore {
    connection: ConnectionManager,
    insert_vouch: Script,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            insert_vouch: Script::new(INSERT_VOUCH),
        }
    }

    async fn records(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<VouchRecord>, StoreError> {
        let mut connection = self.connection.clone();
        let members: Vec<String> = connection
            .zrevrange(key, start, stop)
            .await
            .context("Failed to read vouches")?;

        let records = members
            .iter()
            .map(|member| serde_json::from_str(member))
            .collect::<Result<Vec<VouchRecord>, _>>()
            .context("Corrupt vouch record")?;

        Ok(records)
    }
}

#[async_trait]
impl VouchStore for RedisStore {
    async fn recent_vouches(
        &self,
        key: &VouchKey,
        limit: usize,
    ) -> Result<Vec<VouchRecord>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        self.records(&history_key(key), 0, limit as isize - 1).await
    }

    async fn insert_vouch(&self, record: &VouchRecord) -> Result<(), StoreError> {
        let member = serde_json::to_string(record).context("Failed to encode vouch")?;

        let created_ms = record.created_at.timestamp_millis();
        let window_start = created_ms - window().num_milliseconds();
        let positive = i64::from(record.vouch_type == VouchType::Positive);

        let mut connection = self.connection.clone();
        let outcome: i64 = self
            .insert_vouch
            .key(history_key(&record.key()))
            .key(day_key(record))
            .key(listing_key(&record.target_id, Direction::Received))
            .key(listing_key(&record.voucher_id, Direction::Given))
            .key(REPUTATION_KEY)
            .key(VOUCHES_KEY)
            .key(POSITIVE_KEY)
            .key(RECENT_KEY)
            .arg(created_ms)
            .arg(format!("({window_start}"))
            .arg(MAX_VOUCHES_PER_WINDOW)
            .arg(member)
            .arg(day_marker_ttl(record.created_at))
            .arg(record.signed_impact())
            .arg(&record.target_id)
            .arg(&record.voucher_id)
            .arg(positive)
            .invoke_async(&mut connection)
            .await
            .context("Failed to run vouch script")?;

        #[cfg(feature = "verbose")]
        debug!("Vouch script outcome: {outcome}");

        match outcome {
            INSERTED => Ok(()),
            DUPLICATE_DAY => Err(StoreError::UniqueViolation),
            WINDOW_FULL => Err(StoreError::RateLimitViolation),
            other => Err(anyhow::anyhow!("Unexpected vouch script outcome: {other}").into()),
        }
    }

    async fn reputation(&self, user_id: &str) -> Result<i64, StoreError> {
        let mut connection = self.connection.clone();
        let score: Option<f64> = connection
            .zscore(REPUTATION_KEY, user_id)
            .await
            .context("Failed to read reputation")?;

        Ok(score.map_or(0, |score| score as i64))
    }

    async fn leaderboard(
        &self,
        sort: LeaderboardSort,
        page: Page,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let (start, stop) = page.bounds();

        let mut connection = self.connection.clone();
        let users: Vec<String> = connection
            .zrevrange(sort_key(sort), start, stop)
            .await
            .context("Failed to read leaderboard")?;

        debug!("Leaderboard page {} has {} users", page.page, users.len());
        if users.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for user_id in &users {
            pipe.zscore(REPUTATION_KEY, user_id)
                .zscore(VOUCHES_KEY, user_id)
                .zscore(POSITIVE_KEY, user_id)
                .zscore(RECENT_KEY, user_id);
        }
        let scores: Vec<Option<f64>> = pipe
            .query_async(&mut connection)
            .await
            .context("Failed to read leaderboard stats")?;

        Ok(users
            .into_iter()
            .zip(scores.chunks_exact(4))
            .enumerate()
            .map(|(index, (user_id, scores))| {
                let count = |score: Option<f64>| score.map_or(0, |score| score as u64);
                let total_vouches = count(scores[1]);
                let positive_vouches = count(scores[2]);

                LeaderboardEntry {
                    rank: page.rank(index),
                    user_id,
                    reputation: scores[0].map_or(0, |score| score as i64),
                    total_vouches,
                    positive_vouches,
                    negative_vouches: total_vouches.saturating_sub(positive_vouches),
                    last_active: scores[3]
                        .and_then(|ms| DateTime::from_timestamp_millis(ms as i64)),
                }
            })
            .collect())
    }

    async fn vouches_for(
        &self,
        user_id: &str,
        direction: Direction,
        page: Page,
    ) -> Result<Vec<VouchRecord>, StoreError> {
        let (start, stop) = page.bounds();

        self.records(&listing_key(user_id, direction), start, stop)
            .await
    }
}
