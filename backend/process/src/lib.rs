//! # Cooldown Tool
//!
//! Runs the vouch cooldown engine offline, handy for checking what a user was told.
//!
//! ```sh
//! cooldown --now 2024-01-15T10:00:00Z 2024-01-15T09:00:00Z 2024-01-14T08:00:00Z
//! # 22h (79200000 ms)
//!
//! cooldown --tier -3
//! # Cannot Vouch (impact 0)
//! ```
use std::fmt;

use anyhow::{Error, bail};
use chrono::{DateTime, Utc};
use vouch::{
    ReputationTier,
    cooldown::{MAX_VOUCHES_PER_WINDOW, compute_next_allowed_time},
    format_duration,
};

pub mod utils;

use utils::is_most_recent_first;

#[derive(Debug, PartialEq, Eq)]
pub struct CooldownReport {
    pub wait_ms: i64,
    pub wait: String,
    /// How many of the given timestamps the engine looked at.
    pub considered: usize,
}

impl fmt::Display for CooldownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} ms)", self.wait, self.wait_ms)
    }
}

pub fn cooldown_report(
    now: DateTime<Utc>,
    timestamps: &[DateTime<Utc>],
) -> Result<CooldownReport, Error> {
    if !is_most_recent_first(timestamps) {
        bail!("Timestamps must be given most recent first");
    }

    let considered = timestamps.len().min(MAX_VOUCHES_PER_WINDOW);
    let wait_ms = compute_next_allowed_time(now, &timestamps[..considered]).num_milliseconds();

    Ok(CooldownReport {
        wait_ms,
        wait: format_duration(wait_ms),
        considered,
    })
}

pub fn tier_report(reputation: i64) -> String {
    let tier = ReputationTier::from_reputation(reputation);

    format!("{} (impact {})", tier.label(), tier.impact())
}
