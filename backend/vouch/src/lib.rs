//! # Vouch
//!
//! Shared vouching logic used by the server and the `cooldown` tool.
//!
//!
//!
//! ## Limits
//!
//! Each (voucher, target, game) triple is limited twice over:
//! - **Daily cap**: one vouch per UTC calendar date. Releases at the next UTC midnight.
//! - **Sliding window**: at most two vouches in any rolling 48 hours. Releases 48 hours after
//!   the older of the two most recent vouches.
//!
//! The store enforces both atomically when writing. Everything in here is advisory, used to tell a
//! user how long to wait, and must never be the only check.
//!
//!
//!
//! ## Reputation
//!
//! | reputation | impact |
//! |------------|--------|
//! | `< 0`      | 0, cannot vouch |
//! | `0..=99`   | 1 |
//! | `>= 100`   | 10 |

pub mod cooldown;
pub mod format;
pub mod models;
pub mod tier;

pub use cooldown::{compute_next_allowed_time, next_utc_midnight};
pub use format::format_duration;
pub use models::{VouchKey, VouchRecord, VouchType};
pub use tier::ReputationTier;
