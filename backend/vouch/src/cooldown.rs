//! # Cooldown
//!
//! Predicts how long a voucher has to wait before vouching for the same target in the same game
//! again.
//!
//! Input is the vouch history for one triple, truncated to the two most recent timestamps,
//! most recent first. The history is never reordered here; anything else is a caller bug.
//!
//! ## Branches
//! - No history: allowed now.
//! - One vouch: the earlier of 48 hours after it and the next UTC midnight.
//! - Two or more: 48 hours after the older of the two most recent. Midnight is not considered.
//!
//! The one vouch branch races the window even though a single vouch can not fill it, and the two
//! vouch branch ignores the daily cap. Both match the deployed behaviour and are kept as is.

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};

use crate::models::VouchRecord;

pub const WINDOW_HOURS: i64 = 48;
pub const MAX_VOUCHES_PER_WINDOW: usize = 2;

pub fn window() -> TimeDelta {
    TimeDelta::hours(WINDOW_HOURS)
}

/// Start of the UTC calendar day after `now`.
pub fn next_utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
        .checked_add_signed(TimeDelta::days(1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Instant at which `vouched_at` stops counting against the sliding window.
pub fn window_release(vouched_at: DateTime<Utc>) -> DateTime<Utc> {
    vouched_at
        .checked_add_signed(window())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Time left until the next vouch is allowed, zero when allowed now. Never negative.
pub fn compute_next_allowed_time(now: DateTime<Utc>, history: &[DateTime<Utc>]) -> TimeDelta {
    match history {
        [] => TimeDelta::zero(),
        [latest] => {
            let until_window = until(now, window_release(*latest));
            let until_midnight = until(now, next_utc_midnight(now));

            until_window.min(until_midnight)
        }
        [_, older, ..] => until(now, window_release(*older)),
    }
}

/// Same as [`compute_next_allowed_time`] over records already filtered to one triple.
pub fn next_allowed_for_records(now: DateTime<Utc>, records: &[VouchRecord]) -> TimeDelta {
    let history: Vec<DateTime<Utc>> = records
        .iter()
        .take(MAX_VOUCHES_PER_WINDOW)
        .map(|record| record.created_at)
        .collect();

    compute_next_allowed_time(now, &history)
}

fn until(now: DateTime<Utc>, instant: DateTime<Utc>) -> TimeDelta {
    (instant - now).max(TimeDelta::zero())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;

    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(
            compute_next_allowed_time(at(2024, 1, 15, 10, 0, 0), &[]),
            TimeDelta::zero()
        );
    }

    #[test]
    fn test_next_utc_midnight() {
        assert_eq!(
            next_utc_midnight(at(2024, 1, 15, 10, 0, 0)),
            at(2024, 1, 16, 0, 0, 0)
        );
        assert_eq!(
            next_utc_midnight(at(2024, 1, 15, 0, 0, 0)),
            at(2024, 1, 16, 0, 0, 0)
        );
        assert_eq!(
            next_utc_midnight(at(2024, 2, 28, 23, 59, 59)),
            at(2024, 2, 29, 0, 0, 0)
        );
        assert_eq!(
            next_utc_midnight(at(2023, 12, 31, 18, 0, 0)),
            at(2024, 1, 1, 0, 0, 0)
        );
    }

    #[test]
    fn test_single_vouch_from_yesterday_waits_for_midnight() {
        // Window releases 2024-01-16T09:00, midnight comes first.
        let now = at(2024, 1, 15, 10, 0, 0);
        let history = [at(2024, 1, 14, 9, 0, 0)];

        assert_eq!(
            compute_next_allowed_time(now, &history),
            TimeDelta::hours(14)
        );
    }

    #[test]
    fn test_single_vouch_midnight_first() {
        let now = at(2024, 1, 15, 10, 0, 0);
        let history = [at(2024, 1, 15, 9, 0, 0)];

        assert_eq!(
            compute_next_allowed_time(now, &history),
            TimeDelta::hours(14)
        );
    }

    #[test]
    fn test_single_vouch_window_first() {
        // Vouched 47h30m ago, midnight is 14h away.
        let now = at(2024, 1, 15, 10, 0, 0);
        let history = [at(2024, 1, 13, 10, 30, 0)];

        assert_eq!(
            compute_next_allowed_time(now, &history),
            TimeDelta::minutes(30)
        );
    }

    #[test]
    fn test_two_vouches_use_older() {
        let now = at(2024, 1, 15, 10, 0, 0);
        let history = [at(2024, 1, 15, 9, 0, 0), at(2024, 1, 14, 8, 0, 0)];

        assert_eq!(
            compute_next_allowed_time(now, &history),
            TimeDelta::hours(22)
        );
    }

    #[test]
    fn test_two_vouches_ignore_midnight() {
        // Release lands a full day after the next midnight.
        let now = at(2024, 1, 15, 23, 0, 0);
        let history = [at(2024, 1, 15, 1, 0, 0), at(2024, 1, 14, 22, 0, 0)];

        assert_eq!(
            compute_next_allowed_time(now, &history),
            TimeDelta::hours(23)
        );
    }

    #[test]
    fn test_two_vouches_released() {
        let now = at(2024, 1, 20, 10, 0, 0);
        let history = [at(2024, 1, 15, 9, 0, 0), at(2024, 1, 14, 8, 0, 0)];

        assert_eq!(compute_next_allowed_time(now, &history), TimeDelta::zero());
    }

    #[test]
    fn test_release_boundary_is_exclusive() {
        let older = at(2024, 1, 14, 8, 0, 0);
        let now = window_release(older);

        assert_eq!(
            compute_next_allowed_time(now, &[at(2024, 1, 15, 9, 0, 0), older]),
            TimeDelta::zero()
        );
    }

    #[test]
    fn test_extra_history_ignored() {
        let now = at(2024, 1, 15, 10, 0, 0);
        let two = [at(2024, 1, 15, 9, 0, 0), at(2024, 1, 14, 8, 0, 0)];
        let three = [two[0], two[1], at(2024, 1, 14, 7, 0, 0)];

        assert_eq!(
            compute_next_allowed_time(now, &two),
            compute_next_allowed_time(now, &three)
        );
    }

    #[test]
    fn test_tied_timestamps() {
        let now = at(2024, 1, 15, 10, 0, 0);
        let vouched = at(2024, 1, 15, 9, 0, 0);

        assert_eq!(
            compute_next_allowed_time(now, &[vouched, vouched]),
            TimeDelta::hours(47)
        );
    }

    #[test]
    fn test_records_truncated_to_two() {
        let now = at(2024, 1, 15, 10, 0, 0);
        let record = |id: &str, created_at| VouchRecord {
            id: id.to_string(),
            voucher_id: "alice".to_string(),
            target_id: "bob".to_string(),
            game_id: "chess".to_string(),
            vouch_type: crate::VouchType::Positive,
            impact: 1,
            comment: None,
            created_at,
        };
        let records = [
            record("a", at(2024, 1, 15, 9, 0, 0)),
            record("b", at(2024, 1, 14, 8, 0, 0)),
            record("c", at(2024, 1, 13, 8, 0, 0)),
        ];

        assert_eq!(
            next_allowed_for_records(now, &records),
            TimeDelta::hours(22)
        );
    }

    fn instant() -> impl Strategy<Value = DateTime<Utc>> {
        // 2000-01-01 to 2100-01-01, millisecond resolution.
        (946_684_800_000i64..4_102_444_800_000i64)
            .prop_map(|ms| DateTime::<Utc>::from_timestamp_millis(ms).unwrap())
    }

    fn offset() -> impl Strategy<Value = TimeDelta> {
        (0i64..(5 * 24 * 3_600_000)).prop_map(TimeDelta::milliseconds)
    }

    proptest! {
        #[test]
        fn prop_never_negative(now in instant(), first in offset(), second in offset()) {
            let latest = now - first;
            let older = latest - second;

            prop_assert!(compute_next_allowed_time(now, &[latest]) >= TimeDelta::zero());
            prop_assert!(compute_next_allowed_time(now, &[latest, older]) >= TimeDelta::zero());
            // Non-chronological input still never goes negative.
            prop_assert!(compute_next_allowed_time(now, &[older, now + first]) >= TimeDelta::zero());
        }

        #[test]
        fn prop_single_is_min_of_limits(now in instant(), age in offset()) {
            let latest = now - age;
            let expected = (window() - age)
                .max(TimeDelta::zero())
                .min(next_utc_midnight(now) - now);

            prop_assert_eq!(compute_next_allowed_time(now, &[latest]), expected);
        }

        #[test]
        fn prop_pair_ignores_latest(now in instant(), a in offset(), b in offset(), age in offset()) {
            let older = now - age;
            let expected = (window_release(older) - now).max(TimeDelta::zero());

            prop_assert_eq!(compute_next_allowed_time(now, &[now - a, older]), expected);
            prop_assert_eq!(compute_next_allowed_time(now, &[now - b, older]), expected);
        }

        #[test]
        fn prop_idempotent(now in instant(), first in offset(), second in offset()) {
            let history = [now - first, now - first - second];

            prop_assert_eq!(
                compute_next_allowed_time(now, &history),
                compute_next_allowed_time(now, &history)
            );
        }

        #[test]
        fn prop_midnight_is_next_day(now in instant()) {
            let midnight = next_utc_midnight(now);

            prop_assert!(midnight > now);
            prop_assert!(midnight - now <= TimeDelta::days(1));
            prop_assert_eq!(midnight.date_naive(), now.date_naive().succ_opt().unwrap());
        }
    }
}
