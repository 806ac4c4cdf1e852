use chrono::{DateTime, Utc};

/// Ties count as ordered.
pub fn is_most_recent_first(timestamps: &[DateTime<Utc>]) -> bool {
    timestamps.windows(2).all(|pair| pair[0] >= pair[1])
}
