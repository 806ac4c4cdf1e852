use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VouchType {
    Positive,
    Negative,
}

impl VouchType {
    /// Applies the direction of the vouch to an impact magnitude.
    pub fn signed(self, impact: i64) -> i64 {
        match self {
            VouchType::Positive => impact,
            VouchType::Negative => -impact,
        }
    }
}

/// Identifies one (voucher, target, game) triple. Both limits are scoped to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VouchKey {
    pub voucher_id: String,
    pub target_id: String,
    pub game_id: String,
}

impl VouchKey {
    pub fn new(
        voucher_id: impl Into<String>,
        target_id: impl Into<String>,
        game_id: impl Into<String>,
    ) -> Self {
        Self {
            voucher_id: voucher_id.into(),
            target_id: target_id.into(),
            game_id: game_id.into(),
        }
    }

    pub fn matches(&self, record: &VouchRecord) -> bool {
        self.voucher_id == record.voucher_id
            && self.target_id == record.target_id
            && self.game_id == record.game_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VouchRecord {
    pub id: String,
    pub voucher_id: String,
    pub target_id: String,
    pub game_id: String,
    pub vouch_type: VouchType,
    /// Unsigned magnitude, see [`VouchRecord::signed_impact`].
    pub impact: i64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl VouchRecord {
    pub fn key(&self) -> VouchKey {
        VouchKey::new(&self.voucher_id, &self.target_id, &self.game_id)
    }

    pub fn signed_impact(&self) -> i64 {
        self.vouch_type.signed(self.impact)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(vouch_type: VouchType) -> VouchRecord {
        VouchRecord {
            id: "v1".to_string(),
            voucher_id: "alice".to_string(),
            target_id: "bob".to_string(),
            game_id: "chess".to_string(),
            vouch_type,
            impact: 10,
            comment: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_signed_impact() {
        assert_eq!(record(VouchType::Positive).signed_impact(), 10);
        assert_eq!(record(VouchType::Negative).signed_impact(), -10);
    }

    #[test]
    fn test_key_matches_only_its_triple() {
        let record = record(VouchType::Positive);
        assert!(VouchKey::new("alice", "bob", "chess").matches(&record));
        assert!(!VouchKey::new("alice", "bob", "go").matches(&record));
        assert!(!VouchKey::new("bob", "alice", "chess").matches(&record));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(record(VouchType::Negative)).unwrap();
        assert_eq!(json["vouch_type"], "negative");
        assert_eq!(json["created_at"], "2024-01-15T10:00:00Z");
    }
}
