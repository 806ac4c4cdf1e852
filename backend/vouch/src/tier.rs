use serde::Serialize;

pub const HIGH_IMPACT_THRESHOLD: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReputationTier {
    CannotVouch,
    LowImpact,
    HighImpact,
}

impl ReputationTier {
    pub fn from_reputation(reputation: i64) -> Self {
        if reputation < 0 {
            ReputationTier::CannotVouch
        } else if reputation < HIGH_IMPACT_THRESHOLD {
            ReputationTier::LowImpact
        } else {
            ReputationTier::HighImpact
        }
    }

    /// Magnitude a vouch from this tier adds to or removes from the target.
    pub fn impact(self) -> i64 {
        match self {
            ReputationTier::CannotVouch => 0,
            ReputationTier::LowImpact => 1,
            ReputationTier::HighImpact => 10,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReputationTier::CannotVouch => "Cannot Vouch",
            ReputationTier::LowImpact => "Low Impact (+1/-1)",
            ReputationTier::HighImpact => "High Impact (+10/-10)",
        }
    }

    pub fn can_vouch(self) -> bool {
        self.impact() > 0
    }
}
