//! Weighted aggregation of normalized features into a 0-1000 risk score.

use super::normalize::NormalizedFeatureRecord;
use serde::{Deserialize, Serialize};

pub const MAX_SCORE: u32 = 1000;
/// Upper bound of the low-risk band; inactive wallets never exceed it.
pub const LOW_BAND_CEILING: u32 = 300;
pub const MEDIUM_BAND_CEILING: u32 = 600;

pub const INACTIVE_BASE_SCORE: u32 = 0;
/// Added for inactive wallets that also hold nothing.
pub const INACTIVE_ZERO_BALANCE_BOOST: u32 = 10;

const BEHAVIOR_WEIGHT: f64 = 0.6;
const ACTIVITY_WEIGHT: f64 = 0.4;

const DEFI_WEIGHT: f64 = 0.6;
const BALANCE_WEIGHT: f64 = 0.4;

const VOLUME_WEIGHT: f64 = 0.4;
const FREQ_WEIGHT: f64 = 0.3;
const AGE_WEIGHT: f64 = 0.3;

/// Interpretation band of a score. Does not feed back into the computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn from_score(score: u32) -> Self {
        if score < LOW_BAND_CEILING {
            RiskBand::Low
        } else if score < MEDIUM_BAND_CEILING {
            RiskBand::Medium
        } else {
            RiskBand::High
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskBand::Low => write!(f, "low"),
            RiskBand::Medium => write!(f, "medium"),
            RiskBand::High => write!(f, "high"),
        }
    }
}

/// Weighted risk fraction in [0, 1] for an active wallet.
pub fn risk_fraction(n: &NormalizedFeatureRecord) -> f64 {
    let behavior = DEFI_WEIGHT * n.defi_score + BALANCE_WEIGHT * n.balance_score;
    let activity =
        VOLUME_WEIGHT * n.volume_score + FREQ_WEIGHT * n.freq_score + AGE_WEIGHT * n.age_score;
    (BEHAVIOR_WEIGHT * behavior + ACTIVITY_WEIGHT * activity).clamp(0.0, 1.0)
}

/// Score for a wallet with no transfers.
pub fn inactive_score(zero_balance: bool) -> u32 {
    let boost = if zero_balance {
        INACTIVE_ZERO_BALANCE_BOOST
    } else {
        0
    };
    (INACTIVE_BASE_SCORE + boost).min(LOW_BAND_CEILING)
}

/// Final integer risk score in [0, 1000].
pub fn aggregate(n: &NormalizedFeatureRecord) -> u32 {
    if !n.is_active {
        return inactive_score(n.zero_balance);
    }

    let score = (risk_fraction(n) * MAX_SCORE as f64).round();
    (score as u32).min(MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn active(
        defi: f64,
        volume: f64,
        age: f64,
        freq: f64,
        balance: f64,
    ) -> NormalizedFeatureRecord {
        NormalizedFeatureRecord {
            defi_score: defi,
            volume_score: volume,
            age_score: age,
            freq_score: freq,
            balance_score: balance,
            is_active: true,
            zero_balance: balance >= 1.0,
        }
    }

    #[test]
    fn test_inactive_scores() {
        let mut n = active(1.0, 1.0, 1.0, 1.0, 1.0);
        n.is_active = false;
        n.zero_balance = true;
        assert_eq!(aggregate(&n), 10);

        n.zero_balance = false;
        assert_eq!(aggregate(&n), 0);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(aggregate(&active(1.0, 1.0, 1.0, 1.0, 1.0)), 1000);
        assert_eq!(aggregate(&active(0.0, 0.0, 0.0, 0.0, 0.0)), 0);
    }

    #[test]
    fn test_weights() {
        // behavior = 0.6, activity = 0.4 -> 0.36 + 0.16
        let n = active(1.0, 1.0, 0.0, 0.0, 0.0);
        assert!((risk_fraction(&n) - 0.52).abs() < 1e-12);
        assert_eq!(aggregate(&n), 520);
    }

    #[test]
    fn test_rounds_to_nearest() {
        // score = 240 * balance_score before rounding
        assert_eq!(aggregate(&active(0.0, 0.0, 0.0, 0.0, 0.003125)), 1);
        assert_eq!(aggregate(&active(0.0, 0.0, 0.0, 0.0, 0.0015625)), 0);
    }

    #[test]
    fn test_risk_band() {
        assert_eq!(RiskBand::from_score(0), RiskBand::Low);
        assert_eq!(RiskBand::from_score(299), RiskBand::Low);
        assert_eq!(RiskBand::from_score(300), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(599), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(600), RiskBand::High);
        assert_eq!(RiskBand::from_score(1000), RiskBand::High);
        assert_eq!(RiskBand::High.to_string(), "high");
    }

    proptest! {
        #[test]
        fn aggregate_bounded(
            defi in 0.0f64..=1.0,
            volume in 0.0f64..=1.0,
            age in 0.0f64..=1.0,
            freq in 0.0f64..=1.0,
            balance in 0.0f64..=1.0,
            is_active in any::<bool>(),
        ) {
            let mut n = active(defi, volume, age, freq, balance);
            n.is_active = is_active;
            let score = aggregate(&n);
            prop_assert!(score <= MAX_SCORE);
            if !is_active {
                prop_assert!(score <= LOW_BAND_CEILING);
            }
        }
    }
}
