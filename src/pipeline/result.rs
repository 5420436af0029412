//! Per-wallet output row and batch summary.

use crate::domain::WalletAddress;
use crate::engine::{score_features, FeatureRecord, RiskBand};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One output row.
///
/// Field order is the column order of the output table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub wallet_id: WalletAddress,
    pub score: u32,
    pub tx_count: u64,
    pub defi_interactions: u64,
    pub account_age_days: f64,
    pub tx_frequency: f64,
    pub balance_eth: f64,
    #[serde(serialize_with = "flag_as_int", deserialize_with = "flag_from_int")]
    pub is_active: bool,
    /// Set when the row stands in for a wallet that could not be scored.
    #[serde(skip)]
    pub degraded: bool,
}

impl ScoreResult {
    pub fn from_features(wallet_id: WalletAddress, features: &FeatureRecord, score: u32) -> Self {
        Self {
            wallet_id,
            score,
            tx_count: features.tx_count,
            defi_interactions: features.defi_interactions,
            account_age_days: features.account_age_days,
            tx_frequency: features.tx_frequency,
            balance_eth: features.balance_eth,
            is_active: features.is_active,
            degraded: false,
        }
    }

    /// Row for a wallet whose data could not be fetched or extracted,
    /// scored as a wallet with no history and no balance.
    pub fn degraded(wallet_id: WalletAddress) -> Self {
        let features = FeatureRecord::inactive();
        let score = score_features(&features);
        Self {
            degraded: true,
            ..Self::from_features(wallet_id, &features, score)
        }
    }

    pub fn band(&self) -> RiskBand {
        RiskBand::from_score(self.score)
    }
}

fn flag_as_int<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*flag))
}

fn flag_from_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match u8::deserialize(deserializer)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(serde::de::Error::custom(format!(
            "is_active must be 0 or 1, got {}",
            other
        ))),
    }
}

/// Counts accumulated while a batch is written out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub degraded: usize,
    pub inactive: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl RunSummary {
    pub fn record(&mut self, result: &ScoreResult) {
        self.total += 1;
        if result.degraded {
            self.degraded += 1;
        }
        if !result.is_active {
            self.inactive += 1;
        }
        match result.band() {
            RiskBand::Low => self.low += 1,
            RiskBand::Medium => self.medium += 1,
            RiskBand::High => self.high += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(s: &str) -> WalletAddress {
        WalletAddress::new(s).unwrap()
    }

    #[test]
    fn test_degraded_row() {
        let row = ScoreResult::degraded(wallet("0xabc"));
        assert!(row.degraded);
        assert!(!row.is_active);
        assert_eq!(row.tx_count, 0);
        assert_eq!(row.balance_eth, 0.0);
        assert_eq!(row.score, 10);
        assert_eq!(row.band(), RiskBand::Low);
    }

    #[test]
    fn test_serializes_flag_as_int() {
        let row = ScoreResult::degraded(wallet("0xabc"));
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["is_active"], 0);
        assert_eq!(json["wallet_id"], "0xabc");
        assert!(json.get("degraded").is_none());
    }

    #[test]
    fn test_summary_counts_bands() {
        let mut summary = RunSummary::default();
        summary.record(&ScoreResult::degraded(wallet("0x1")));

        let features = FeatureRecord {
            tx_count: 10,
            is_active: true,
            ..FeatureRecord::inactive()
        };
        summary.record(&ScoreResult::from_features(wallet("0x2"), &features, 450));
        summary.record(&ScoreResult::from_features(wallet("0x3"), &features, 800));

        assert_eq!(
            summary,
            RunSummary {
                total: 3,
                degraded: 1,
                inactive: 1,
                low: 1,
                medium: 1,
                high: 1,
            }
        );
    }
}
