//! Normalization of raw features into bounded risk contributions.
//!
//! Every score is in [0, 1] and higher means riskier.

use super::features::FeatureRecord;
use serde::{Deserialize, Serialize};

/// DeFi interactions at which the contribution saturates.
pub const DEFI_SATURATION: f64 = 15.0;
/// `ln(tx_count + 1)` is divided by this before capping.
pub const VOLUME_LOG_DIVISOR: f64 = 6.0;
/// Accounts older than this (2 years) carry no age risk.
pub const AGE_HORIZON_DAYS: f64 = 730.0;
/// Transfers per day at which the frequency contribution saturates.
pub const FREQ_SATURATION_PER_DAY: f64 = 1000.0;
/// Balances at or above this carry no balance risk.
pub const BALANCE_CAP_ETH: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFeatureRecord {
    pub defi_score: f64,
    pub volume_score: f64,
    /// Inverted: younger accounts score higher.
    pub age_score: f64,
    pub freq_score: f64,
    /// Inverted: smaller balances score higher.
    pub balance_score: f64,
    pub is_active: bool,
    pub zero_balance: bool,
}

/// Map a feature record onto [0, 1] risk contributions.
pub fn normalize(features: &FeatureRecord) -> NormalizedFeatureRecord {
    let defi_score = (features.defi_interactions as f64 / DEFI_SATURATION).min(1.0);
    let volume_score = ((features.tx_count as f64).ln_1p() / VOLUME_LOG_DIVISOR).min(1.0);
    let age_score = 1.0 - (features.account_age_days / AGE_HORIZON_DAYS).min(1.0);
    let freq_score = (features.tx_frequency / FREQ_SATURATION_PER_DAY).min(1.0);
    let balance_score = 1.0 - features.balance_eth.min(BALANCE_CAP_ETH) / BALANCE_CAP_ETH;

    NormalizedFeatureRecord {
        defi_score: clamp_unit(defi_score),
        volume_score: clamp_unit(volume_score),
        age_score: clamp_unit(age_score),
        freq_score: clamp_unit(freq_score),
        balance_score: clamp_unit(balance_score),
        is_active: features.is_active,
        zero_balance: features.balance_eth <= 0.0,
    }
}

/// Clamp into [0, 1]; NaN carries no risk.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
