//! Pure scoring engine: feature extraction, normalization, aggregation.
//!
//! Nothing in here performs I/O; every function is deterministic in its inputs.

pub mod features;
pub mod normalize;
pub mod score;

pub use features::{DataError, FeatureExtractor, FeatureRecord};
pub use normalize::{normalize, NormalizedFeatureRecord};
pub use score::{aggregate, risk_fraction, RiskBand};

/// Normalize and aggregate a feature record in one step.
pub fn score_features(features: &FeatureRecord) -> u32 {
    aggregate(&normalize(features))
}
