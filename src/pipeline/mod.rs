//! Batch driver: ledger reader -> extractor -> normalizer -> aggregator, per wallet.

pub mod driver;
pub mod result;

pub use driver::{Pipeline, WalletError};
pub use result::{RunSummary, ScoreResult};
