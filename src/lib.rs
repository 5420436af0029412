pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod io;
pub mod ledger;
pub mod pipeline;

pub use config::Config;
pub use domain::{KnownContractRegistry, TimeSecs, TokenTransfer, Transaction, WalletAddress};
pub use engine::{DataError, FeatureExtractor, FeatureRecord, NormalizedFeatureRecord, RiskBand};
pub use error::AppError;
pub use ledger::{EtherscanLedger, LedgerError, LedgerReader, MockLedger, WalletLedger};
pub use pipeline::{Pipeline, RunSummary, ScoreResult};
