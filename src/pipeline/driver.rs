//! Ordered, bounded-concurrency scoring of a wallet batch.

use super::result::ScoreResult;
use crate::domain::{KnownContractRegistry, WalletAddress};
use crate::engine::{aggregate, normalize, DataError, FeatureExtractor};
use crate::ledger::{LedgerError, LedgerReader};
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Scores batches of wallets against a ledger reader.
#[derive(Clone)]
pub struct Pipeline {
    ledger: Arc<dyn LedgerReader>,
    registry: Arc<KnownContractRegistry>,
    max_workers: usize,
}

impl Pipeline {
    pub fn new(
        ledger: Arc<dyn LedgerReader>,
        registry: Arc<KnownContractRegistry>,
        max_workers: usize,
    ) -> Self {
        Self {
            ledger,
            registry,
            max_workers: max_workers.max(1),
        }
    }

    /// Fetch, extract, normalize and aggregate a single wallet.
    pub async fn score_wallet(&self, wallet: &WalletAddress) -> Result<ScoreResult, WalletError> {
        let ledger = self.ledger.fetch(wallet).await?;
        let features = FeatureExtractor::new(&self.registry).extract(&ledger)?;
        let normalized = normalize(&features);
        let score = aggregate(&normalized);

        debug!(
            "Scored wallet={} score={} tx_count={} defi={}",
            wallet, score, features.tx_count, features.defi_interactions
        );

        Ok(ScoreResult::from_features(wallet.clone(), &features, score))
    }

    /// Like [`Pipeline::score_wallet`], but substitutes a degraded row on failure.
    pub async fn score_or_degrade(&self, wallet: WalletAddress) -> ScoreResult {
        match self.score_wallet(&wallet).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Failed to score wallet {}, emitting degraded row: {}", wallet, e);
                ScoreResult::degraded(wallet)
            }
        }
    }

    /// Score wallets with up to `max_workers` in flight.
    ///
    /// Yields exactly one row per input wallet, in input order. The stream is
    /// lazy: dropping it stops scheduling further wallets.
    pub fn stream(&self, wallets: Vec<WalletAddress>) -> impl Stream<Item = ScoreResult> + '_ {
        stream::iter(wallets)
            .map(move |wallet| self.score_or_degrade(wallet))
            .buffered(self.max_workers)
    }

    /// Score every wallet and collect the rows.
    pub async fn run(&self, wallets: Vec<WalletAddress>) -> Vec<ScoreResult> {
        self.stream(wallets).collect().await
    }
}

/// Per-wallet failure; recovered by the driver with a degraded row.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Data(#[from] DataError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TimeSecs, Transaction};
    use crate::ledger::{MockLedger, WalletLedger};

    const UNISWAP: &str = "0x7a250d5630b4cf539739df2c5dacb4c659f2488d";

    fn wallet(s: &str) -> WalletAddress {
        WalletAddress::new(s).unwrap()
    }

    fn pipeline(mock: MockLedger) -> Pipeline {
        Pipeline::new(
            Arc::new(mock),
            Arc::new(KnownContractRegistry::builtin()),
            4,
        )
    }

    #[tokio::test]
    async fn test_score_wallet_propagates_ledger_error() {
        let p = pipeline(MockLedger::new());
        let err = p.score_wallet(&wallet("0x1")).await.unwrap_err();
        assert!(matches!(err, WalletError::Ledger(LedgerError::NotFound)));
    }

    #[tokio::test]
    async fn test_score_wallet_propagates_data_error() {
        let tx = Transaction::new(
            "0x01".to_string(),
            "0x1".to_string(),
            Some(UNISWAP.to_string()),
            TimeSecs::new(-1),
        );
        let mock =
            MockLedger::new().with_wallet(wallet("0x1"), WalletLedger::new(vec![tx], vec![], 0.0));
        let p = pipeline(mock);

        let err = p.score_wallet(&wallet("0x1")).await.unwrap_err();
        assert!(matches!(err, WalletError::Data(_)));

        let row = p.score_or_degrade(wallet("0x1")).await;
        assert!(row.degraded);
    }

    #[tokio::test]
    async fn test_zero_workers_still_makes_progress() {
        let p = Pipeline::new(
            Arc::new(MockLedger::new()),
            Arc::new(KnownContractRegistry::builtin()),
            0,
        );
        let rows = p.run(vec![wallet("0x1"), wallet("0x2")]).await;
        assert_eq!(rows.len(), 2);
    }
}
