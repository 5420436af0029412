//! Feature extraction from a wallet's raw ledger data.

use crate::domain::primitives::is_hex_address;
use crate::domain::{KnownContractRegistry, LedgerEntry, TimeSecs};
use crate::ledger::WalletLedger;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw ledger data that violates extraction invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("negative timestamp {timestamp} in transfer {hash}")]
    NegativeTimestamp { hash: String, timestamp: i64 },
    #[error("malformed counterparty {counterparty:?} in transfer {hash}")]
    MalformedCounterparty { hash: String, counterparty: String },
    #[error("invalid balance: {0}")]
    InvalidBalance(f64),
}

/// Behavioral features of one wallet, derived only from its own data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Native transactions plus token transfers.
    pub tx_count: u64,
    /// Transfers sent to a known DeFi contract.
    pub defi_interactions: u64,
    /// Days between the first and last observed transfer.
    pub account_age_days: f64,
    /// Transfers per day of account age.
    pub tx_frequency: f64,
    pub balance_eth: f64,
    pub is_active: bool,
}

impl FeatureRecord {
    /// Features of a wallet with no observable activity or balance.
    pub fn inactive() -> Self {
        Self::default()
    }
}

/// Turns a [`WalletLedger`] into a [`FeatureRecord`].
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor<'a> {
    registry: &'a KnownContractRegistry,
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(registry: &'a KnownContractRegistry) -> Self {
        Self { registry }
    }

    /// Extract features from one wallet's ledger.
    ///
    /// Native transactions and token transfers are counted together without
    /// deduplication. When every transfer shares a single timestamp the age is
    /// zero and the frequency falls back to the transfer count (a one-day floor).
    ///
    /// # Errors
    /// Returns [`DataError`] for negative timestamps, counterparties that are not
    /// hex addresses, or a non-finite balance.
    pub fn extract(&self, ledger: &WalletLedger) -> Result<FeatureRecord, DataError> {
        let entries = ledger
            .transactions
            .iter()
            .map(|tx| tx as &dyn LedgerEntry)
            .chain(
                ledger
                    .token_transfers
                    .iter()
                    .map(|transfer| transfer as &dyn LedgerEntry),
            );

        let mut tx_count: u64 = 0;
        let mut defi_interactions: u64 = 0;
        let mut span: Option<(TimeSecs, TimeSecs)> = None;

        for entry in entries {
            let timestamp = entry.timestamp();
            if timestamp.as_secs() < 0 {
                return Err(DataError::NegativeTimestamp {
                    hash: entry.hash().to_string(),
                    timestamp: timestamp.as_secs(),
                });
            }

            if let Some(counterparty) = entry.counterparty() {
                if !is_hex_address(counterparty) {
                    return Err(DataError::MalformedCounterparty {
                        hash: entry.hash().to_string(),
                        counterparty: counterparty.to_string(),
                    });
                }
                if self.registry.contains(counterparty) {
                    defi_interactions += 1;
                }
            }

            tx_count += 1;
            span = Some(match span {
                None => (timestamp, timestamp),
                Some((first, last)) => (first.min(timestamp), last.max(timestamp)),
            });
        }

        let account_age_days = match span {
            Some((first, last)) if tx_count >= 2 => last.days_since(first),
            _ => 0.0,
        };

        let tx_frequency = if tx_count == 0 {
            0.0
        } else if account_age_days > 0.0 {
            tx_count as f64 / account_age_days
        } else {
            tx_count as f64
        };

        if !ledger.balance_eth.is_finite() {
            return Err(DataError::InvalidBalance(ledger.balance_eth));
        }

        Ok(FeatureRecord {
            tx_count,
            defi_interactions,
            account_age_days,
            tx_frequency,
            balance_eth: ledger.balance_eth.max(0.0),
            is_active: tx_count > 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TokenTransfer, Transaction};

    const UNISWAP: &str = "0x7a250d5630b4cf539739df2c5dacb4c659f2488d";
    const PEER: &str = "0x00000000000000000000000000000000000000aa";
    const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

    fn tx(to: Option<&str>, ts: i64) -> Transaction {
        Transaction::new(
            format!("0x{:x}", ts),
            PEER.to_string(),
            to.map(String::from),
            TimeSecs::new(ts),
        )
    }

    fn token(to: &str, ts: i64) -> TokenTransfer {
        TokenTransfer::new(
            format!("0xt{:x}", ts),
            PEER.to_string(),
            Some(to.to_string()),
            TimeSecs::new(ts),
            USDC.to_string(),
            Some("USDC".to_string()),
        )
    }

    fn extract(ledger: &WalletLedger) -> Result<FeatureRecord, DataError> {
        let registry = KnownContractRegistry::builtin();
        FeatureExtractor::new(&registry).extract(ledger)
    }

    #[test]
    fn test_empty_ledger_is_inactive() {
        let features = extract(&WalletLedger::empty()).unwrap();
        assert_eq!(features, FeatureRecord::inactive());
        assert!(!features.is_active);
    }

    #[test]
    fn test_counts_native_and_token_transfers() {
        let ledger = WalletLedger::new(
            vec![tx(Some(UNISWAP), 0), tx(Some(PEER), 86_400)],
            vec![token(&UNISWAP.to_uppercase().replace("0X", "0x"), 2 * 86_400)],
            1.5,
        );

        let features = extract(&ledger).unwrap();
        assert_eq!(features.tx_count, 3);
        assert_eq!(features.defi_interactions, 2);
        assert_eq!(features.account_age_days, 2.0);
        assert_eq!(features.tx_frequency, 1.5);
        assert_eq!(features.balance_eth, 1.5);
        assert!(features.is_active);
    }

    #[test]
    fn test_age_uses_min_and_max_across_lists() {
        // Token transfer predates every native transaction.
        let ledger = WalletLedger::new(
            vec![tx(Some(PEER), 10 * 86_400), tx(Some(PEER), 5 * 86_400)],
            vec![token(PEER, 86_400)],
            0.0,
        );

        let features = extract(&ledger).unwrap();
        assert_eq!(features.account_age_days, 9.0);
    }

    #[test]
    fn test_single_transaction_uses_count_as_frequency() {
        let ledger = WalletLedger::new(vec![tx(Some(PEER), 1_700_000_000)], vec![], 0.0);

        let features = extract(&ledger).unwrap();
        assert_eq!(features.tx_count, 1);
        assert_eq!(features.account_age_days, 0.0);
        assert_eq!(features.tx_frequency, 1.0);
    }

    #[test]
    fn test_same_instant_burst_uses_count_as_frequency() {
        let ledger = WalletLedger::new(
            vec![tx(Some(PEER), 1_700_000_000); 4],
            vec![token(PEER, 1_700_000_000)],
            0.0,
        );

        let features = extract(&ledger).unwrap();
        assert_eq!(features.account_age_days, 0.0);
        assert_eq!(features.tx_frequency, 5.0);
    }

    #[test]
    fn test_contract_creation_has_no_counterparty() {
        let ledger = WalletLedger::new(vec![tx(None, 100), tx(Some(UNISWAP), 200)], vec![], 0.0);

        let features = extract(&ledger).unwrap();
        assert_eq!(features.tx_count, 2);
        assert_eq!(features.defi_interactions, 1);
    }

    #[test]
    fn test_negative_balance_is_clamped() {
        let ledger = WalletLedger::new(vec![], vec![], -3.0);
        assert_eq!(extract(&ledger).unwrap().balance_eth, 0.0);
    }

    #[test]
    fn test_non_finite_balance_errors() {
        let ledger = WalletLedger::new(vec![], vec![], f64::NAN);
        assert!(matches!(
            extract(&ledger),
            Err(DataError::InvalidBalance(_))
        ));
    }

    #[test]
    fn test_negative_timestamp_errors() {
        let ledger = WalletLedger::new(vec![tx(Some(PEER), -5)], vec![], 0.0);
        assert!(matches!(
            extract(&ledger),
            Err(DataError::NegativeTimestamp { timestamp: -5, .. })
        ));
    }

    #[test]
    fn test_malformed_counterparty_errors() {
        let ledger = WalletLedger::new(vec![tx(Some("uniswap-router"), 10)], vec![], 0.0);
        assert!(matches!(
            extract(&ledger),
            Err(DataError::MalformedCounterparty { .. })
        ));
    }
}
