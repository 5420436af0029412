//! Mock ledger reader for testing without network calls.

use super::{LedgerError, LedgerReader, WalletLedger};
use crate::domain::WalletAddress;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
struct MockEntry {
    result: Result<WalletLedger, LedgerError>,
    latency: Option<Duration>,
}

/// Mock ledger reader that returns predefined per-wallet data or failures.
///
/// Wallets without an entry fail with [`LedgerError::NotFound`].
#[derive(Debug, Clone, Default)]
pub struct MockLedger {
    entries: HashMap<WalletAddress, MockEntry>,
    calls: Arc<AtomicUsize>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `ledger` for `wallet`.
    pub fn with_wallet(mut self, wallet: WalletAddress, ledger: WalletLedger) -> Self {
        self.entries.insert(
            wallet,
            MockEntry {
                result: Ok(ledger),
                latency: None,
            },
        );
        self
    }

    /// Fail every fetch for `wallet` with `error`.
    pub fn with_failure(mut self, wallet: WalletAddress, error: LedgerError) -> Self {
        self.entries.insert(
            wallet,
            MockEntry {
                result: Err(error),
                latency: None,
            },
        );
        self
    }

    /// Delay responses for an already registered `wallet`.
    pub fn with_latency(mut self, wallet: &WalletAddress, latency: Duration) -> Self {
        if let Some(entry) = self.entries.get_mut(wallet) {
            entry.latency = Some(latency);
        }
        self
    }

    /// Number of fetches served so far, across clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerReader for MockLedger {
    async fn fetch(&self, wallet: &WalletAddress) -> Result<WalletLedger, LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let Some(entry) = self.entries.get(wallet) else {
            return Err(LedgerError::NotFound);
        };
        if let Some(latency) = entry.latency {
            tokio::time::sleep(latency).await;
        }
        entry.result.clone()
    }
}
