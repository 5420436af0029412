//! Ledger reader abstraction for fetching a wallet's on-chain history and balance.

use crate::domain::{TokenTransfer, Transaction, WalletAddress};
use async_trait::async_trait;
use std::fmt;

pub mod etherscan;
pub mod mock;

pub use etherscan::{EtherscanLedger, RetryPolicy};
pub use mock::MockLedger;

/// Raw ledger data for a single wallet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WalletLedger {
    /// Native-currency transactions, oldest first.
    pub transactions: Vec<Transaction>,
    /// ERC-20 token transfers, oldest first.
    pub token_transfers: Vec<TokenTransfer>,
    /// Current balance in ETH.
    pub balance_eth: f64,
}

impl WalletLedger {
    pub fn new(
        transactions: Vec<Transaction>,
        token_transfers: Vec<TokenTransfer>,
        balance_eth: f64,
    ) -> Self {
        Self {
            transactions,
            token_transfers,
            balance_eth,
        }
    }

    /// A wallet with no history and zero balance.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Ledger reader trait for fetching raw wallet data.
///
/// Implementations own retry/backoff and rate limiting; callers treat any
/// returned error as final for that wallet.
#[async_trait]
pub trait LedgerReader: Send + Sync + fmt::Debug {
    /// Fetch native transactions, token transfers and current balance for a wallet.
    async fn fetch(&self, wallet: &WalletAddress) -> Result<WalletLedger, LedgerError>;
}

/// Error type for ledger reader operations.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// The provider has no record of the wallet.
    NotFound,
    /// Rate limit exceeded.
    RateLimited,
    /// Request timed out.
    Timeout,
    /// The provider rejected the address as malformed.
    Malformed(String),
    /// Network error (e.g., connection refused, DNS failure)
    Network(String),
    /// Unexpected HTTP status.
    Http { status: u16, message: String },
    /// Invalid JSON or malformed response payload.
    Parse(String),
    /// Any other error reported by the provider.
    Provider(String),
}

impl LedgerError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::RateLimited | LedgerError::Timeout | LedgerError::Network(_) => true,
            LedgerError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::NotFound => write!(f, "Wallet not found"),
            LedgerError::RateLimited => write!(f, "Rate limited"),
            LedgerError::Timeout => write!(f, "Request timed out"),
            LedgerError::Malformed(msg) => write!(f, "Malformed address: {}", msg),
            LedgerError::Network(msg) => write!(f, "Network error: {}", msg),
            LedgerError::Http { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            LedgerError::Parse(msg) => write!(f, "Parse error: {}", msg),
            LedgerError::Provider(msg) => write!(f, "Provider error: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_display() {
        let err = LedgerError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");

        let err = LedgerError::Http {
            status: 502,
            message: "Bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 502: Bad gateway");

        assert_eq!(LedgerError::RateLimited.to_string(), "Rate limited");
        assert_eq!(LedgerError::NotFound.to_string(), "Wallet not found");
    }

    #[test]
    fn test_transient_classification() {
        assert!(LedgerError::RateLimited.is_transient());
        assert!(LedgerError::Timeout.is_transient());
        assert!(LedgerError::Network("reset".into()).is_transient());
        assert!(LedgerError::Http {
            status: 503,
            message: String::new()
        }
        .is_transient());

        assert!(!LedgerError::Http {
            status: 403,
            message: String::new()
        }
        .is_transient());
        assert!(!LedgerError::NotFound.is_transient());
        assert!(!LedgerError::Malformed("0x12".into()).is_transient());
        assert!(!LedgerError::Parse("bad json".into()).is_transient());
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = WalletLedger::empty();
        assert!(ledger.transactions.is_empty());
        assert!(ledger.token_transfers.is_empty());
        assert_eq!(ledger.balance_eth, 0.0);
    }
}
