//! Raw ledger records: native transactions and token transfers.

use crate::domain::TimeSecs;
use serde::{Deserialize, Serialize};

/// Fields the feature extractor reads from any ledger record.
pub trait LedgerEntry {
    fn hash(&self) -> &str;

    fn timestamp(&self) -> TimeSecs;

    /// Address the transfer was sent to. `None` for contract creations.
    fn counterparty(&self) -> Option<&str>;
}

/// A native-currency (ETH) transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub timestamp: TimeSecs,
}

impl Transaction {
    pub fn new(hash: String, from: String, to: Option<String>, timestamp: TimeSecs) -> Self {
        Self {
            hash,
            from,
            to: normalize_to(to),
            timestamp,
        }
    }
}

impl LedgerEntry for Transaction {
    fn hash(&self) -> &str {
        &self.hash
    }

    fn timestamp(&self) -> TimeSecs {
        self.timestamp
    }

    fn counterparty(&self) -> Option<&str> {
        self.to.as_deref()
    }
}

/// An ERC-20 token transfer, recorded separately from native transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub timestamp: TimeSecs,
    /// Token contract that emitted the transfer.
    pub contract_address: String,
    pub token_symbol: Option<String>,
}

impl TokenTransfer {
    pub fn new(
        hash: String,
        from: String,
        to: Option<String>,
        timestamp: TimeSecs,
        contract_address: String,
        token_symbol: Option<String>,
    ) -> Self {
        Self {
            hash,
            from,
            to: normalize_to(to),
            timestamp,
            contract_address,
            token_symbol,
        }
    }
}

impl LedgerEntry for TokenTransfer {
    fn hash(&self) -> &str {
        &self.hash
    }

    fn timestamp(&self) -> TimeSecs {
        self.timestamp
    }

    fn counterparty(&self) -> Option<&str> {
        self.to.as_deref()
    }
}

fn normalize_to(to: Option<String>) -> Option<String> {
    to.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
