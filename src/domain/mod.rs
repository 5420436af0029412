//! Domain types for wallet risk scoring.
//!
//! This module provides:
//! - Domain primitives: WalletAddress, TimeSecs
//! - Raw ledger records: Transaction, TokenTransfer
//! - The read-only KnownContractRegistry of DeFi protocol contracts

pub mod primitives;
pub mod registry;
pub mod transaction;

pub use primitives::{AddressParseError, TimeSecs, WalletAddress};
pub use registry::{KnownContractRegistry, RegistryError};
pub use transaction::{LedgerEntry, TokenTransfer, Transaction};
