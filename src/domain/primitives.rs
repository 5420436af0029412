//! Domain primitives: WalletAddress, TimeSecs.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

const SECS_PER_DAY: f64 = 86_400.0;

/// Time in seconds since Unix epoch, as reported by block explorers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSecs(pub i64);

impl TimeSecs {
    /// Create a TimeSecs from seconds.
    pub fn new(secs: i64) -> Self {
        TimeSecs(secs)
    }

    /// Get the underlying seconds value.
    pub fn as_secs(&self) -> i64 {
        self.0
    }

    /// Elapsed days from `earlier` to `self`, never negative.
    pub fn days_since(&self, earlier: TimeSecs) -> f64 {
        let delta = self.0.saturating_sub(earlier.0).max(0);
        delta as f64 / SECS_PER_DAY
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("wallet address is empty")]
    Empty,
}

/// Wallet address (opaque hex string), normalized to trimmed lower case.
///
/// Only emptiness is rejected here; malformed addresses are reported by the
/// ledger reader when it queries the provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Create a WalletAddress, normalizing case and whitespace.
    pub fn new(addr: impl AsRef<str>) -> Result<Self, AddressParseError> {
        let normalized = addr.as_ref().trim().to_lowercase();
        if normalized.is_empty() {
            return Err(AddressParseError::Empty);
        }
        Ok(WalletAddress(normalized))
    }

    /// Get the address as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for WalletAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WalletAddress::new(s)
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lower-case and trim an address for registry comparison.
pub fn normalize_address(addr: &str) -> String {
    addr.trim().to_lowercase()
}

/// Returns true if `addr` is a `0x`-prefixed 20-byte hex string.
pub fn is_hex_address(addr: &str) -> bool {
    let Some(body) = addr.strip_prefix("0x").or_else(|| addr.strip_prefix("0X")) else {
        return false;
    };
    body.len() == 40 && hex::decode(body).is_ok()
}
