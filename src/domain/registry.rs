//! Known DeFi contract registry used for interaction counting.

use crate::domain::primitives::{is_hex_address, normalize_address};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Contracts recognized out of the box: (address, protocol).
const BUILTIN_CONTRACTS: &[(&str, &str)] = &[
    ("0x7d2768de32b0b80b7a3454c06bdac94a69ddc7a9", "Aave"),
    ("0x3d9819210a31b4961b30ef54be2aed79b9c9cd3b", "Compound"),
    ("0xd9e1ce17f2641f24ae83637ab66a2cca9c378b9f", "SushiSwap"),
    ("0x7a250d5630b4cf539739df2c5dacb4c659f2488d", "Uniswap"),
    ("0x1111111254fb6c44bac0bed2854e76f90643097d", "1inch"),
];

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read registry file {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("registry csv error: {0}")]
    Csv(String),
    #[error("invalid contract address in registry: {0}")]
    InvalidAddress(String),
    #[error("registry contains no contracts")]
    Empty,
}

/// Immutable set of DeFi protocol contracts keyed by lower-case address.
///
/// Loaded once at startup and shared read-only (behind an `Arc`) by every
/// wallet task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownContractRegistry {
    contracts: HashMap<String, String>,
}

impl KnownContractRegistry {
    /// The built-in registry of major lending pools and swap routers.
    pub fn builtin() -> Self {
        Self {
            contracts: BUILTIN_CONTRACTS
                .iter()
                .map(|(addr, name)| (addr.to_string(), name.to_string()))
                .collect(),
        }
    }

    /// Build a registry from (address, protocol) pairs.
    ///
    /// # Errors
    /// Fails if any address is not a 20-byte hex string or if no pairs are given.
    pub fn from_entries<I, A, P>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (A, P)>,
        A: AsRef<str>,
        P: Into<String>,
    {
        let mut contracts = HashMap::new();
        for (addr, protocol) in entries {
            let addr = normalize_address(addr.as_ref());
            if !is_hex_address(&addr) {
                return Err(RegistryError::InvalidAddress(addr));
            }
            contracts.insert(addr, protocol.into());
        }

        if contracts.is_empty() {
            return Err(RegistryError::Empty);
        }
        Ok(Self { contracts })
    }

    /// Load a registry from a CSV file with `address,protocol` columns.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| RegistryError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse_csv(&bytes)
    }

    pub fn parse_csv(csv_bytes: &[u8]) -> Result<Self, RegistryError> {
        #[derive(Debug, serde::Deserialize)]
        struct Row {
            address: String,
            protocol: String,
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(csv_bytes);

        let rows = reader
            .deserialize::<Row>()
            .map(|record| {
                record
                    .map(|row| (row.address, row.protocol))
                    .map_err(|e| RegistryError::Csv(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_entries(rows)
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, addr: &str) -> bool {
        self.contracts.contains_key(&normalize_address(addr))
    }

    /// Protocol label for a contract address, if known.
    pub fn protocol(&self, addr: &str) -> Option<&str> {
        self.contracts
            .get(&normalize_address(addr))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

impl Default for KnownContractRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup_is_case_insensitive() {
        let registry = KnownContractRegistry::builtin();
        assert_eq!(registry.len(), 5);
        assert!(registry.contains("0x7A250D5630B4CF539739DF2C5DACB4C659F2488D"));
        assert_eq!(
            registry.protocol("0x7d2768de32b0b80b7a3454c06bdac94a69ddc7a9"),
            Some("Aave")
        );
        assert!(!registry.contains("0x0000000000000000000000000000000000000000"));
    }

    #[test]
    fn test_parse_csv_valid() {
        let csv = b"address,protocol\n0xBA12222222228d8Ba445958a75a0704d566BF2C8, Balancer\n";
        let registry = KnownContractRegistry::parse_csv(csv).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.protocol("0xba12222222228d8ba445958a75a0704d566bf2c8"),
            Some("Balancer")
        );
    }

    #[test]
    fn test_parse_csv_invalid_address_errors() {
        let csv = b"address,protocol\nnot-an-address,Foo\n";
        let err = KnownContractRegistry::parse_csv(csv).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidAddress(_)));
    }

    #[test]
    fn test_parse_csv_empty_errors() {
        let csv = b"address,protocol\n";
        let err = KnownContractRegistry::parse_csv(csv).unwrap_err();
        assert!(matches!(err, RegistryError::Empty));
    }

    #[test]
    fn test_missing_file_errors() {
        let err = KnownContractRegistry::from_csv_path("/nonexistent/registry.csv").unwrap_err();
        assert!(matches!(err, RegistryError::Read { .. }));
    }
}
