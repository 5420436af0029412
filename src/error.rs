use crate::config::ConfigError;
use crate::domain::RegistryError;
use crate::io::IoError;
use crate::ledger::LedgerError;
use thiserror::Error;

/// Errors that abort a run before or while producing output.
///
/// Per-wallet failures never reach this type; the pipeline turns them into
/// degraded rows.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<IoError> for AppError {
    fn from(err: IoError) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_is_configuration_error() {
        let err: AppError = RegistryError::Empty.into();
        assert!(matches!(err, AppError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Configuration error: registry contains no contracts"
        );
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err: AppError = IoError::Open {
            path: "data/missing.csv".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        }
        .into();
        assert!(matches!(err, AppError::Io(_)));
        assert!(err.to_string().contains("data/missing.csv"));
    }

    #[test]
    fn test_ledger_setup_error_is_internal() {
        let err: AppError = LedgerError::Network("tls backend unavailable".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Internal error: Network error: tls backend unavailable"
        );
    }

    #[test]
    fn test_missing_env_is_configuration_error() {
        let err: AppError = ConfigError::MissingEnv("ETHERSCAN_API_KEY".to_string()).into();
        assert!(matches!(err, AppError::Config(_)));
    }
}
