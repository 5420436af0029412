use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_ETHERSCAN_API_URL: &str = "https://api.etherscan.io/api";
const INFURA_MAINNET_URL: &str = "https://mainnet.infura.io/v3";

#[derive(Clone)]
pub struct Config {
    pub etherscan_api_key: String,
    pub etherscan_api_url: String,
    pub rpc_url: String,
    pub input_csv: PathBuf,
    pub output_csv: PathBuf,
    pub max_workers: usize,
    pub request_delay: Duration,
    pub max_retries: u32,
    pub request_timeout: Duration,
    pub registry_file: Option<PathBuf>,
}

// Credentials and the RPC URL (which may embed a key) stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("etherscan_api_url", &self.etherscan_api_url)
            .field("input_csv", &self.input_csv)
            .field("output_csv", &self.output_csv)
            .field("max_workers", &self.max_workers)
            .field("request_delay", &self.request_delay)
            .field("max_retries", &self.max_retries)
            .field("request_timeout", &self.request_timeout)
            .field("registry_file", &self.registry_file)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let etherscan_api_key = required(&env_map, "ETHERSCAN_API_KEY")?;

        let etherscan_api_url = env_map
            .get("ETHERSCAN_API_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ETHERSCAN_API_URL.to_string());

        let rpc_url = match (env_map.get("ETH_RPC_URL"), env_map.get("INFURA_API_KEY")) {
            (Some(url), _) if !url.trim().is_empty() => url.trim().to_string(),
            (_, Some(key)) if !key.trim().is_empty() => {
                format!("{}/{}", INFURA_MAINNET_URL, key.trim())
            }
            _ => return Err(ConfigError::MissingEnv("ETH_RPC_URL or INFURA_API_KEY".to_string())),
        };

        let input_csv = PathBuf::from(
            env_map
                .get("INPUT_CSV")
                .map(|s| s.as_str())
                .unwrap_or("data/Wallet_id.csv"),
        );
        let output_csv = PathBuf::from(
            env_map
                .get("OUTPUT_CSV")
                .map(|s| s.as_str())
                .unwrap_or("data/wallet_risk_scores.csv"),
        );

        let max_workers: usize = parse_positive(&env_map, "MAX_WORKERS", 10)?;
        let request_delay_ms: u64 = parse_or(&env_map, "REQUEST_DELAY_MS", 100)?;
        let max_retries: u32 = parse_positive(&env_map, "MAX_RETRIES", 3)?;
        let request_timeout_secs: u64 = parse_positive(&env_map, "REQUEST_TIMEOUT_SECS", 15)?;

        let registry_file = env_map
            .get("DEFI_REGISTRY_FILE")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Config {
            etherscan_api_key,
            etherscan_api_url,
            rpc_url,
            input_csv,
            output_csv,
            max_workers,
            request_delay: Duration::from_millis(request_delay_ms),
            max_retries,
            request_timeout: Duration::from_secs(request_timeout_secs),
            registry_file,
        })
    }
}

fn required(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn parse_or<T: FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), format!("not a valid number: {}", raw))
        }),
    }
}

fn parse_positive<T>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let value = parse_or(env_map, key, default)?;
    if value <= T::default() {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(value)
}
