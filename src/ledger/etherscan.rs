//! Etherscan explorer + Ethereum JSON-RPC ledger reader.

use super::{LedgerError, LedgerReader, WalletLedger};
use crate::config::Config;
use crate::domain::{TimeSecs, TokenTransfer, Transaction, WalletAddress};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

const WEI_DECIMALS: u32 = 18;

/// Retry settings for provider calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    /// First backoff interval; later intervals grow exponentially.
    pub initial_interval: Duration,
}

/// Ledger reader backed by the Etherscan account API (transaction lists) and
/// a JSON-RPC node (balances).
#[derive(Clone)]
pub struct EtherscanLedger {
    client: Client,
    explorer_url: String,
    api_key: String,
    rpc_url: String,
    retry: RetryPolicy,
}

impl fmt::Debug for EtherscanLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EtherscanLedger")
            .field("explorer_url", &self.explorer_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl EtherscanLedger {
    pub fn new(
        client: Client,
        explorer_url: String,
        api_key: String,
        rpc_url: String,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            explorer_url,
            api_key,
            rpc_url,
            retry,
        }
    }

    /// Build a reader with an HTTP client honouring the configured timeout.
    pub fn from_config(config: &Config) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LedgerError::Network(e.to_string()))?;

        Ok(Self::new(
            client,
            config.etherscan_api_url.clone(),
            config.etherscan_api_key.clone(),
            config.rpc_url.clone(),
            RetryPolicy {
                max_attempts: config.max_retries,
                initial_interval: config.request_delay,
            },
        ))
    }

    async fn with_retry<T, F, Fut>(&self, what: &str, op: F) -> Result<T, LedgerError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let backoff = ExponentialBackoff {
            initial_interval: self.retry.initial_interval,
            max_elapsed_time: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        let max_attempts = self.retry.max_attempts.max(1);
        let attempts = AtomicU32::new(0);
        let op = &op;
        let attempts = &attempts;

        retry(backoff, || async move {
            match op().await {
                Ok(value) => Ok(value),
                Err(e) => {
                    let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
                    if e.is_transient() && attempt < max_attempts {
                        debug!("{} attempt {}/{} failed: {}", what, attempt, max_attempts, e);
                        Err(backoff::Error::transient(e))
                    } else {
                        Err(backoff::Error::permanent(e))
                    }
                }
            }
        })
        .await
    }

    async fn explorer_list(&self, action: &str, address: &str) -> Result<Vec<Value>, LedgerError> {
        let response = self
            .client
            .get(&self.explorer_url)
            .query(&[
                ("module", "account"),
                ("action", action),
                ("address", address),
                ("startblock", "0"),
                ("endblock", "99999999"),
                ("sort", "asc"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(map_request_error)?;

        let body = read_json(response).await?;
        parse_explorer_envelope(&body)
    }

    async fn rpc_balance(&self, address: &str) -> Result<f64, LedgerError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_getBalance",
            "params": [address, "latest"]
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(map_request_error)?;

        let body = read_json(response).await?;
        parse_balance_response(&body)
    }
}

#[async_trait]
impl LedgerReader for EtherscanLedger {
    async fn fetch(&self, wallet: &WalletAddress) -> Result<WalletLedger, LedgerError> {
        let address = wallet.as_str();
        debug!("Fetching ledger for wallet={}", address);

        let (native_json, token_json, balance_eth) = tokio::try_join!(
            self.with_retry("txlist", move || self.explorer_list("txlist", address)),
            self.with_retry("tokentx", move || self.explorer_list("tokentx", address)),
            self.with_retry("eth_getBalance", move || self.rpc_balance(address)),
        )?;

        let mut transactions = Vec::with_capacity(native_json.len());
        for tx_json in &native_json {
            match parse_transaction(tx_json) {
                Ok(tx) => transactions.push(tx),
                Err(e) => warn!("Failed to parse transaction for {}: {}", address, e),
            }
        }

        let mut token_transfers = Vec::with_capacity(token_json.len());
        for transfer_json in &token_json {
            match parse_token_transfer(transfer_json) {
                Ok(transfer) => token_transfers.push(transfer),
                Err(e) => warn!("Failed to parse token transfer for {}: {}", address, e),
            }
        }

        Ok(WalletLedger::new(transactions, token_transfers, balance_eth))
    }
}

fn map_request_error(err: reqwest::Error) -> LedgerError {
    if err.is_timeout() {
        LedgerError::Timeout
    } else {
        LedgerError::Network(err.to_string())
    }
}

async fn read_json(response: reqwest::Response) -> Result<Value, LedgerError> {
    let status = response.status();
    if status == 429 {
        return Err(LedgerError::RateLimited);
    }
    if status.is_server_error() {
        return Err(LedgerError::Http {
            status: status.as_u16(),
            message: "Server error".to_string(),
        });
    }
    if !status.is_success() {
        return Err(LedgerError::Http {
            status: status.as_u16(),
            message: "Client error".to_string(),
        });
    }

    response.json::<Value>().await.map_err(|e| {
        if e.is_timeout() {
            LedgerError::Timeout
        } else {
            LedgerError::Parse(e.to_string())
        }
    })
}

/// Unwrap an explorer `{status, message, result}` envelope into its result rows.
fn parse_explorer_envelope(body: &Value) -> Result<Vec<Value>, LedgerError> {
    let status = body.get("status").and_then(|v| v.as_str()).unwrap_or("0");
    let message = body.get("message").and_then(|v| v.as_str()).unwrap_or("");
    let result = body.get("result");

    if status == "1" {
        return result
            .and_then(|v| v.as_array())
            .cloned()
            .ok_or_else(|| LedgerError::Parse("Expected array result".to_string()));
    }

    // The explorer reports an empty history as an error envelope.
    if message.starts_with("No transactions found")
        || result.and_then(|v| v.as_array()).is_some_and(|a| a.is_empty())
    {
        return Ok(Vec::new());
    }

    let detail = result.and_then(|v| v.as_str()).unwrap_or(message).to_string();
    let lowered = detail.to_lowercase();
    if lowered.contains("rate limit") {
        Err(LedgerError::RateLimited)
    } else if lowered.contains("invalid address") {
        Err(LedgerError::Malformed(detail))
    } else {
        Err(LedgerError::Provider(detail))
    }
}

fn parse_balance_response(body: &Value) -> Result<f64, LedgerError> {
    if let Some(error) = body.get("error") {
        let code = error.get("code").and_then(|v| v.as_i64()).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown rpc error")
            .to_string();
        return Err(match code {
            -32602 => LedgerError::Malformed(message),
            -32005 | 429 => LedgerError::RateLimited,
            _ => LedgerError::Provider(message),
        });
    }

    let wei_hex = body
        .get("result")
        .and_then(|v| v.as_str())
        .ok_or_else(|| LedgerError::Parse("Missing result field".to_string()))?;
    wei_hex_to_eth(wei_hex)
}

/// Convert a `0x`-prefixed hex wei quantity to ETH.
pub fn wei_hex_to_eth(wei_hex: &str) -> Result<f64, LedgerError> {
    let digits = wei_hex
        .strip_prefix("0x")
        .ok_or_else(|| LedgerError::Parse(format!("Invalid quantity: {}", wei_hex)))?;
    if digits.is_empty() {
        return Ok(0.0);
    }

    let wei = u128::from_str_radix(digits, 16)
        .ok()
        .and_then(|w| i128::try_from(w).ok())
        .ok_or_else(|| LedgerError::Parse(format!("Invalid quantity: {}", wei_hex)))?;
    let eth = Decimal::try_from_i128_with_scale(wei, WEI_DECIMALS)
        .map_err(|e| LedgerError::Parse(format!("Balance out of range: {}", e)))?;

    eth.to_f64()
        .ok_or_else(|| LedgerError::Parse(format!("Balance not representable: {}", eth)))
}

fn str_field<'a>(json: &'a Value, field: &str) -> Result<&'a str, LedgerError> {
    json.get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| LedgerError::Parse(format!("Missing {} field", field)))
}

fn parse_timestamp(json: &Value) -> Result<TimeSecs, LedgerError> {
    let raw = str_field(json, "timeStamp")?;
    raw.trim()
        .parse::<i64>()
        .map(TimeSecs::new)
        .map_err(|e| LedgerError::Parse(format!("Invalid timeStamp {}: {}", raw, e)))
}

fn parse_transaction(tx_json: &Value) -> Result<Transaction, LedgerError> {
    Ok(Transaction::new(
        str_field(tx_json, "hash")?.to_string(),
        str_field(tx_json, "from")?.to_string(),
        tx_json.get("to").and_then(|v| v.as_str()).map(String::from),
        parse_timestamp(tx_json)?,
    ))
}

fn parse_token_transfer(transfer_json: &Value) -> Result<TokenTransfer, LedgerError> {
    Ok(TokenTransfer::new(
        str_field(transfer_json, "hash")?.to_string(),
        str_field(transfer_json, "from")?.to_string(),
        transfer_json.get("to").and_then(|v| v.as_str()).map(String::from),
        parse_timestamp(transfer_json)?,
        str_field(transfer_json, "contractAddress")?.to_string(),
        transfer_json
            .get("tokenSymbol")
            .and_then(|v| v.as_str())
            .map(String::from),
    ))
}
