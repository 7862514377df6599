//! ENS registrar controller client.
//!
//! Availability is answered by the controller's `available(string)` view
//! function, called through `eth_call` on any Ethereum JSON-RPC endpoint
//! (Infura by default). Calldata is ABI-encoded by hand since the call
//! has a single dynamic `string` argument and a `bool` result.

use crate::error::HuntError;
use crate::protocols::Oracle;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Mainnet address of the ENS registrar controller.
pub const REGISTRAR_CONTROLLER: &str = "0x283Af0B28c62C092C9727F1Ee09c02CA627EB7F5";

/// First four bytes of keccak256("available(string)").
const AVAILABLE_SELECTOR: &str = "aeb8ce9b";

const WORD: usize = 32;

/// JSON-RPC client for the registrar controller.
#[derive(Debug)]
pub struct RegistrarClient {
    /// HTTP client for JSON-RPC requests
    http_client: reqwest::Client,
    /// JSON-RPC endpoint URL
    endpoint: String,
    /// Controller contract address
    contract: String,
    /// Monotonic JSON-RPC request id
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl RegistrarClient {
    /// Create a client for `endpoint` with the default request timeout.
    pub fn new<S: Into<String>>(endpoint: S) -> Result<Self, HuntError> {
        Self::with_timeout(endpoint, Duration::from_secs(30))
    }

    /// Create a client whose individual HTTP requests time out after `timeout`.
    pub fn with_timeout<S: Into<String>>(endpoint: S, timeout: Duration) -> Result<Self, HuntError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                HuntError::network_with_source("Failed to create RPC HTTP client", e.to_string())
            })?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            contract: REGISTRAR_CONTROLLER.to_string(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Mainnet endpoint for an Infura project id.
    pub fn infura_endpoint(project_id: &str) -> String {
        format!("https://mainnet.infura.io/v3/{}", project_id)
    }

    /// Point the client at a different controller deployment.
    pub fn with_contract<S: Into<String>>(mut self, contract: S) -> Self {
        self.contract = contract.into();
        self
    }

    /// Create a client and verify the endpoint answers.
    ///
    /// # Errors
    ///
    /// Any failure here means the scan cannot start.
    pub async fn connect<S: Into<String>>(endpoint: S, timeout: Duration) -> Result<Self, HuntError> {
        let client = Self::with_timeout(endpoint, timeout)?;
        let chain_id = client.chain_id().await?;
        tracing::debug!(chain_id, endpoint = %client.endpoint, "connected to JSON-RPC endpoint");
        Ok(client)
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query `eth_chainId`.
    pub async fn chain_id(&self) -> Result<u64, HuntError> {
        let value = self.request("eth_chainId", json!([])).await?;
        let hex = value
            .as_str()
            .ok_or_else(|| HuntError::parse("eth_chainId result is not a string"))?;
        u64::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|e| HuntError::parse(format!("Invalid chain id '{}': {}", hex, e)))
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, HuntError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HuntError::network(format!(
                "{} returned HTTP {}",
                method,
                status.as_u16()
            )));
        }

        let payload: RpcResponse = response.json().await?;
        if let Some(error) = payload.error {
            return Err(HuntError::rpc(error.code, error.message));
        }
        payload
            .result
            .ok_or_else(|| HuntError::parse(format!("{} response has no result", method)))
    }
}

#[async_trait]
impl Oracle for RegistrarClient {
    async fn available(&self, label: &str) -> Result<bool, HuntError> {
        let params = json!([
            { "to": self.contract, "data": encode_available_call(label) },
            "latest"
        ]);
        let value = self.request("eth_call", params).await?;
        let hex = value
            .as_str()
            .ok_or_else(|| HuntError::parse("eth_call result is not a string"))?;
        decode_bool(hex)
    }
}

/// ABI-encode `available(label)` as `0x`-prefixed calldata.
pub(crate) fn encode_available_call(label: &str) -> String {
    let bytes = label.as_bytes();
    let padded_len = bytes.len().div_ceil(WORD) * WORD;

    let mut data = String::with_capacity(2 + 8 + 2 * (2 * WORD + padded_len));
    data.push_str("0x");
    data.push_str(AVAILABLE_SELECTOR);
    push_word(&mut data, WORD as u64); // offset of the string payload
    push_word(&mut data, bytes.len() as u64);
    for byte in bytes {
        let _ = write!(data, "{:02x}", byte);
    }
    for _ in bytes.len()..padded_len {
        data.push_str("00");
    }
    data
}

fn push_word(data: &mut String, value: u64) {
    let _ = write!(data, "{:064x}", value);
}

/// Decode an ABI `bool` return value.
pub(crate) fn decode_bool(hex: &str) -> Result<bool, HuntError> {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    if digits.len() < 2 * WORD {
        return Err(HuntError::parse(format!(
            "eth_call returned {} hex digits, expected at least {}",
            digits.len(),
            2 * WORD
        )));
    }

    let word = &digits[..2 * WORD];
    let (high, low) = word.split_at(2 * WORD - 2);
    if !high.bytes().all(|b| b == b'0') {
        return Err(HuntError::parse(format!("Not an ABI bool: 0x{}", word)));
    }
    match low {
        "00" => Ok(false),
        "01" => Ok(true),
        other => Err(HuntError::parse(format!("Not an ABI bool: 0x..{}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_short_label() {
        let data = encode_available_call("abc");
        let expected = format!(
            "0x{}{:064x}{:064x}{}{}",
            AVAILABLE_SELECTOR,
            32,
            3,
            "616263",
            "0".repeat(58)
        );
        assert_eq!(data, expected);
        assert_eq!((data.len() - 10) % 64, 0);
    }

    #[test]
    fn test_encode_exact_word_label() {
        let label = "a".repeat(32);
        let data = encode_available_call(&label);
        // selector + offset + length + one word of payload
        assert_eq!(data.len(), 2 + 8 + 64 * 3);
        assert!(data.ends_with(&"61".repeat(32)));
    }

    #[test]
    fn test_encode_empty_label() {
        let data = encode_available_call("");
        assert_eq!(data.len(), 2 + 8 + 64 * 2);
    }

    #[test]
    fn test_decode_bool() {
        assert!(decode_bool(&format!("0x{:064x}", 1)).unwrap());
        assert!(!decode_bool(&format!("0x{:064x}", 0)).unwrap());
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(
            decode_bool("0x").unwrap_err(),
            HuntError::ParseError { .. }
        ));
        assert!(decode_bool(&format!("0x{:064x}", 2)).is_err());
        assert!(decode_bool(&format!("0x1{:063x}", 1)).is_err());
    }

    #[test]
    fn test_infura_endpoint() {
        assert_eq!(
            RegistrarClient::infura_endpoint("abc123"),
            "https://mainnet.infura.io/v3/abc123"
        );
    }
}
