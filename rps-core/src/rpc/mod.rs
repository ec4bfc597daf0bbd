//! Minimal Ethereum JSON-RPC client over HTTP.

use crate::error::{CoreError, Result};
use crate::types::{TransactionReceipt, TxRequest};
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

#[derive(Clone)]
pub struct RpcClient {
    url: String,
    http: reqwest::Client,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    pub fn new(url: &str) -> Result<Self> {
        if url.is_empty() {
            return Err(CoreError::config("RPC URL cannot be empty"));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            url: url.to_string(),
            http,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one JSON-RPC request and decode its `result`
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!("rpc -> {} #{}", method, id);

        let response: Value = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let result = parse_response(response)?;
        tracing::debug!("rpc <- {} #{}", method, id);

        Ok(serde_json::from_value(result)?)
    }

    pub async fn chain_id(&self) -> Result<u64> {
        let id: U256 = self.request("eth_chainId", json!([])).await?;
        u256_to_u64(id)
    }

    pub async fn call(&self, request: &TxRequest) -> Result<Bytes> {
        self.request("eth_call", json!([request, "latest"])).await
    }

    pub async fn estimate_gas(&self, request: &TxRequest) -> Result<U256> {
        self.request("eth_estimateGas", json!([request])).await
    }

    pub async fn gas_price(&self) -> Result<U256> {
        self.request("eth_gasPrice", json!([])).await
    }

    pub async fn transaction_count(&self, address: Address) -> Result<u64> {
        let count: U256 = self
            .request("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        u256_to_u64(count)
    }

    pub async fn balance(&self, address: Address) -> Result<U256> {
        self.request("eth_getBalance", json!([address, "latest"]))
            .await
    }

    pub async fn accounts(&self) -> Result<Vec<Address>> {
        self.request("eth_accounts", json!([])).await
    }

    pub async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.request("eth_requestAccounts", json!([])).await
    }

    /// Submit a transaction for the endpoint to sign
    pub async fn send_transaction(&self, request: &TxRequest) -> Result<B256> {
        self.request("eth_sendTransaction", json!([request])).await
    }

    pub async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256> {
        self.request("eth_sendRawTransaction", json!([raw])).await
    }

    pub async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TransactionReceipt>> {
        self.request("eth_getTransactionReceipt", json!([tx_hash]))
            .await
    }

    /// Poll until the transaction is mined. A reverted receipt is an error.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: B256,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<TransactionReceipt> {
        let started = Instant::now();

        loop {
            if let Some(receipt) = self.transaction_receipt(tx_hash).await? {
                if !receipt.succeeded() {
                    return Err(CoreError::Reverted {
                        tx_hash: tx_hash.to_string(),
                    });
                }

                tracing::info!(
                    "Transaction {} confirmed in block {}",
                    tx_hash,
                    receipt
                        .block_number
                        .map(|b| b.to_string())
                        .unwrap_or_else(|| "?".to_string())
                );
                return Ok(receipt);
            }

            if started.elapsed() >= timeout {
                return Err(CoreError::Timeout(format!(
                    "Transaction {} not mined after {}s",
                    tx_hash,
                    timeout.as_secs()
                )));
            }

            sleep(poll_interval).await;
        }
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient").field("url", &self.url).finish()
    }
}

/// Extract `result` from a JSON-RPC response envelope, mapping `error` objects
pub fn parse_response(response: Value) -> Result<Value> {
    if let Some(error) = response.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        let data = match error.get("data") {
            Some(Value::String(s)) => Some(s.clone()),
            // some nodes nest revert data as {"data": "0x..."}
            Some(Value::Object(obj)) => obj.get("data").and_then(Value::as_str).map(String::from),
            _ => None,
        };
        return Err(CoreError::rpc(code, message, data));
    }

    match response.get("result") {
        Some(result) => Ok(result.clone()),
        None => Err(CoreError::internal("RPC response has neither result nor error")),
    }
}

pub fn u256_to_u64(value: U256) -> Result<u64> {
    if value > U256::from(u64::MAX) {
        return Err(CoreError::internal(format!("Quantity {} overflows u64", value)));
    }
    Ok(value.as_limbs()[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result() {
        let value = parse_response(json!({"jsonrpc": "2.0", "id": 1, "result": "0x7a69"})).unwrap();
        let chain_id: U256 = serde_json::from_value(value).unwrap();
        assert_eq!(u256_to_u64(chain_id).unwrap(), 31337);
    }

    #[test]
    fn test_parse_error_with_revert_data() {
        let err = parse_response(json!({
            "jsonrpc": "2.0",
            "id": 7,
            "error": {"code": 3, "message": "execution reverted", "data": "0x08c379a0"}
        }))
        .unwrap_err();

        match &err {
            CoreError::Rpc { code, message, .. } => {
                assert_eq!(*code, 3);
                assert_eq!(message, "execution reverted");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.rpc_data(), Some("0x08c379a0"));
    }

    #[test]
    fn test_parse_null_receipt() {
        let value = parse_response(json!({"jsonrpc": "2.0", "id": 2, "result": null})).unwrap();
        let receipt: Option<TransactionReceipt> = serde_json::from_value(value).unwrap();
        assert!(receipt.is_none());
    }

    #[test]
    fn test_u256_overflow() {
        assert!(u256_to_u64(U256::MAX).is_err());
        assert_eq!(u256_to_u64(U256::from(42u64)).unwrap(), 42);
    }

    #[test]
    fn test_empty_url_rejected() {
        assert!(RpcClient::new("").is_err());
    }
}
