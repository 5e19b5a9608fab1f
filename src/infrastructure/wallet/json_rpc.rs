use crate::domain::ports::wallet_provider::{
    ProviderError, ProviderEvent, ReceiptStatus, TransferParams, TransferReceipt, WalletProvider,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

/// EIP-1193 code for a request the user declined.
const USER_REJECTED_CODE: i64 = 4001;

/// Wallet provider reached over Ethereum JSON-RPC, e.g. a local signer or a
/// wallet bridge.
///
/// Plain HTTP has no push channel, so `subscribe` only yields events passed
/// to [`JsonRpcWalletProvider::notify`].
pub struct JsonRpcWalletProvider {
    client: Client,
    url: String,
    next_id: AtomicU64,
    events: broadcast::Sender<ProviderEvent>,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: String,
    status: Option<String>,
    block_number: Option<String>,
}

impl JsonRpcWalletProvider {
    pub fn new(url: String) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            client: Client::new(),
            url,
            next_id: AtomicU64::new(1),
            events,
        }
    }

    pub fn notify(&self, event: ProviderEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "wallet rpc call");

        let resp = self
            .client
            .post(&self.url)
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("{}: {e}", self.url)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Request(format!("{method} {status}: {body}")));
        }

        let body: RpcResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Request(format!("{method}: bad response: {e}")))?;

        if let Some(err) = body.error {
            if err.code == USER_REJECTED_CODE {
                return Err(ProviderError::UserRejected);
            }
            return Err(ProviderError::Request(format!(
                "{method} failed ({}): {}",
                err.code, err.message
            )));
        }
        Ok(body.result.unwrap_or(Value::Null))
    }
}

fn parse_quantity(raw: &str) -> Option<u64> {
    u64::from_str_radix(raw.strip_prefix("0x").unwrap_or(raw), 16).ok()
}

/// Only `0x1` and `0x0` are verdicts. Pre-Byzantium receipts carry no status
/// at all, so they say nothing about the outcome.
fn receipt_status(raw: Option<&str>) -> Result<ReceiptStatus, ProviderError> {
    match raw.map(|s| (s, parse_quantity(s))) {
        Some((_, Some(1))) => Ok(ReceiptStatus::Success),
        Some((_, Some(0))) => Ok(ReceiptStatus::Failure),
        Some((s, _)) => Err(ProviderError::Request(format!(
            "eth_getTransactionReceipt: unknown status {s}"
        ))),
        None => Err(ProviderError::Request(
            "eth_getTransactionReceipt: receipt has no status".into(),
        )),
    }
}

#[async_trait::async_trait]
impl WalletProvider for JsonRpcWalletProvider {
    fn name(&self) -> &str {
        "json-rpc"
    }

    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError> {
        let result = self.call("eth_requestAccounts", json!([])).await?;
        serde_json::from_value(result)
            .map_err(|e| ProviderError::Request(format!("eth_requestAccounts: {e}")))
    }

    async fn send_transfer(&self, params: &TransferParams) -> Result<String, ProviderError> {
        let result = self
            .call(
                "eth_sendTransaction",
                json!([{ "from": params.from, "to": params.to, "value": params.value }]),
            )
            .await?;
        result
            .as_str()
            .map(String::from)
            .ok_or_else(|| ProviderError::Request("eth_sendTransaction returned no hash".into()))
    }

    async fn get_transfer_receipt(
        &self,
        reference: &str,
    ) -> Result<Option<TransferReceipt>, ProviderError> {
        let result = self
            .call("eth_getTransactionReceipt", json!([reference]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let receipt: RpcReceipt = serde_json::from_value(result)
            .map_err(|e| ProviderError::Request(format!("eth_getTransactionReceipt: {e}")))?;
        let status = receipt_status(receipt.status.as_deref())?;
        Ok(Some(TransferReceipt {
            reference: receipt.transaction_hash,
            status,
            block_number: receipt.block_number.as_deref().and_then(parse_quantity),
        }))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x1"), Some(1));
        assert_eq!(parse_quantity("0x0"), Some(0));
        assert_eq!(parse_quantity("0x10d4f"), Some(68943));
        assert_eq!(parse_quantity("0xzz"), None);
    }

    #[test]
    fn test_receipt_status_needs_a_verdict() {
        assert_eq!(receipt_status(Some("0x1")), Ok(ReceiptStatus::Success));
        assert_eq!(receipt_status(Some("0x0")), Ok(ReceiptStatus::Failure));
        assert!(matches!(receipt_status(None), Err(ProviderError::Request(_))));
        assert!(matches!(
            receipt_status(Some("0x2")),
            Err(ProviderError::Request(_))
        ));
        assert!(matches!(
            receipt_status(Some("pending")),
            Err(ProviderError::Request(_))
        ));
    }

    #[test]
    fn test_receipt_shape() {
        let raw = json!({
            "transactionHash": "0xabc",
            "status": "0x1",
            "blockNumber": "0x10"
        });
        let r: RpcReceipt = serde_json::from_value(raw).unwrap();
        assert_eq!(r.transaction_hash, "0xabc");
        assert_eq!(r.status.as_deref(), Some("0x1"));
        assert_eq!(r.block_number.as_deref().and_then(parse_quantity), Some(16));
    }
}
