//! Wallet provider port.
//!
//! A wallet provider is an external, user-controlled agent that holds signing
//! keys. Account access and transfer submission both suspend until a human
//! approves or declines; receipts are fetched after broadcast.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

/// Parameters for a value transfer. `value` is already in wire form
/// (`0x`-prefixed minor units).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferParams {
    pub from: String,
    pub to: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub reference: String,
    pub status: ReceiptStatus,
    pub block_number: Option<u64>,
}

/// Account and network notifications pushed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(String),
    Disconnected,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("request rejected by user")]
    UserRejected,

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider request failed: {0}")]
    Request(String),
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Name of this provider for logging.
    fn name(&self) -> &str;

    /// Ask the user for account access. Suspends until they decide.
    async fn request_accounts(&self) -> Result<Vec<String>, ProviderError>;

    /// Ask the user to sign and broadcast a transfer. Returns the transfer
    /// reference as soon as it is broadcast, before confirmation.
    async fn send_transfer(&self, params: &TransferParams) -> Result<String, ProviderError>;

    /// `Ok(None)` while the transfer is still pending.
    async fn get_transfer_receipt(
        &self,
        reference: &str,
    ) -> Result<Option<TransferReceipt>, ProviderError>;

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}
