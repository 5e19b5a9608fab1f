//! Wallet transfer client.
//!
//! Connection state lives in a `watch` channel so callers can observe
//! `Idle -> Connecting -> Connected -> Submitting` without polling. Every
//! broadcast transfer gets its own poll task and its own phase channel;
//! watches share nothing with each other or with the connection state.
//!
//! A broadcast transfer cannot be recalled. [`TransferWatch::stop_watching`]
//! only stops polling for its receipt.

use crate::domain::error::WalletError;
use crate::domain::ports::wallet_provider::{
    ProviderError, ProviderEvent, ReceiptStatus, TransferParams, TransferReceipt, WalletProvider,
};
use crate::domain::values::amount::Amount;
use crate::domain::values::transfer::{ConnectionState, TransferPhase};
use crate::domain::values::wallet_address::WalletAddress;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);
pub const DEFAULT_POLL_ATTEMPTS: u32 = 40;

/// How often and how long to wait for a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_POLL_ATTEMPTS,
        }
    }
}

pub struct WalletTransferClient {
    provider: Option<Arc<dyn WalletProvider>>,
    poll: PollConfig,
    state: watch::Sender<ConnectionState>,
    chain_id: watch::Sender<Option<String>>,
}

impl WalletTransferClient {
    /// `provider` is `None` when no wallet is present; every operation that
    /// needs one then fails with `ProviderUnavailable`.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, poll: PollConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        let (chain_id, _) = watch::channel(None);
        Self {
            provider,
            poll,
            state,
            chain_id,
        }
    }

    pub fn with_provider(provider: Arc<dyn WalletProvider>) -> Self {
        Self::new(Some(provider), PollConfig::default())
    }

    pub fn poll_config(&self) -> PollConfig {
        self.poll
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn active_address(&self) -> Option<String> {
        self.state.borrow().address().map(str::to_string)
    }

    pub fn chain_id(&self) -> Option<String> {
        self.chain_id.borrow().clone()
    }

    fn provider(&self) -> Result<&Arc<dyn WalletProvider>, WalletError> {
        self.provider.as_ref().ok_or(WalletError::ProviderUnavailable)
    }

    /// Ask the provider for account access and connect to the first account.
    ///
    /// Suspends until the user decides. Any failure leaves the client `Idle`.
    pub async fn connect(&self) -> Result<String, WalletError> {
        let provider = self.provider()?;
        self.state.send_replace(ConnectionState::Connecting);
        info!(provider = provider.name(), "requesting wallet accounts");

        let result = match provider.request_accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(first) => WalletAddress::parse(first).map_err(|e| {
                    WalletError::Provider(format!("provider returned a bad account: {e}"))
                }),
                None => Err(WalletError::UserRejected),
            },
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(address) => {
                let address = address.as_str().to_string();
                self.state.send_replace(ConnectionState::Connected {
                    address: address.clone(),
                });
                info!(%address, "wallet connected");
                Ok(address)
            }
            Err(e) => {
                self.state.send_replace(ConnectionState::Idle);
                warn!(error = %e, "wallet connection failed");
                Err(e)
            }
        }
    }

    pub fn disconnect(&self) {
        self.state.send_replace(ConnectionState::Idle);
    }

    /// Convert `amount` to minor units, ask the provider to send it to `to`
    /// and start watching for a receipt.
    ///
    /// The client is `Submitting` until the provider answers, then
    /// `Connected` again whatever the outcome. Returns once the transfer is
    /// broadcast. A user rejection is reported as `UserRejected`.
    pub async fn submit_transfer(&self, to: &str, amount: &str) -> Result<TransferWatch, WalletError> {
        let provider = self.provider()?;
        let from = self.active_address().ok_or(WalletError::NotConnected)?;
        let to = WalletAddress::parse(to).map_err(WalletError::InvalidInput)?;
        let value = Amount::parse_positive(amount).map_err(WalletError::InvalidInput)?;

        let params = TransferParams {
            from,
            to: to.as_str().to_string(),
            value: value.to_hex(),
        };
        debug!(to = %params.to, value = %params.value, "submitting transfer");

        let sent = {
            let _submitting = SubmittingGuard::enter(&self.state, params.from.clone());
            provider.send_transfer(&params).await
        };
        let reference = match sent {
            Ok(reference) => reference,
            Err(ProviderError::UserRejected) => {
                info!(to = %params.to, "transfer rejected by user");
                return Err(WalletError::UserRejected);
            }
            Err(e) => {
                warn!(error = %e, "transfer submission failed");
                return Err(e.into());
            }
        };
        info!(%reference, amount = %value, "transfer broadcast");
        self.watch_transfer(reference)
    }

    /// Start polling for the receipt of an already broadcast transfer.
    pub fn watch_transfer(&self, reference: impl Into<String>) -> Result<TransferWatch, WalletError> {
        let provider = Arc::clone(self.provider()?);
        let reference = reference.into();
        let (tx, rx) = watch::channel(TransferPhase::Submitted {
            reference: reference.clone(),
            attempts: 0,
        });
        let task = tokio::spawn(poll_receipt(provider, reference.clone(), self.poll, tx));
        Ok(TransferWatch {
            reference,
            phase: rx,
            task,
        })
    }

    pub fn apply_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                Some(first) => match WalletAddress::parse(first) {
                    Ok(address) => {
                        info!(%address, "active account changed");
                        self.state.send_replace(ConnectionState::Connected {
                            address: address.as_str().to_string(),
                        });
                    }
                    Err(e) => warn!(error = %e, "ignoring bad account from provider"),
                },
                None => {
                    info!("wallet accounts revoked");
                    self.state.send_replace(ConnectionState::Idle);
                }
            },
            ProviderEvent::ChainChanged(chain) => {
                info!(%chain, "wallet network changed");
                self.chain_id.send_replace(Some(chain));
            }
            ProviderEvent::Disconnected => {
                info!("wallet provider disconnected");
                self.state.send_replace(ConnectionState::Idle);
            }
        }
    }

    /// Apply provider notifications from a background task until the
    /// provider closes its event stream.
    pub fn listen(self: &Arc<Self>) -> Result<JoinHandle<()>, WalletError> {
        let mut events = self.provider()?.subscribe();
        let client = Arc::clone(self);
        Ok(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => client.apply_event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "dropped wallet provider events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("wallet event stream closed");
        }))
    }
}

/// Holds the client in `Submitting` while the provider waits for the user.
/// Dropping it, including when the submitting future is cancelled, puts
/// `Connected` back unless a provider event already moved the state on.
struct SubmittingGuard<'a> {
    state: &'a watch::Sender<ConnectionState>,
    address: String,
}

impl<'a> SubmittingGuard<'a> {
    fn enter(state: &'a watch::Sender<ConnectionState>, address: String) -> Self {
        state.send_replace(ConnectionState::Submitting {
            address: address.clone(),
        });
        Self { state, address }
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        let address = &self.address;
        self.state.send_if_modified(|current| {
            let pending = matches!(
                current,
                ConnectionState::Submitting { address: a } if a == address
            );
            if pending {
                *current = ConnectionState::Connected {
                    address: address.clone(),
                };
            }
            pending
        });
    }
}

async fn poll_receipt(
    provider: Arc<dyn WalletProvider>,
    reference: String,
    poll: PollConfig,
    phase: watch::Sender<TransferPhase>,
) {
    for attempt in 1..=poll.max_attempts {
        tokio::time::sleep(poll.interval).await;
        match provider.get_transfer_receipt(&reference).await {
            Ok(Some(receipt)) => {
                let next = match receipt.status {
                    ReceiptStatus::Success => {
                        info!(%reference, attempt, "transfer confirmed");
                        TransferPhase::Confirmed { receipt }
                    }
                    ReceiptStatus::Failure => {
                        warn!(%reference, attempt, "transfer failed on chain");
                        TransferPhase::Failed { receipt }
                    }
                };
                phase.send_replace(next);
                return;
            }
            Ok(None) => debug!(%reference, attempt, "receipt not available yet"),
            Err(e) => warn!(%reference, attempt, error = %e, "receipt lookup failed"),
        }
        phase.send_replace(TransferPhase::Submitted {
            reference: reference.clone(),
            attempts: attempt,
        });
    }
    warn!(%reference, attempts = poll.max_attempts, "gave up waiting for receipt");
    phase.send_replace(TransferPhase::ConfirmationUnknown {
        reference,
        attempts: poll.max_attempts,
    });
}

/// Handle on one submitted transfer.
pub struct TransferWatch {
    reference: String,
    phase: watch::Receiver<TransferPhase>,
    task: JoinHandle<()>,
}

impl TransferWatch {
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn phase(&self) -> TransferPhase {
        self.phase.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TransferPhase> {
        self.phase.clone()
    }

    /// Wait for a final phase. Only a confirmed transfer is `Ok`; a watch
    /// that ends without a verdict is `ConfirmationUnknown`.
    pub async fn wait(mut self) -> Result<TransferReceipt, WalletError> {
        loop {
            let current = self.phase.borrow_and_update().clone();
            if let Some(outcome) = settle(current) {
                return outcome;
            }
            if self.phase.changed().await.is_err() {
                let last = self.phase.borrow().clone();
                return settle(last).unwrap_or(Err(WalletError::ConfirmationUnknown {
                    reference: self.reference,
                }));
            }
        }
    }

    /// Stop polling. The transfer itself is unaffected.
    pub fn stop_watching(self) {
        debug!(reference = %self.reference, "stopped watching transfer");
        self.task.abort();
    }
}

fn settle(phase: TransferPhase) -> Option<Result<TransferReceipt, WalletError>> {
    match phase {
        TransferPhase::Submitted { .. } => None,
        TransferPhase::Confirmed { receipt } => Some(Ok(receipt)),
        TransferPhase::Failed { receipt } => Some(Err(WalletError::TransferFailed {
            reference: receipt.reference,
        })),
        TransferPhase::ConfirmationUnknown { reference, .. } => {
            Some(Err(WalletError::ConfirmationUnknown { reference }))
        }
    }
}
