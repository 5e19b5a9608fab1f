use crate::domain::ports::wallet_provider::TransferReceipt;
use serde::Serialize;
use std::fmt;

/// Connection state of the wallet transfer client.
///
/// `Submitting` is published while the provider waits for the user to
/// approve a transfer; the client returns to `Connected` once they decide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected { address: String },
    Submitting { address: String },
}

impl ConnectionState {
    /// The active account, while one is connected.
    pub fn address(&self) -> Option<&str> {
        match self {
            ConnectionState::Connected { address } | ConnectionState::Submitting { address } => {
                Some(address)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected { address } => write!(f, "connected({address})"),
            ConnectionState::Submitting { address } => write!(f, "submitting({address})"),
        }
    }
}

/// Lifecycle of a single submitted transfer.
///
/// `Submitted` is the only non-terminal phase a watch can observe; the other
/// three are final. `ConfirmationUnknown` means polling gave up, not that the
/// transfer failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TransferPhase {
    Submitted { reference: String, attempts: u32 },
    Confirmed { receipt: TransferReceipt },
    Failed { receipt: TransferReceipt },
    ConfirmationUnknown { reference: String, attempts: u32 },
}

impl TransferPhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferPhase::Submitted { .. })
    }
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferPhase::Submitted { .. } => write!(f, "submitted"),
            TransferPhase::Confirmed { .. } => write!(f, "confirmed"),
            TransferPhase::Failed { .. } => write!(f, "failed"),
            TransferPhase::ConfirmationUnknown { .. } => write!(f, "confirmation_unknown"),
        }
    }
}
