use crate::domain::ports::wallet_provider::ProviderError;
use std::fmt;
use thiserror::Error;

/// Which uniqueness or state rule a mutation tripped over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    Username,
    Email,
    Wallet,
    WalletConfirmed,
    StartupOwner,
    TransactionRef,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::Username => write!(f, "username already taken"),
            ConflictReason::Email => write!(f, "email already registered"),
            ConflictReason::Wallet => write!(f, "wallet address bound to another user"),
            ConflictReason::WalletConfirmed => write!(f, "wallet address already confirmed"),
            ConflictReason::StartupOwner => write!(f, "user already owns a startup"),
            ConflictReason::TransactionRef => write!(f, "transaction reference already recorded"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(ConflictReason),

    #[error("Mismatch: {0}")]
    Mismatch(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound(_))
    }
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Parse(e.to_string())
    }
}

/// Errors surfaced by the wallet transfer client, either at a suspension
/// point (connect, submit) or through a transfer's final state.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("User rejected the request")]
    UserRejected,

    #[error("No wallet provider available")]
    ProviderUnavailable,

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Transfer {reference} failed")]
    TransferFailed { reference: String },

    #[error("Transfer {reference} was not confirmed within the polling window")]
    ConfirmationUnknown { reference: String },

    #[error("Provider error: {0}")]
    Provider(String),
}

impl From<ProviderError> for WalletError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::UserRejected => WalletError::UserRejected,
            ProviderError::Unavailable(_) => WalletError::ProviderUnavailable,
            ProviderError::Request(msg) => WalletError::Provider(msg),
        }
    }
}

/// Failure of an investment that is paid through the wallet before it is
/// recorded in the ledger.
#[derive(Debug, Error)]
pub enum InvestError {
    #[error(transparent)]
    Ledger(#[from] DomainError),

    #[error(transparent)]
    Wallet(#[from] WalletError),
}
