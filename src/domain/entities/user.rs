use crate::domain::values::entity_id::EntityId;
use crate::domain::values::role::Role;
use crate::domain::values::wallet_address::WalletAddress;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub password: String,
    pub email: String,
    pub wallet_address: Option<WalletAddress>,
    pub wallet_confirmed: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Registration input. The password is an opaque credential produced by the
/// access layer; the ledger never inspects it.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub wallet_address: Option<WalletAddress>,
    pub role: Role,
}

impl NewUser {
    pub fn new(username: &str, password: &str, email: &str, role: Role) -> Self {
        Self {
            username: username.trim().to_string(),
            password: password.to_string(),
            email: email.trim().to_lowercase(),
            wallet_address: None,
            role,
        }
    }

    pub fn with_wallet(mut self, address: WalletAddress) -> Self {
        self.wallet_address = Some(address);
        self
    }

    pub fn into_user(self, id: EntityId) -> User {
        User {
            id,
            username: self.username,
            password: self.password,
            email: self.email,
            wallet_address: self.wallet_address,
            wallet_confirmed: false,
            role: self.role,
            created_at: Utc::now(),
        }
    }
}
