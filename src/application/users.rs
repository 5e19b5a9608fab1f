use crate::application::access::Caller;
use crate::application::lookup;
use crate::domain::entities::user::{NewUser, User};
use crate::domain::error::DomainError;
use crate::domain::ports::ledger_store::{DeleteSummary, LedgerStore};
use crate::domain::values::entity_id::Collection;
use crate::domain::values::role::Role;
use crate::domain::values::wallet_address::WalletAddress;
use std::sync::Arc;
use tracing::info;

pub struct UserUseCase {
    store: Arc<dyn LedgerStore>,
}

impl UserUseCase {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
        wallet_address: Option<&str>,
        role: Role,
    ) -> Result<User, DomainError> {
        let mut new_user = NewUser::new(username, password, email, role);
        if new_user.username.is_empty() {
            return Err(DomainError::InvalidInput("Username is required".into()));
        }
        if !new_user.email.contains('@') {
            return Err(DomainError::InvalidInput(format!("Invalid email: {email}")));
        }
        if let Some(raw) = wallet_address {
            new_user = new_user.with_wallet(WalletAddress::parse(raw).map_err(DomainError::InvalidInput)?);
        }
        let user = self.store.create_user(new_user)?;
        info!(id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    pub fn get(&self, raw_id: &str) -> Result<Option<User>, DomainError> {
        match lookup(self.store.as_ref(), Collection::Users, raw_id)? {
            Some(id) => self.store.get_user(&id),
            None => Ok(None),
        }
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        self.store.find_user_by_username(username.trim())
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.store.find_user_by_email(email)
    }

    pub fn list(&self) -> Result<Vec<User>, DomainError> {
        self.store.list_users()
    }

    pub fn set_wallet(&self, caller: &Caller, raw_id: &str, address: &str) -> Result<User, DomainError> {
        let id = self.store.resolve_id(Collection::Users, raw_id)?;
        caller.require_self(&id)?;
        let address = WalletAddress::parse(address).map_err(DomainError::InvalidInput)?;
        let user = self.store.update_user_wallet_address(&id, &address)?;
        info!(user = %id, wallet = %address, "wallet address set");
        Ok(user)
    }

    pub fn confirm_wallet(&self, caller: &Caller, raw_id: &str, address: &str) -> Result<User, DomainError> {
        let id = self.store.resolve_id(Collection::Users, raw_id)?;
        caller.require_self(&id)?;
        let address = WalletAddress::parse(address).map_err(DomainError::InvalidInput)?;
        let user = self.store.confirm_user_wallet_address(&id, &address)?;
        info!(user = %id, wallet = %address, "wallet address confirmed");
        Ok(user)
    }

    pub fn delete(&self, caller: &Caller, raw_id: &str) -> Result<DeleteSummary, DomainError> {
        let id = self.store.resolve_id(Collection::Users, raw_id)?;
        caller.require_self(&id)?;
        self.store.delete_user(&id)
    }
}
