pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::access::Caller;
use crate::application::funding::{FundingAggregator, FundingProgress};
use crate::application::startups::StartupUseCase;
use crate::application::users::UserUseCase;
use crate::application::wallet_transfer::WalletTransferClient;
use crate::config::LedgerConfig;
use crate::domain::entities::investment::Investment;
use crate::domain::entities::milestone::Milestone;
use crate::domain::entities::startup::{Startup, StartupProfile};
use crate::domain::entities::update::Update;
use crate::domain::entities::user::User;
use crate::domain::error::{DomainError, InvestError};
use crate::domain::ports::ledger_store::{BackendKind, DeleteSummary, LedgerStore};
use crate::domain::ports::wallet_provider::WalletProvider;
use crate::domain::values::amount::Amount;
use crate::domain::values::entity_id::{Collection, EntityId};
use crate::domain::values::role::Role;
use crate::infrastructure::document::DocumentLedgerStore;
use crate::infrastructure::memory::MemoryLedgerStore;
use crate::infrastructure::wallet::JsonRpcWalletProvider;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

pub struct FundLedger {
    store: Arc<dyn LedgerStore>,
    users_uc: UserUseCase,
    startups_uc: StartupUseCase,
    funding_uc: FundingAggregator,
    wallet: Arc<WalletTransferClient>,
}

impl FundLedger {
    /// Open the backend named by `config`. The choice is fixed for the
    /// lifetime of the ledger.
    pub fn new(config: &LedgerConfig) -> Result<Self, DomainError> {
        let store: Arc<dyn LedgerStore> = match config.backend {
            BackendKind::Memory => Arc::new(MemoryLedgerStore::new()),
            BackendKind::Document => {
                Arc::new(DocumentLedgerStore::open(&config.db_path, config.prefix_policy)?)
            }
        };
        let provider = config.wallet_rpc_url.as_ref().map(|url| {
            Arc::new(JsonRpcWalletProvider::new(url.clone())) as Arc<dyn WalletProvider>
        });
        info!(backend = %store.backend(), wallet = provider.is_some(), "ledger opened");
        Ok(Self::with_store(store, WalletTransferClient::new(provider, config.poll)))
    }

    pub fn with_store(store: Arc<dyn LedgerStore>, wallet: WalletTransferClient) -> Self {
        Self {
            users_uc: UserUseCase::new(store.clone()),
            startups_uc: StartupUseCase::new(store.clone()),
            funding_uc: FundingAggregator::new(store.clone()),
            store,
            wallet: Arc::new(wallet),
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.store.backend()
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    pub fn wallet(&self) -> &Arc<WalletTransferClient> {
        &self.wallet
    }

    pub fn resolve_id(&self, collection: Collection, raw: &str) -> Result<EntityId, DomainError> {
        self.store.resolve_id(collection, raw)
    }

    /// Build the caller identity for an existing user.
    pub fn caller_for(&self, raw_user_id: &str) -> Result<Caller, DomainError> {
        self.users_uc
            .get(raw_user_id)?
            .map(|u| Caller::from(&u))
            .ok_or_else(|| DomainError::NotFound(format!("users {raw_user_id}")))
    }

    // Users
    pub fn register_user(
        &self,
        username: &str,
        password: &str,
        email: &str,
        wallet_address: Option<&str>,
        role: Role,
    ) -> Result<User, DomainError> {
        self.users_uc.register(username, password, email, wallet_address, role)
    }

    pub fn user(&self, raw_id: &str) -> Result<Option<User>, DomainError> {
        self.users_uc.get(raw_id)
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        self.users_uc.find_by_username(username)
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.users_uc.find_by_email(email)
    }

    pub fn users(&self) -> Result<Vec<User>, DomainError> {
        self.users_uc.list()
    }

    pub fn set_wallet(&self, caller: &Caller, raw_id: &str, address: &str) -> Result<User, DomainError> {
        self.users_uc.set_wallet(caller, raw_id, address)
    }

    pub fn confirm_wallet(&self, caller: &Caller, raw_id: &str, address: &str) -> Result<User, DomainError> {
        self.users_uc.confirm_wallet(caller, raw_id, address)
    }

    pub fn delete_user(&self, caller: &Caller, raw_id: &str) -> Result<DeleteSummary, DomainError> {
        self.users_uc.delete(caller, raw_id)
    }

    // Startups
    pub fn create_startup(&self, caller: &Caller, profile: StartupProfile) -> Result<Startup, DomainError> {
        self.startups_uc.create(caller, profile)
    }

    pub fn startup(&self, raw_id: &str) -> Result<Option<Startup>, DomainError> {
        self.startups_uc.get(raw_id)
    }

    pub fn startup_for_user(&self, raw_user_id: &str) -> Result<Option<Startup>, DomainError> {
        self.startups_uc.for_user(raw_user_id)
    }

    pub fn startups(&self) -> Result<Vec<Startup>, DomainError> {
        self.startups_uc.list()
    }

    pub fn post_update(
        &self,
        caller: &Caller,
        raw_startup_id: &str,
        title: String,
        content: String,
    ) -> Result<Update, DomainError> {
        self.startups_uc.post_update(caller, raw_startup_id, title, content)
    }

    /// Updates for one startup, or every update when `raw_startup_id` is `None`.
    pub fn updates(&self, raw_startup_id: Option<&str>) -> Result<Vec<Update>, DomainError> {
        match raw_startup_id {
            Some(raw) => self.startups_uc.updates(raw),
            None => self.startups_uc.all_updates(),
        }
    }

    pub fn add_milestone(
        &self,
        caller: &Caller,
        raw_startup_id: &str,
        title: String,
        description: Option<String>,
        target_date: Option<NaiveDate>,
    ) -> Result<Milestone, DomainError> {
        self.startups_uc
            .add_milestone(caller, raw_startup_id, title, description, target_date)
    }

    pub fn milestones(&self, raw_startup_id: Option<&str>) -> Result<Vec<Milestone>, DomainError> {
        match raw_startup_id {
            Some(raw) => self.startups_uc.milestones(raw),
            None => self.startups_uc.all_milestones(),
        }
    }

    pub fn set_milestone_status(
        &self,
        caller: &Caller,
        raw_milestone_id: &str,
        completed: bool,
    ) -> Result<Milestone, DomainError> {
        self.startups_uc.set_milestone_status(caller, raw_milestone_id, completed)
    }

    // Funding
    pub fn record_investment(
        &self,
        caller: &Caller,
        raw_startup_id: &str,
        amount: Amount,
        transaction_ref: &str,
    ) -> Result<Investment, DomainError> {
        self.funding_uc
            .record_investment(caller, raw_startup_id, amount, transaction_ref)
    }

    pub fn reconcile(&self, raw_startup_id: &str) -> Result<Startup, DomainError> {
        self.funding_uc.reconcile(raw_startup_id)
    }

    pub fn progress(&self, raw_startup_id: &str) -> Result<Option<FundingProgress>, DomainError> {
        self.funding_uc.progress(raw_startup_id)
    }

    pub fn investment(&self, raw_id: &str) -> Result<Option<Investment>, DomainError> {
        self.funding_uc.get(raw_id)
    }

    pub fn investments(&self) -> Result<Vec<Investment>, DomainError> {
        self.funding_uc.list()
    }

    pub fn investments_for_startup(&self, raw_startup_id: &str) -> Result<Vec<Investment>, DomainError> {
        self.funding_uc.for_startup(raw_startup_id)
    }

    pub fn investments_by_investor(&self, raw_investor_id: &str) -> Result<Vec<Investment>, DomainError> {
        self.funding_uc.by_investor(raw_investor_id)
    }

    /// Pay the founder's wallet and record the investment once the transfer
    /// is confirmed.
    ///
    /// The founder must have confirmed their wallet address; an address that
    /// is only set can still be changed and is never paid.
    ///
    /// Nothing is written unless the receipt reports success. If recording
    /// fails after confirmation, retry `record_investment` with the returned
    /// transfer reference; it is idempotent.
    pub async fn invest_with_wallet(
        &self,
        caller: &Caller,
        raw_startup_id: &str,
        amount: &str,
    ) -> Result<Investment, InvestError> {
        caller.require_role(Role::Investor)?;
        let amount_value = Amount::parse_positive(amount).map_err(DomainError::InvalidInput)?;
        let startup = self
            .startup(raw_startup_id)?
            .ok_or_else(|| DomainError::NotFound(format!("startups {raw_startup_id}")))?;
        let founder = self
            .store
            .get_user(&startup.user_id)?
            .ok_or_else(|| DomainError::NotFound(format!("users {}", startup.user_id)))?;
        let to = match founder.wallet_address {
            Some(address) if founder.wallet_confirmed => address,
            Some(_) => {
                return Err(DomainError::InvalidInput(format!(
                    "startup {} wallet address is not confirmed",
                    startup.id
                ))
                .into())
            }
            None => {
                return Err(DomainError::InvalidInput(format!(
                    "startup {} has no wallet address",
                    startup.id
                ))
                .into())
            }
        };

        let watch = self.wallet.submit_transfer(to.as_str(), amount).await?;
        let receipt = watch.wait().await?;
        Ok(self.funding_uc.record_investment(
            caller,
            startup.id.as_str(),
            amount_value,
            &receipt.reference,
        )?)
    }
}
