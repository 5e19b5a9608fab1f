use crate::domain::entities::investment::{Investment, NewInvestment};
use crate::domain::entities::milestone::{Milestone, NewMilestone};
use crate::domain::entities::startup::{NewStartup, Startup};
use crate::domain::entities::update::{NewUpdate, Update};
use crate::domain::entities::user::{NewUser, User};
use crate::domain::error::DomainError;
use crate::domain::values::amount::Amount;
use crate::domain::values::entity_id::{Collection, EntityId};
use crate::domain::values::wallet_address::WalletAddress;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    Document,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Document => write!(f, "document"),
        }
    }
}

/// Rows removed by a cascading user delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub users: usize,
    pub startups: usize,
    pub investments: usize,
    pub updates: usize,
    pub milestones: usize,
}

/// Persistence port for the five ledger entities.
///
/// Both backends implement exactly this surface and must be
/// indistinguishable to callers apart from the shape of the ids they mint.
/// Reads that find nothing return `None` or an empty list; mutations against
/// a missing key fail with [`DomainError::NotFound`].
pub trait LedgerStore: Send + Sync {
    fn backend(&self) -> BackendKind;

    /// Turn caller-supplied text into an id this backend understands.
    fn resolve_id(&self, collection: Collection, raw: &str) -> Result<EntityId, DomainError>;

    // Users
    fn create_user(&self, user: NewUser) -> Result<User, DomainError>;
    fn get_user(&self, id: &EntityId) -> Result<Option<User>, DomainError>;
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    fn list_users(&self) -> Result<Vec<User>, DomainError>;
    fn update_user_wallet_address(
        &self,
        id: &EntityId,
        address: &WalletAddress,
    ) -> Result<User, DomainError>;
    fn confirm_user_wallet_address(
        &self,
        id: &EntityId,
        address: &WalletAddress,
    ) -> Result<User, DomainError>;
    /// Remove the user, their startup with its updates, milestones and
    /// received investments, and every investment they made. All or nothing.
    fn delete_user(&self, id: &EntityId) -> Result<DeleteSummary, DomainError>;

    // Startups
    fn create_startup(&self, startup: NewStartup) -> Result<Startup, DomainError>;
    fn get_startup(&self, id: &EntityId) -> Result<Option<Startup>, DomainError>;
    fn get_startup_by_user(&self, user_id: &EntityId) -> Result<Option<Startup>, DomainError>;
    fn list_startups(&self) -> Result<Vec<Startup>, DomainError>;
    /// Atomically add `delta` to the running funding total.
    fn update_startup_funding(&self, id: &EntityId, delta: Amount) -> Result<Startup, DomainError>;
    /// Recompute the running total as the sum of the startup's investments.
    /// Returns the startup after the write and the total it held before.
    fn reconcile_startup_funding(&self, id: &EntityId) -> Result<(Startup, Amount), DomainError>;

    // Investments
    fn create_investment(&self, investment: NewInvestment) -> Result<Investment, DomainError>;
    /// Insert the investment and add its amount to the startup's total as
    /// one unit: either both are visible or neither is.
    fn record_investment(
        &self,
        investment: NewInvestment,
    ) -> Result<(Investment, Startup), DomainError>;
    fn get_investment(&self, id: &EntityId) -> Result<Option<Investment>, DomainError>;
    fn find_investment_by_transaction(
        &self,
        transaction_ref: &str,
    ) -> Result<Option<Investment>, DomainError>;
    fn list_investments(&self) -> Result<Vec<Investment>, DomainError>;
    fn list_investments_by_startup(
        &self,
        startup_id: &EntityId,
    ) -> Result<Vec<Investment>, DomainError>;
    fn list_investments_by_investor(
        &self,
        investor_id: &EntityId,
    ) -> Result<Vec<Investment>, DomainError>;

    // Updates
    fn create_update(&self, update: NewUpdate) -> Result<Update, DomainError>;
    fn get_update(&self, id: &EntityId) -> Result<Option<Update>, DomainError>;
    fn list_updates(&self) -> Result<Vec<Update>, DomainError>;
    fn list_updates_by_startup(&self, startup_id: &EntityId) -> Result<Vec<Update>, DomainError>;

    // Milestones
    fn create_milestone(&self, milestone: NewMilestone) -> Result<Milestone, DomainError>;
    fn get_milestone(&self, id: &EntityId) -> Result<Option<Milestone>, DomainError>;
    fn list_milestones(&self) -> Result<Vec<Milestone>, DomainError>;
    fn list_milestones_by_startup(
        &self,
        startup_id: &EntityId,
    ) -> Result<Vec<Milestone>, DomainError>;
    fn update_milestone_status(
        &self,
        id: &EntityId,
        completed: bool,
    ) -> Result<Milestone, DomainError>;
}
