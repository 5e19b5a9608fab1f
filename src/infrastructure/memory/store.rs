use crate::domain::entities::investment::{Investment, NewInvestment};
use crate::domain::entities::milestone::{Milestone, NewMilestone};
use crate::domain::entities::startup::{NewStartup, Startup};
use crate::domain::entities::update::{NewUpdate, Update};
use crate::domain::entities::user::{NewUser, User};
use crate::domain::error::{ConflictReason, DomainError};
use crate::domain::ports::ledger_store::{BackendKind, DeleteSummary, LedgerStore};
use crate::domain::values::amount::Amount;
use crate::domain::values::entity_id::{Collection, EntityId};
use crate::domain::values::wallet_address::WalletAddress;
use crate::infrastructure::resolvers::id_resolver::parse_counter_id;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// One entity table: rows keyed by a monotonic counter. The counter lives
/// under the same lock as the rows, so allocation and insertion are a single
/// critical section.
#[derive(Debug)]
struct Table<T> {
    next_id: u64,
    rows: BTreeMap<u64, T>,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            next_id: 0,
            rows: BTreeMap::new(),
        }
    }

    fn insert_with(&mut self, build: impl FnOnce(EntityId) -> T) -> T {
        self.next_id += 1;
        let key = self.next_id;
        let row = build(EntityId::from(key));
        self.rows.insert(key, row.clone());
        row
    }

    fn get(&self, id: &EntityId) -> Option<&T> {
        key_of(id).and_then(|k| self.rows.get(&k))
    }

    fn get_mut(&mut self, id: &EntityId) -> Option<&mut T> {
        key_of(id).and_then(move |k| self.rows.get_mut(&k))
    }

    fn contains(&self, id: &EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Remove every row matching `pred`, returning how many went.
    fn remove_where(&mut self, pred: impl Fn(&T) -> bool) -> usize {
        let before = self.rows.len();
        self.rows.retain(|_, row| !pred(row));
        before - self.rows.len()
    }

    /// Rows newest-first by `created`, newest insertion first on ties.
    fn newest_first(
        &self,
        filter: impl Fn(&T) -> bool,
        created: impl Fn(&T) -> DateTime<Utc>,
    ) -> Vec<T> {
        let mut out: Vec<T> = self.rows.values().rev().filter(|r| filter(r)).cloned().collect();
        out.sort_by(|a, b| created(b).cmp(&created(a)));
        out
    }
}

/// Ids minted elsewhere never parse, so they read as missing rather than
/// failing.
fn key_of(id: &EntityId) -> Option<u64> {
    id.as_str().parse().ok()
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, DomainError> {
    lock.read().map_err(|e| DomainError::Database(e.to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, DomainError> {
    lock.write().map_err(|e| DomainError::Database(e.to_string()))
}

fn not_found(collection: Collection, id: &EntityId) -> DomainError {
    DomainError::NotFound(format!("{} {id}", collection))
}

fn check_investment(
    users: &Table<User>,
    startups: &Table<Startup>,
    investments: &Table<Investment>,
    investment: &NewInvestment,
) -> Result<(), DomainError> {
    if investment.amount.is_zero() {
        return Err(DomainError::InvalidInput(
            "Investment amount must be greater than zero".into(),
        ));
    }
    if !users.contains(&investment.investor_id) {
        return Err(not_found(Collection::Users, &investment.investor_id));
    }
    if !startups.contains(&investment.startup_id) {
        return Err(not_found(Collection::Startups, &investment.startup_id));
    }
    if investments
        .rows
        .values()
        .any(|i| i.transaction_ref == investment.transaction_ref)
    {
        return Err(DomainError::Conflict(ConflictReason::TransactionRef));
    }
    Ok(())
}

/// Process-local backend. Ids are decimal counters, one sequence per entity.
///
/// Locks are always acquired in the order users, startups, investments,
/// updates, milestones.
pub struct MemoryLedgerStore {
    users: RwLock<Table<User>>,
    startups: RwLock<Table<Startup>>,
    investments: RwLock<Table<Investment>>,
    updates: RwLock<Table<Update>>,
    milestones: RwLock<Table<Milestone>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(Table::new()),
            startups: RwLock::new(Table::new()),
            investments: RwLock::new(Table::new()),
            updates: RwLock::new(Table::new()),
            milestones: RwLock::new(Table::new()),
        }
    }
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn backend(&self) -> BackendKind {
        BackendKind::Memory
    }

    fn resolve_id(&self, collection: Collection, raw: &str) -> Result<EntityId, DomainError> {
        let key = parse_counter_id(collection, raw)?;
        let found = match collection {
            Collection::Users => read(&self.users)?.rows.contains_key(&key),
            Collection::Startups => read(&self.startups)?.rows.contains_key(&key),
            Collection::Investments => read(&self.investments)?.rows.contains_key(&key),
            Collection::Updates => read(&self.updates)?.rows.contains_key(&key),
            Collection::Milestones => read(&self.milestones)?.rows.contains_key(&key),
        };
        if !found {
            return Err(DomainError::NotFound(format!("{collection} {key}")));
        }
        Ok(EntityId::from(key))
    }

    fn create_user(&self, user: NewUser) -> Result<User, DomainError> {
        let mut users = write(&self.users)?;
        // Field by field, so the reported reason does not depend on row order.
        if users.rows.values().any(|u| u.username == user.username) {
            return Err(DomainError::Conflict(ConflictReason::Username));
        }
        if users.rows.values().any(|u| u.email == user.email) {
            return Err(DomainError::Conflict(ConflictReason::Email));
        }
        if user.wallet_address.is_some()
            && users
                .rows
                .values()
                .any(|u| u.wallet_address == user.wallet_address)
        {
            return Err(DomainError::Conflict(ConflictReason::Wallet));
        }
        let created = users.insert_with(|id| user.into_user(id));
        debug!(id = %created.id, username = %created.username, "user created");
        Ok(created)
    }

    fn get_user(&self, id: &EntityId) -> Result<Option<User>, DomainError> {
        Ok(read(&self.users)?.get(id).cloned())
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        Ok(read(&self.users)?
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let email = email.trim().to_lowercase();
        Ok(read(&self.users)?
            .rows
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    fn list_users(&self) -> Result<Vec<User>, DomainError> {
        Ok(read(&self.users)?.rows.values().cloned().collect())
    }

    fn update_user_wallet_address(
        &self,
        id: &EntityId,
        address: &WalletAddress,
    ) -> Result<User, DomainError> {
        let mut users = write(&self.users)?;
        let user = users.get(id).ok_or_else(|| not_found(Collection::Users, id))?;
        if user.wallet_confirmed {
            return Err(DomainError::Conflict(ConflictReason::WalletConfirmed));
        }
        let taken = users
            .rows
            .values()
            .any(|u| &u.id != id && u.wallet_address.as_ref() == Some(address));
        if taken {
            return Err(DomainError::Conflict(ConflictReason::Wallet));
        }
        let user = users
            .get_mut(id)
            .ok_or_else(|| not_found(Collection::Users, id))?;
        user.wallet_address = Some(address.clone());
        Ok(user.clone())
    }

    fn confirm_user_wallet_address(
        &self,
        id: &EntityId,
        address: &WalletAddress,
    ) -> Result<User, DomainError> {
        let mut users = write(&self.users)?;
        let user = users
            .get_mut(id)
            .ok_or_else(|| not_found(Collection::Users, id))?;
        if user.wallet_address.as_ref() != Some(address) {
            return Err(DomainError::Mismatch(format!(
                "{address} is not the wallet on record for user {id}"
            )));
        }
        if user.wallet_confirmed {
            return Err(DomainError::Conflict(ConflictReason::WalletConfirmed));
        }
        user.wallet_confirmed = true;
        Ok(user.clone())
    }

    fn delete_user(&self, id: &EntityId) -> Result<DeleteSummary, DomainError> {
        let mut users = write(&self.users)?;
        let mut startups = write(&self.startups)?;
        let mut investments = write(&self.investments)?;
        let mut updates = write(&self.updates)?;
        let mut milestones = write(&self.milestones)?;

        if !users.contains(id) {
            return Err(not_found(Collection::Users, id));
        }

        let owned: HashSet<EntityId> = startups
            .rows
            .values()
            .filter(|s| &s.user_id == id)
            .map(|s| s.id.clone())
            .collect();

        // Stakes in startups that survive come off their running totals.
        for inv in investments.rows.values() {
            if &inv.investor_id != id || owned.contains(&inv.startup_id) {
                continue;
            }
            if let Some(startup) = startups.get_mut(&inv.startup_id) {
                startup.current_funding = startup.current_funding.saturating_sub(inv.amount);
            }
        }

        let summary = DeleteSummary {
            milestones: milestones.remove_where(|m| owned.contains(&m.startup_id)),
            updates: updates.remove_where(|u| owned.contains(&u.startup_id)),
            investments: investments
                .remove_where(|i| &i.investor_id == id || owned.contains(&i.startup_id)),
            startups: startups.remove_where(|s| &s.user_id == id),
            users: users.remove_where(|u| &u.id == id),
        };
        info!(user = %id, ?summary, "user deleted");
        Ok(summary)
    }

    fn create_startup(&self, startup: NewStartup) -> Result<Startup, DomainError> {
        let users = read(&self.users)?;
        let mut startups = write(&self.startups)?;
        if !users.contains(&startup.user_id) {
            return Err(not_found(Collection::Users, &startup.user_id));
        }
        if startups.rows.values().any(|s| s.user_id == startup.user_id) {
            return Err(DomainError::Conflict(ConflictReason::StartupOwner));
        }
        Ok(startups.insert_with(|id| startup.into_startup(id)))
    }

    fn get_startup(&self, id: &EntityId) -> Result<Option<Startup>, DomainError> {
        Ok(read(&self.startups)?.get(id).cloned())
    }

    fn get_startup_by_user(&self, user_id: &EntityId) -> Result<Option<Startup>, DomainError> {
        Ok(read(&self.startups)?
            .rows
            .values()
            .find(|s| &s.user_id == user_id)
            .cloned())
    }

    fn list_startups(&self) -> Result<Vec<Startup>, DomainError> {
        Ok(read(&self.startups)?.newest_first(|_| true, |s| s.created_at))
    }

    fn update_startup_funding(&self, id: &EntityId, delta: Amount) -> Result<Startup, DomainError> {
        let mut startups = write(&self.startups)?;
        let startup = startups
            .get_mut(id)
            .ok_or_else(|| not_found(Collection::Startups, id))?;
        startup.current_funding = startup
            .current_funding
            .checked_add(delta)
            .ok_or_else(|| DomainError::InvalidInput("Funding total overflow".into()))?;
        Ok(startup.clone())
    }

    fn reconcile_startup_funding(&self, id: &EntityId) -> Result<(Startup, Amount), DomainError> {
        let mut startups = write(&self.startups)?;
        let investments = read(&self.investments)?;
        let startup = startups
            .get_mut(id)
            .ok_or_else(|| not_found(Collection::Startups, id))?;
        let amounts: Vec<Amount> = investments
            .rows
            .values()
            .filter(|i| &i.startup_id == id)
            .map(|i| i.amount)
            .collect();
        let total = Amount::sum(&amounts)
            .ok_or_else(|| DomainError::InvalidInput("Funding total overflow".into()))?;
        let previous = std::mem::replace(&mut startup.current_funding, total);
        Ok((startup.clone(), previous))
    }

    fn create_investment(&self, investment: NewInvestment) -> Result<Investment, DomainError> {
        let users = read(&self.users)?;
        let startups = read(&self.startups)?;
        let mut investments = write(&self.investments)?;
        check_investment(&users, &startups, &investments, &investment)?;
        Ok(investments.insert_with(|id| investment.into_investment(id)))
    }

    fn record_investment(
        &self,
        investment: NewInvestment,
    ) -> Result<(Investment, Startup), DomainError> {
        let users = read(&self.users)?;
        let mut startups = write(&self.startups)?;
        let mut investments = write(&self.investments)?;
        check_investment(&users, &startups, &investments, &investment)?;

        let startup = startups
            .get_mut(&investment.startup_id)
            .ok_or_else(|| not_found(Collection::Startups, &investment.startup_id))?;
        let total = startup
            .current_funding
            .checked_add(investment.amount)
            .ok_or_else(|| DomainError::InvalidInput("Funding total overflow".into()))?;
        startup.current_funding = total;
        let startup = startup.clone();
        let created = investments.insert_with(|id| investment.into_investment(id));
        Ok((created, startup))
    }

    fn get_investment(&self, id: &EntityId) -> Result<Option<Investment>, DomainError> {
        Ok(read(&self.investments)?.get(id).cloned())
    }

    fn find_investment_by_transaction(
        &self,
        transaction_ref: &str,
    ) -> Result<Option<Investment>, DomainError> {
        Ok(read(&self.investments)?
            .rows
            .values()
            .find(|i| i.transaction_ref == transaction_ref)
            .cloned())
    }

    fn list_investments(&self) -> Result<Vec<Investment>, DomainError> {
        Ok(read(&self.investments)?.newest_first(|_| true, |i| i.created_at))
    }

    fn list_investments_by_startup(
        &self,
        startup_id: &EntityId,
    ) -> Result<Vec<Investment>, DomainError> {
        Ok(read(&self.investments)?.newest_first(|i| &i.startup_id == startup_id, |i| i.created_at))
    }

    fn list_investments_by_investor(
        &self,
        investor_id: &EntityId,
    ) -> Result<Vec<Investment>, DomainError> {
        Ok(read(&self.investments)?
            .newest_first(|i| &i.investor_id == investor_id, |i| i.created_at))
    }

    fn create_update(&self, update: NewUpdate) -> Result<Update, DomainError> {
        let startups = read(&self.startups)?;
        let mut updates = write(&self.updates)?;
        if !startups.contains(&update.startup_id) {
            return Err(not_found(Collection::Startups, &update.startup_id));
        }
        Ok(updates.insert_with(|id| update.into_update(id)))
    }

    fn get_update(&self, id: &EntityId) -> Result<Option<Update>, DomainError> {
        Ok(read(&self.updates)?.get(id).cloned())
    }

    fn list_updates(&self) -> Result<Vec<Update>, DomainError> {
        Ok(read(&self.updates)?.newest_first(|_| true, |u| u.created_at))
    }

    fn list_updates_by_startup(&self, startup_id: &EntityId) -> Result<Vec<Update>, DomainError> {
        Ok(read(&self.updates)?.newest_first(|u| &u.startup_id == startup_id, |u| u.created_at))
    }

    fn create_milestone(&self, milestone: NewMilestone) -> Result<Milestone, DomainError> {
        let startups = read(&self.startups)?;
        let mut milestones = write(&self.milestones)?;
        if !startups.contains(&milestone.startup_id) {
            return Err(not_found(Collection::Startups, &milestone.startup_id));
        }
        Ok(milestones.insert_with(|id| milestone.into_milestone(id)))
    }

    fn get_milestone(&self, id: &EntityId) -> Result<Option<Milestone>, DomainError> {
        Ok(read(&self.milestones)?.get(id).cloned())
    }

    fn list_milestones(&self) -> Result<Vec<Milestone>, DomainError> {
        let mut out: Vec<Milestone> = read(&self.milestones)?.rows.values().cloned().collect();
        out.sort_by(Milestone::schedule_order);
        Ok(out)
    }

    fn list_milestones_by_startup(
        &self,
        startup_id: &EntityId,
    ) -> Result<Vec<Milestone>, DomainError> {
        let mut out: Vec<Milestone> = read(&self.milestones)?
            .rows
            .values()
            .filter(|m| &m.startup_id == startup_id)
            .cloned()
            .collect();
        out.sort_by(Milestone::schedule_order);
        Ok(out)
    }

    fn update_milestone_status(
        &self,
        id: &EntityId,
        completed: bool,
    ) -> Result<Milestone, DomainError> {
        let mut milestones = write(&self.milestones)?;
        let milestone = milestones
            .get_mut(id)
            .ok_or_else(|| not_found(Collection::Milestones, id))?;
        milestone.completed = completed;
        Ok(milestone.clone())
    }
}
