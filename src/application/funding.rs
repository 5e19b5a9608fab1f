//! Funding aggregation.
//!
//! `Startup::current_funding` is maintained incrementally. The only public
//! way to add an investment is [`FundingAggregator::record_investment`],
//! which hands the insert and the increment to the store as one unit, so a
//! caller can never land one without the other. Retrying with the same
//! transaction reference is safe: the existing investment is returned and
//! the total is reconciled instead of incremented twice.
//!
//! [`FundingAggregator::reconcile`] recomputes the total from the recorded
//! investments and can be run at any time to repair drift.

use crate::application::access::Caller;
use crate::application::lookup;
use crate::domain::entities::investment::{Investment, NewInvestment};
use crate::domain::entities::startup::Startup;
use crate::domain::error::{ConflictReason, DomainError};
use crate::domain::ports::ledger_store::LedgerStore;
use crate::domain::values::amount::Amount;
use crate::domain::values::entity_id::{Collection, EntityId};
use crate::domain::values::role::Role;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct FundingProgress {
    pub startup_id: EntityId,
    pub funding_goal: Amount,
    pub current_funding: Amount,
    pub remaining: Amount,
    pub percent_funded: f64,
    pub investment_count: usize,
}

pub struct FundingAggregator {
    store: Arc<dyn LedgerStore>,
}

impl FundingAggregator {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Record an investment backed by the transfer `transaction_ref` and add
    /// it to the startup's running total.
    pub fn record_investment(
        &self,
        caller: &Caller,
        raw_startup_id: &str,
        amount: Amount,
        transaction_ref: &str,
    ) -> Result<Investment, DomainError> {
        caller.require_role(Role::Investor)?;
        let transaction_ref = transaction_ref.trim();
        if transaction_ref.is_empty() {
            return Err(DomainError::InvalidInput(
                "Transaction reference is required".into(),
            ));
        }
        if amount.is_zero() {
            return Err(DomainError::InvalidInput(
                "Investment amount must be greater than zero".into(),
            ));
        }
        let startup_id = self.store.resolve_id(Collection::Startups, raw_startup_id)?;

        if let Some(existing) = self.store.find_investment_by_transaction(transaction_ref)? {
            if existing.investor_id != caller.id
                || existing.startup_id != startup_id
                || existing.amount != amount
            {
                return Err(DomainError::Conflict(ConflictReason::TransactionRef));
            }
            info!(
                investment = %existing.id,
                transaction = transaction_ref,
                "investment already recorded, reconciling instead of re-applying"
            );
            self.reconcile_id(&existing.startup_id)?;
            return Ok(existing);
        }

        let (investment, startup) = self.store.record_investment(NewInvestment {
            investor_id: caller.id.clone(),
            startup_id,
            amount,
            transaction_ref: transaction_ref.to_string(),
        })?;
        info!(
            investment = %investment.id,
            startup = %startup.id,
            amount = %investment.amount,
            total = %startup.current_funding,
            "investment recorded"
        );
        Ok(investment)
    }

    pub fn reconcile(&self, raw_startup_id: &str) -> Result<Startup, DomainError> {
        let id = self.store.resolve_id(Collection::Startups, raw_startup_id)?;
        self.reconcile_id(&id)
    }

    fn reconcile_id(&self, id: &EntityId) -> Result<Startup, DomainError> {
        let (startup, previous) = self.store.reconcile_startup_funding(id)?;
        if previous != startup.current_funding {
            warn!(
                startup = %id,
                previous = %previous,
                recomputed = %startup.current_funding,
                "funding total drifted from recorded investments"
            );
        }
        Ok(startup)
    }

    pub fn progress(&self, raw_startup_id: &str) -> Result<Option<FundingProgress>, DomainError> {
        let Some(id) = lookup(self.store.as_ref(), Collection::Startups, raw_startup_id)? else {
            return Ok(None);
        };
        let Some(startup) = self.store.get_startup(&id)? else {
            return Ok(None);
        };
        let investment_count = self.store.list_investments_by_startup(&id)?.len();
        Ok(Some(FundingProgress {
            startup_id: startup.id,
            funding_goal: startup.funding_goal,
            current_funding: startup.current_funding,
            remaining: startup.funding_goal.saturating_sub(startup.current_funding),
            percent_funded: startup.current_funding.percent_of(startup.funding_goal),
            investment_count,
        }))
    }

    pub fn get(&self, raw_id: &str) -> Result<Option<Investment>, DomainError> {
        match lookup(self.store.as_ref(), Collection::Investments, raw_id)? {
            Some(id) => self.store.get_investment(&id),
            None => Ok(None),
        }
    }

    pub fn list(&self) -> Result<Vec<Investment>, DomainError> {
        self.store.list_investments()
    }

    pub fn for_startup(&self, raw_startup_id: &str) -> Result<Vec<Investment>, DomainError> {
        match lookup(self.store.as_ref(), Collection::Startups, raw_startup_id)? {
            Some(id) => self.store.list_investments_by_startup(&id),
            None => Ok(vec![]),
        }
    }

    pub fn by_investor(&self, raw_investor_id: &str) -> Result<Vec<Investment>, DomainError> {
        match lookup(self.store.as_ref(), Collection::Users, raw_investor_id)? {
            Some(id) => self.store.list_investments_by_investor(&id),
            None => Ok(vec![]),
        }
    }
}
