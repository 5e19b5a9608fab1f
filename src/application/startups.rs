use crate::application::access::Caller;
use crate::application::lookup;
use crate::domain::entities::milestone::{Milestone, NewMilestone};
use crate::domain::entities::startup::{NewStartup, Startup, StartupProfile};
use crate::domain::entities::update::{NewUpdate, Update};
use crate::domain::error::DomainError;
use crate::domain::ports::ledger_store::LedgerStore;
use crate::domain::values::entity_id::Collection;
use crate::domain::values::role::Role;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

/// Startup profiles and what founders publish about them.
pub struct StartupUseCase {
    store: Arc<dyn LedgerStore>,
}

impl StartupUseCase {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, caller: &Caller, profile: StartupProfile) -> Result<Startup, DomainError> {
        caller.require_role(Role::Startup)?;
        if profile.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("Startup name is required".into()));
        }
        if profile.funding_goal.is_zero() {
            return Err(DomainError::InvalidInput(
                "Funding goal must be greater than zero".into(),
            ));
        }
        let startup = self.store.create_startup(NewStartup {
            user_id: caller.id.clone(),
            profile,
        })?;
        info!(id = %startup.id, owner = %startup.user_id, goal = %startup.funding_goal, "startup created");
        Ok(startup)
    }

    pub fn get(&self, raw_id: &str) -> Result<Option<Startup>, DomainError> {
        match lookup(self.store.as_ref(), Collection::Startups, raw_id)? {
            Some(id) => self.store.get_startup(&id),
            None => Ok(None),
        }
    }

    pub fn for_user(&self, raw_user_id: &str) -> Result<Option<Startup>, DomainError> {
        match lookup(self.store.as_ref(), Collection::Users, raw_user_id)? {
            Some(id) => self.store.get_startup_by_user(&id),
            None => Ok(None),
        }
    }

    pub fn list(&self) -> Result<Vec<Startup>, DomainError> {
        self.store.list_startups()
    }

    /// Load a startup for a mutation and check the caller founded it.
    fn owned(&self, caller: &Caller, raw_id: &str) -> Result<Startup, DomainError> {
        let id = self.store.resolve_id(Collection::Startups, raw_id)?;
        let startup = self
            .store
            .get_startup(&id)?
            .ok_or_else(|| DomainError::NotFound(format!("startups {id}")))?;
        caller.require_founder_of(&startup)?;
        Ok(startup)
    }

    pub fn post_update(
        &self,
        caller: &Caller,
        raw_startup_id: &str,
        title: String,
        content: String,
    ) -> Result<Update, DomainError> {
        let startup = self.owned(caller, raw_startup_id)?;
        if title.trim().is_empty() {
            return Err(DomainError::InvalidInput("Update title is required".into()));
        }
        self.store.create_update(NewUpdate {
            startup_id: startup.id,
            title,
            content,
        })
    }

    pub fn updates(&self, raw_startup_id: &str) -> Result<Vec<Update>, DomainError> {
        match lookup(self.store.as_ref(), Collection::Startups, raw_startup_id)? {
            Some(id) => self.store.list_updates_by_startup(&id),
            None => Ok(vec![]),
        }
    }

    pub fn all_updates(&self) -> Result<Vec<Update>, DomainError> {
        self.store.list_updates()
    }

    pub fn add_milestone(
        &self,
        caller: &Caller,
        raw_startup_id: &str,
        title: String,
        description: Option<String>,
        target_date: Option<NaiveDate>,
    ) -> Result<Milestone, DomainError> {
        let startup = self.owned(caller, raw_startup_id)?;
        if title.trim().is_empty() {
            return Err(DomainError::InvalidInput("Milestone title is required".into()));
        }
        self.store.create_milestone(NewMilestone {
            startup_id: startup.id,
            title,
            description,
            target_date,
        })
    }

    pub fn milestones(&self, raw_startup_id: &str) -> Result<Vec<Milestone>, DomainError> {
        match lookup(self.store.as_ref(), Collection::Startups, raw_startup_id)? {
            Some(id) => self.store.list_milestones_by_startup(&id),
            None => Ok(vec![]),
        }
    }

    pub fn all_milestones(&self) -> Result<Vec<Milestone>, DomainError> {
        self.store.list_milestones()
    }

    pub fn set_milestone_status(
        &self,
        caller: &Caller,
        raw_milestone_id: &str,
        completed: bool,
    ) -> Result<Milestone, DomainError> {
        let id = self.store.resolve_id(Collection::Milestones, raw_milestone_id)?;
        let milestone = self
            .store
            .get_milestone(&id)?
            .ok_or_else(|| DomainError::NotFound(format!("milestones {id}")))?;
        self.owned(caller, milestone.startup_id.as_str())?;
        self.store.update_milestone_status(&id, completed)
    }
}
