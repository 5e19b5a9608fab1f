//! Who may call which operation.
//!
//! Identity itself is established outside the ledger; operations receive a
//! [`Caller`] and check it against the rows they touch.

use crate::domain::entities::startup::Startup;
use crate::domain::entities::user::User;
use crate::domain::error::DomainError;
use crate::domain::values::entity_id::EntityId;
use crate::domain::values::role::Role;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    pub id: EntityId,
    pub role: Role,
}

impl Caller {
    pub fn new(id: EntityId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn require_self(&self, user_id: &EntityId) -> Result<(), DomainError> {
        if &self.id != user_id {
            return Err(DomainError::Forbidden(format!(
                "user {} may not act on user {user_id}",
                self.id
            )));
        }
        Ok(())
    }

    pub fn require_role(&self, role: Role) -> Result<(), DomainError> {
        if self.role != role {
            return Err(DomainError::Forbidden(format!(
                "operation requires the {role} role, caller is {}",
                self.role
            )));
        }
        Ok(())
    }

    pub fn require_founder_of(&self, startup: &Startup) -> Result<(), DomainError> {
        self.require_role(Role::Startup)?;
        if self.id != startup.user_id {
            return Err(DomainError::Forbidden(format!(
                "user {} does not own startup {}",
                self.id, startup.id
            )));
        }
        Ok(())
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Caller::new(user.id.clone(), user.role)
    }
}
