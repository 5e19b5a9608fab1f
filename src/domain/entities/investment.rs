use crate::domain::values::amount::Amount;
use crate::domain::values::entity_id::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: EntityId,
    pub investor_id: EntityId,
    pub startup_id: EntityId,
    pub amount: Amount,
    /// Reference returned by the wallet provider for the underlying transfer.
    pub transaction_ref: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub investor_id: EntityId,
    pub startup_id: EntityId,
    pub amount: Amount,
    pub transaction_ref: String,
}

impl NewInvestment {
    pub fn into_investment(self, id: EntityId) -> Investment {
        Investment {
            id,
            investor_id: self.investor_id,
            startup_id: self.startup_id,
            amount: self.amount,
            transaction_ref: self.transaction_ref,
            created_at: Utc::now(),
        }
    }
}
