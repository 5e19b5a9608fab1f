use crate::domain::values::entity_id::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A progress post published by a startup to its investors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub id: EntityId,
    pub startup_id: EntityId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUpdate {
    pub startup_id: EntityId,
    pub title: String,
    pub content: String,
}

impl NewUpdate {
    pub fn into_update(self, id: EntityId) -> Update {
        Update {
            id,
            startup_id: self.startup_id,
            title: self.title,
            content: self.content,
            created_at: Utc::now(),
        }
    }
}
