use crate::domain::values::entity_id::EntityId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub id: EntityId,
    pub startup_id: EntityId,
    pub title: String,
    pub description: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Milestone {
    /// Soonest target date first; undated milestones last; ties oldest first.
    pub fn schedule_order(a: &Milestone, b: &Milestone) -> Ordering {
        match (a.target_date, b.target_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| a.created_at.cmp(&b.created_at))
    }
}

#[derive(Debug, Clone)]
pub struct NewMilestone {
    pub startup_id: EntityId,
    pub title: String,
    pub description: Option<String>,
    pub target_date: Option<NaiveDate>,
}

impl NewMilestone {
    pub fn into_milestone(self, id: EntityId) -> Milestone {
        Milestone {
            id,
            startup_id: self.startup_id,
            title: self.title,
            description: self.description,
            target_date: self.target_date,
            completed: false,
            created_at: Utc::now(),
        }
    }
}
