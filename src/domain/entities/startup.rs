use crate::domain::values::amount::Amount;
use crate::domain::values::entity_id::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Startup {
    pub id: EntityId,
    pub user_id: EntityId,
    pub name: String,
    pub description: String,
    pub industry: String,
    pub location: String,
    pub website: Option<String>,
    pub funding_goal: Amount,
    pub current_funding: Amount,
    pub logo: Option<String>,
    pub pitch_deck: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Profile fields a founder supplies. Funding totals and the active flag are
/// always set by the store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartupProfile {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub location: String,
    pub website: Option<String>,
    pub funding_goal: Amount,
    pub logo: Option<String>,
    pub pitch_deck: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewStartup {
    pub user_id: EntityId,
    pub profile: StartupProfile,
}

impl NewStartup {
    pub fn into_startup(self, id: EntityId) -> Startup {
        let p = self.profile;
        Startup {
            id,
            user_id: self.user_id,
            name: p.name,
            description: p.description,
            industry: p.industry,
            location: p.location,
            website: p.website,
            funding_goal: p.funding_goal,
            current_funding: Amount::ZERO,
            logo: p.logo,
            pitch_deck: p.pitch_deck,
            active: true,
            created_at: Utc::now(),
        }
    }
}
