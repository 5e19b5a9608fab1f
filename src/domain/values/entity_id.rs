use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque entity identifier.
///
/// The in-process backend hands out decimal counters ("7"), the document
/// backend 24-character hex object ids. Callers treat both as opaque strings;
/// only the store that minted an id knows how to interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(raw: impl Into<String>) -> Self {
        EntityId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        EntityId(n.to_string())
    }
}

/// The five entity collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Startups,
    Investments,
    Updates,
    Milestones,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Startups => "startups",
            Collection::Investments => "investments",
            Collection::Updates => "updates",
            Collection::Milestones => "milestones",
        }
    }

    pub fn all() -> [Collection; 5] {
        [
            Collection::Users,
            Collection::Startups,
            Collection::Investments,
            Collection::Updates,
            Collection::Milestones,
        ]
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim_end_matches('s') {
            "user" => Ok(Collection::Users),
            "startup" => Ok(Collection::Startups),
            "investment" => Ok(Collection::Investments),
            "update" => Ok(Collection::Updates),
            "milestone" => Ok(Collection::Milestones),
            _ => Err(format!("Unknown collection: {s}")),
        }
    }
}
