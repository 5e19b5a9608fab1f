//! Identifier resolution for both backends.
//!
//! Counter ids are plain decimal integers. Object ids are 24 lowercase hex
//! characters; upstream systems sometimes truncate them, so a shorter hex
//! string is accepted as a prefix and expanded by scanning the collection.
//! Prefix expansion is a compatibility shim, not an access check.

use crate::domain::error::DomainError;
use crate::domain::values::entity_id::{Collection, EntityId};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub const OBJECT_ID_LEN: usize = 24;

/// What to do when an id prefix matches more than one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixPolicy {
    /// Fail with `InvalidInput` naming the number of matches.
    #[default]
    RejectAmbiguous,
    /// Take the lexicographically smallest matching id.
    FirstMatch,
}

impl fmt::Display for PrefixPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixPolicy::RejectAmbiguous => write!(f, "reject"),
            PrefixPolicy::FirstMatch => write!(f, "first"),
        }
    }
}

impl FromStr for PrefixPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" | "reject_ambiguous" => Ok(PrefixPolicy::RejectAmbiguous),
            "first" | "first_match" => Ok(PrefixPolicy::FirstMatch),
            _ => Err(format!("Unknown prefix policy: {s}")),
        }
    }
}

/// Parse a counter id. Existence is checked by the backend.
pub fn parse_counter_id(collection: Collection, raw: &str) -> Result<u64, DomainError> {
    let s = raw.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DomainError::InvalidInput(format!(
            "Invalid {} id: {raw:?}",
            collection
        )));
    }
    s.parse()
        .map_err(|_| DomainError::InvalidInput(format!("Invalid {} id: {raw:?}", collection)))
}

/// Shape of a normalized object-id input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectIdInput {
    Full(String),
    Prefix(String),
}

pub fn classify_object_id(collection: Collection, raw: &str) -> Result<ObjectIdInput, DomainError> {
    let s = raw.trim().to_ascii_lowercase();
    if s.is_empty() || s.len() > OBJECT_ID_LEN || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DomainError::InvalidInput(format!(
            "Invalid {} id: {raw:?}",
            collection
        )));
    }
    if s.len() == OBJECT_ID_LEN {
        Ok(ObjectIdInput::Full(s))
    } else {
        Ok(ObjectIdInput::Prefix(s))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIdResolver {
    policy: PrefixPolicy,
}

impl ObjectIdResolver {
    pub fn new(policy: PrefixPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> PrefixPolicy {
        self.policy
    }

    /// Resolve `raw` against a collection.
    ///
    /// A full-length id is looked up directly with `exists`. A prefix is
    /// passed to `scan`, which must return every id in the collection
    /// starting with it. Nothing matching is `NotFound`.
    pub fn resolve<E, F>(
        &self,
        collection: Collection,
        raw: &str,
        exists: E,
        scan: F,
    ) -> Result<EntityId, DomainError>
    where
        E: FnOnce(&str) -> Result<bool, DomainError>,
        F: FnOnce(&str) -> Result<Vec<String>, DomainError>,
    {
        let prefix = match classify_object_id(collection, raw)? {
            ObjectIdInput::Full(id) => {
                if !exists(&id)? {
                    return Err(DomainError::NotFound(format!("{collection} {id}")));
                }
                return Ok(EntityId::new(id));
            }
            ObjectIdInput::Prefix(p) => p,
        };

        let mut matches: Vec<String> = scan(&prefix)?
            .into_iter()
            .filter(|id| id.starts_with(&prefix))
            .collect();
        matches.sort();
        matches.dedup();
        debug!(%collection, %prefix, matches = matches.len(), "expanding id prefix");

        match (matches.len(), self.policy) {
            (0, _) => Err(DomainError::NotFound(format!(
                "No {} id starts with {prefix}",
                collection
            ))),
            (1, _) | (_, PrefixPolicy::FirstMatch) => Ok(EntityId::new(matches.remove(0))),
            (n, PrefixPolicy::RejectAmbiguous) => Err(DomainError::InvalidInput(format!(
                "Ambiguous {} id prefix {prefix}: {n} matches",
                collection
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "aaaaaaaaaaaaaaaaaaaaaaaa";
    const B: &str = "aaaaaaaaaaaaaaaaaaaaaaab";

    fn scan_ab(_: &str) -> Result<Vec<String>, DomainError> {
        Ok(vec![B.to_string(), A.to_string()])
    }

    fn has_ab(id: &str) -> Result<bool, DomainError> {
        Ok(id == A || id == B)
    }

    #[test]
    fn test_counter_ids() {
        assert_eq!(parse_counter_id(Collection::Users, " 42 ").unwrap(), 42);
        assert!(matches!(
            parse_counter_id(Collection::Users, "abc"),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(parse_counter_id(Collection::Users, "-1").is_err());
        assert!(parse_counter_id(Collection::Users, "").is_err());
    }

    #[test]
    fn test_full_id_skips_scan() {
        let r = ObjectIdResolver::default();
        let id = r
            .resolve(Collection::Startups, &A.to_uppercase(), has_ab, |_| {
                panic!("full ids must not scan")
            })
            .unwrap();
        assert_eq!(id.as_str(), A);
    }

    #[test]
    fn test_missing_full_id_is_not_found() {
        let r = ObjectIdResolver::default();
        let err = r
            .resolve(Collection::Startups, &"c".repeat(24), has_ab, scan_ab)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_ambiguous_prefix_rejected_by_default() {
        let r = ObjectIdResolver::default();
        let err = r.resolve(Collection::Startups, "aaaa", has_ab, scan_ab).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(ref m) if m.contains("2 matches")));
    }

    #[test]
    fn test_first_match_is_deterministic() {
        let r = ObjectIdResolver::new(PrefixPolicy::FirstMatch);
        let id = r.resolve(Collection::Startups, "aaaa", has_ab, scan_ab).unwrap();
        assert_eq!(id.as_str(), A);
    }

    #[test]
    fn test_unique_prefix_resolves() {
        let r = ObjectIdResolver::default();
        let id = r
            .resolve(Collection::Startups, &A[..23], has_ab, |_| Ok(vec![A.to_string()]))
            .unwrap();
        assert_eq!(id.as_str(), A);
    }

    #[test]
    fn test_no_match_is_not_found() {
        let r = ObjectIdResolver::default();
        let err = r
            .resolve(Collection::Users, "beef", has_ab, |_| Ok(vec![A.to_string()]))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_non_hex_and_overlong_rejected() {
        let r = ObjectIdResolver::default();
        assert!(matches!(
            r.resolve(Collection::Users, "xyz", has_ab, scan_ab),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            r.resolve(Collection::Users, &format!("{A}0"), has_ab, scan_ab),
            Err(DomainError::InvalidInput(_))
        ));
    }
}
