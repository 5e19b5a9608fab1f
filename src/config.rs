//! Start-up configuration, read once from the environment.

use crate::application::wallet_transfer::{PollConfig, DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};
use crate::domain::error::DomainError;
use crate::domain::ports::ledger_store::BackendKind;
use crate::infrastructure::resolvers::id_resolver::PrefixPolicy;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "./fundledger.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub backend: BackendKind,
    /// Database file for the document backend. Ignored by the memory backend.
    pub db_path: String,
    pub prefix_policy: PrefixPolicy,
    pub wallet_rpc_url: Option<String>,
    pub poll: PollConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Document,
            db_path: DEFAULT_DB_PATH.to_string(),
            prefix_policy: PrefixPolicy::default(),
            wallet_rpc_url: None,
            poll: PollConfig::default(),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "document" => Ok(BackendKind::Document),
            _ => Err(format!("Unknown backend: {s}")),
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let invalid = |key: &str, e: String| DomainError::InvalidInput(format!("{key}: {e}"));

        let backend = match get("FUNDLEDGER_BACKEND") {
            Some(v) => v.parse().map_err(|e| invalid("FUNDLEDGER_BACKEND", e))?,
            None => BackendKind::Document,
        };
        let prefix_policy = match get("FUNDLEDGER_PREFIX_POLICY") {
            Some(v) => v.parse().map_err(|e| invalid("FUNDLEDGER_PREFIX_POLICY", e))?,
            None => PrefixPolicy::default(),
        };
        let interval = match get("FUNDLEDGER_POLL_INTERVAL_MS") {
            Some(v) => Duration::from_millis(
                v.parse()
                    .map_err(|e: std::num::ParseIntError| invalid("FUNDLEDGER_POLL_INTERVAL_MS", e.to_string()))?,
            ),
            None => DEFAULT_POLL_INTERVAL,
        };
        let max_attempts = match get("FUNDLEDGER_POLL_ATTEMPTS") {
            Some(v) => v
                .parse()
                .map_err(|e: std::num::ParseIntError| invalid("FUNDLEDGER_POLL_ATTEMPTS", e.to_string()))?,
            None => DEFAULT_POLL_ATTEMPTS,
        };

        Ok(Self {
            backend,
            db_path: get("FUNDLEDGER_DB").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            prefix_policy,
            wallet_rpc_url: get("FUNDLEDGER_WALLET_RPC_URL"),
            poll: PollConfig {
                interval,
                max_attempts,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<LedgerConfig, DomainError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LedgerConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[]).unwrap();
        assert_eq!(c, LedgerConfig::default());
        assert_eq!(c.backend, BackendKind::Document);
        assert_eq!(c.prefix_policy, PrefixPolicy::RejectAmbiguous);
        assert_eq!(c.poll.max_attempts, 40);
    }

    #[test]
    fn test_overrides() {
        let c = config(&[
            ("FUNDLEDGER_BACKEND", "Memory"),
            ("FUNDLEDGER_PREFIX_POLICY", "first"),
            ("FUNDLEDGER_POLL_INTERVAL_MS", "10"),
            ("FUNDLEDGER_POLL_ATTEMPTS", "3"),
            ("FUNDLEDGER_WALLET_RPC_URL", "http://localhost:8545"),
            ("FUNDLEDGER_DB", " "),
        ])
        .unwrap();
        assert_eq!(c.backend, BackendKind::Memory);
        assert_eq!(c.prefix_policy, PrefixPolicy::FirstMatch);
        assert_eq!(c.poll.interval, Duration::from_millis(10));
        assert_eq!(c.poll.max_attempts, 3);
        assert_eq!(c.wallet_rpc_url.as_deref(), Some("http://localhost:8545"));
        assert_eq!(c.db_path, DEFAULT_DB_PATH);
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(matches!(
            config(&[("FUNDLEDGER_BACKEND", "mongo")]),
            Err(DomainError::InvalidInput(ref m)) if m.contains("FUNDLEDGER_BACKEND")
        ));
        assert!(config(&[("FUNDLEDGER_POLL_ATTEMPTS", "-1")]).is_err());
    }
}
