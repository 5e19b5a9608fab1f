mod common;

use common::{founder, investor, ledgers, memory_ledger};
use fundledger::application::wallet_transfer::{PollConfig, WalletTransferClient};
use fundledger::domain::error::DomainError;
use fundledger::domain::ports::ledger_store::{BackendKind, LedgerStore};
use fundledger::domain::values::entity_id::Collection;
use fundledger::infrastructure::document::DocumentLedgerStore;
use fundledger::infrastructure::resolvers::id_resolver::PrefixPolicy;
use fundledger::FundLedger;
use rusqlite::{params, Connection};
use std::sync::Arc;
use tempfile::TempDir;

const A: &str = "aaaaaaaaaaaaaaaaaaaaaaaa";
const B: &str = "aaaaaaaaaaaaaaaaaaaaaaab";

/// A document store whose users table holds the two colliding ids.
fn colliding_store(dir: &TempDir, policy: PrefixPolicy) -> DocumentLedgerStore {
    let path = dir.path().join("ledger.db");
    let path = path.to_str().unwrap();
    let store = DocumentLedgerStore::open(path, policy).unwrap();

    let raw = Connection::open(path).unwrap();
    for (n, id) in [B, A].iter().enumerate() {
        let doc = serde_json::json!({
            "id": id,
            "username": format!("user{n}"),
            "password": "h",
            "email": format!("user{n}@example.com"),
            "wallet_address": null,
            "wallet_confirmed": false,
            "role": "investor",
            "created_at": "2026-01-01T00:00:00Z",
        });
        raw.execute(
            "INSERT INTO users (id, created_us, doc) VALUES (?1, ?2, ?3)",
            params![id, 1_767_225_600_000_000i64, doc.to_string()],
        )
        .unwrap();
    }
    store
}

#[test]
fn test_ambiguous_prefix_is_rejected_by_default() {
    let dir = TempDir::new().unwrap();
    let store = colliding_store(&dir, PrefixPolicy::default());

    let err = store.resolve_id(Collection::Users, "aaaa").unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(ref m) if m.contains("2 matches")));

    // Full ids skip the scan; case is not significant.
    assert_eq!(
        store.resolve_id(Collection::Users, &B.to_uppercase()).unwrap().as_str(),
        B
    );
    assert!(matches!(
        store.resolve_id(Collection::Users, "AAAAAAAAAAAAAAAAAAAAAAA"),
        Err(DomainError::InvalidInput(_))
    ));
}

#[test]
fn test_first_match_policy_picks_smallest_id() {
    let dir = TempDir::new().unwrap();
    let store = colliding_store(&dir, PrefixPolicy::FirstMatch);

    // Inserted B first; the smallest id wins regardless of insertion order.
    assert_eq!(store.resolve_id(Collection::Users, "aaaa").unwrap().as_str(), A);
    let user = store
        .get_user(&store.resolve_id(Collection::Users, "aaaa").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(user.username, "user1");
}

#[test]
fn test_prefix_reads_through_the_ledger() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.db");
    let store = DocumentLedgerStore::open(path.to_str().unwrap(), PrefixPolicy::default()).unwrap();
    let ledger = FundLedger::with_store(
        Arc::new(store),
        WalletTransferClient::new(None, PollConfig::default()),
    );

    let (user, _, startup) = founder(&ledger, "acme", "5");
    let short = &startup.id.as_str()[..12];
    assert_eq!(ledger.startup(short).unwrap().unwrap().id, startup.id);
    assert_eq!(
        ledger.startup_for_user(&user.id.as_str()[..12]).unwrap().unwrap().id,
        startup.id
    );

    // Unknown prefixes are an empty read, malformed ones an error.
    assert!(ledger.startup("0000").unwrap().is_none());
    assert!(matches!(
        ledger.startup("not-hex"),
        Err(DomainError::InvalidInput(_))
    ));
}

#[test]
fn test_counter_ids() {
    let ledger = memory_ledger();
    let (alice, _) = investor(&ledger, "alice");
    assert_eq!(alice.id.as_str(), "1");
    let (bob, _) = investor(&ledger, "bob");
    assert_eq!(bob.id.as_str(), "2");

    assert_eq!(ledger.resolve_id(Collection::Users, " 2 ").unwrap(), bob.id);
    assert!(matches!(
        ledger.resolve_id(Collection::Users, "abc"),
        Err(DomainError::InvalidInput(_))
    ));
    assert!(ledger.user("42").unwrap().is_none());
    assert!(matches!(
        ledger.user("x1"),
        Err(DomainError::InvalidInput(_))
    ));
}

#[test]
fn test_ids_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.db");
    let path = path.to_str().unwrap();

    let id = {
        let store = DocumentLedgerStore::open(path, PrefixPolicy::default()).unwrap();
        let ledger = FundLedger::with_store(
            Arc::new(store),
            WalletTransferClient::new(None, PollConfig::default()),
        );
        investor(&ledger, "alice").0.id
    };

    let store = DocumentLedgerStore::open(path, PrefixPolicy::default()).unwrap();
    let user = store.get_user(&id).unwrap().unwrap();
    assert_eq!(user.username, "alice");
}

#[test]
fn test_full_ids_must_exist() {
    for ledger in ledgers() {
        let missing = match ledger.backend() {
            BackendKind::Memory => "999".to_string(),
            BackendKind::Document => "a".repeat(24),
        };
        for collection in Collection::all() {
            assert!(ledger.resolve_id(collection, &missing).unwrap_err().is_not_found());
        }

        let (alice, alice_c) = investor(&ledger, "alice");
        assert_eq!(
            ledger.resolve_id(Collection::Users, alice.id.as_str()).unwrap(),
            alice.id
        );
        // Ids are per collection.
        assert!(ledger
            .resolve_id(Collection::Startups, alice.id.as_str())
            .unwrap_err()
            .is_not_found());

        ledger.delete_user(&alice_c, alice.id.as_str()).unwrap();
        assert!(ledger
            .resolve_id(Collection::Users, alice.id.as_str())
            .unwrap_err()
            .is_not_found());
    }
}
