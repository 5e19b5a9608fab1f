mod common;

use common::{addr, investor, ledgers, setup};
use fundledger::application::access::Caller;
use fundledger::domain::error::{ConflictReason, DomainError};
use fundledger::domain::ports::ledger_store::BackendKind;
use fundledger::domain::values::entity_id::EntityId;
use fundledger::domain::values::role::Role;

#[test]
fn test_register_and_lookup() {
    for ledger in ledgers() {
        let user = ledger
            .register_user("  alice ", "hash", "Alice@Example.com", None, Role::Investor)
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(!user.wallet_confirmed);
        assert!(user.wallet_address.is_none());

        let by_id = ledger.user(user.id.as_str()).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert!(ledger.user_by_username("alice").unwrap().is_some());
        assert!(ledger.user_by_email("ALICE@example.com").unwrap().is_some());
        assert!(ledger.user_by_username("bob").unwrap().is_none());
        assert_eq!(ledger.users().unwrap().len(), 1);
    }
}

#[test]
fn test_uniqueness_conflicts() {
    for ledger in ledgers() {
        ledger
            .register_user("alice", "h", "alice@example.com", Some(&addr(0xab)), Role::Investor)
            .unwrap();

        let err = ledger
            .register_user("alice", "h", "other@example.com", None, Role::Investor)
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ConflictReason::Username)));

        let err = ledger
            .register_user("bob", "h", "ALICE@example.com", None, Role::Investor)
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ConflictReason::Email)));

        let upper = addr(0xab).to_uppercase().replacen("0X", "0x", 1);
        let err = ledger
            .register_user("bob", "h", "bob@example.com", Some(&upper), Role::Investor)
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ConflictReason::Wallet)));
    }
}

#[test]
fn test_conflict_reason_checks_username_before_email() {
    let mut reasons = Vec::new();
    for ledger in ledgers() {
        ledger
            .register_user("a", "h", "x@example.com", Some(&addr(1)), Role::Investor)
            .unwrap();
        ledger
            .register_user("b", "h", "y@example.com", Some(&addr(2)), Role::Investor)
            .unwrap();

        // Username clashes with the second user, email with the first.
        let err = ledger
            .register_user("b", "h", "x@example.com", None, Role::Investor)
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ConflictReason::Username)));

        // Email clashes with the second user, wallet with the first.
        let err = ledger
            .register_user("c", "h", "y@example.com", Some(&addr(1)), Role::Investor)
            .unwrap_err();
        let DomainError::Conflict(reason) = err else {
            panic!("expected a conflict, got {err:?}");
        };
        reasons.push(reason);
    }
    assert_eq!(reasons, vec![ConflictReason::Email, ConflictReason::Email]);
}

#[test]
fn test_register_validates_input() {
    let ledger = setup();
    assert!(matches!(
        ledger.register_user(" ", "h", "a@example.com", None, Role::Investor),
        Err(DomainError::InvalidInput(_))
    ));
    assert!(matches!(
        ledger.register_user("a", "h", "not-an-email", None, Role::Investor),
        Err(DomainError::InvalidInput(_))
    ));
    assert!(matches!(
        ledger.register_user("a", "h", "a@example.com", Some("0x123"), Role::Investor),
        Err(DomainError::InvalidInput(_))
    ));
}

#[test]
fn test_wallet_confirmation_latch() {
    for ledger in ledgers() {
        let (user, caller) = investor(&ledger, "alice");
        let id = user.id.as_str();

        ledger.set_wallet(&caller, id, &addr(7)).unwrap();
        ledger.set_wallet(&caller, id, &addr(8)).unwrap();

        // Only the most recently stored address can be confirmed.
        let err = ledger.confirm_wallet(&caller, id, &addr(7)).unwrap_err();
        assert!(matches!(err, DomainError::Mismatch(_)));

        let confirmed = ledger.confirm_wallet(&caller, id, &addr(8)).unwrap();
        assert!(confirmed.wallet_confirmed);
        assert_eq!(confirmed.wallet_address.unwrap().as_str(), addr(8));

        let err = ledger.set_wallet(&caller, id, &addr(9)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ConflictReason::WalletConfirmed)));
        let err = ledger.confirm_wallet(&caller, id, &addr(8)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ConflictReason::WalletConfirmed)));

        let stored = ledger.user(id).unwrap().unwrap();
        assert!(stored.wallet_confirmed);
        assert_eq!(stored.wallet_address.unwrap().as_str(), addr(8));
    }
}

#[test]
fn test_confirm_without_stored_wallet_is_mismatch() {
    for ledger in ledgers() {
        let (user, caller) = investor(&ledger, "alice");
        let err = ledger
            .confirm_wallet(&caller, user.id.as_str(), &addr(1))
            .unwrap_err();
        assert!(matches!(err, DomainError::Mismatch(_)));
    }
}

#[test]
fn test_wallet_taken_by_another_user() {
    for ledger in ledgers() {
        let (alice, alice_c) = investor(&ledger, "alice");
        let (bob, bob_c) = investor(&ledger, "bob");
        ledger.set_wallet(&alice_c, alice.id.as_str(), &addr(3)).unwrap();

        let err = ledger.set_wallet(&bob_c, bob.id.as_str(), &addr(3)).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ConflictReason::Wallet)));

        // Re-setting your own address is not a conflict.
        ledger.set_wallet(&alice_c, alice.id.as_str(), &addr(3)).unwrap();
    }
}

#[test]
fn test_wallet_changes_require_self() {
    for ledger in ledgers() {
        let (alice, _) = investor(&ledger, "alice");
        let (_, bob_c) = investor(&ledger, "bob");
        let err = ledger.set_wallet(&bob_c, alice.id.as_str(), &addr(1)).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        let err = ledger.delete_user(&bob_c, alice.id.as_str()).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}

#[test]
fn test_mutating_missing_user_is_not_found() {
    for ledger in ledgers() {
        let (alice, _) = investor(&ledger, "alice");
        // A caller whose row is gone, acting on itself.
        let ghost_id = match ledger.backend() {
            BackendKind::Memory => "999".to_string(),
            BackendKind::Document => "f".repeat(24),
        };
        assert!(ledger.user(&ghost_id).unwrap().is_none());
        let ghost = Caller::new(EntityId::new(ghost_id.clone()), Role::Investor);
        let err = ledger.set_wallet(&ghost, &ghost_id, &addr(1)).unwrap_err();
        assert!(err.is_not_found());
        assert!(ledger.caller_for(&ghost_id).unwrap_err().is_not_found());
        assert_eq!(ledger.caller_for(alice.id.as_str()).unwrap().role, Role::Investor);
    }
}
