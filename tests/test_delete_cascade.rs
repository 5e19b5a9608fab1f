mod common;

use common::{amount, founder, investor, ledgers};
use fundledger::domain::ports::ledger_store::DeleteSummary;

#[test]
fn test_deleting_founder_removes_startup_and_children() {
    for ledger in ledgers() {
        let (user, founder_c, startup) = founder(&ledger, "acme", "10");
        let (alice_user, alice) = investor(&ledger, "alice");
        let sid = startup.id.as_str();

        let update = ledger
            .post_update(&founder_c, sid, "Launch".into(), "We shipped".into())
            .unwrap();
        let milestone = ledger
            .add_milestone(&founder_c, sid, "Beta".into(), None, None)
            .unwrap();
        let investment = ledger
            .record_investment(&alice, sid, amount("1"), "0x01")
            .unwrap();

        let summary = ledger.delete_user(&founder_c, user.id.as_str()).unwrap();
        assert_eq!(
            summary,
            DeleteSummary {
                users: 1,
                startups: 1,
                investments: 1,
                updates: 1,
                milestones: 1,
            }
        );

        assert!(ledger.user(user.id.as_str()).unwrap().is_none());
        assert!(ledger.startup(sid).unwrap().is_none());
        assert!(ledger.startup_for_user(user.id.as_str()).unwrap().is_none());
        assert!(ledger.store().get_update(&update.id).unwrap().is_none());
        assert!(ledger.store().get_milestone(&milestone.id).unwrap().is_none());
        assert!(ledger.investment(investment.id.as_str()).unwrap().is_none());
        assert!(ledger.updates(Some(sid)).unwrap().is_empty());
        assert!(ledger.milestones(Some(sid)).unwrap().is_empty());

        // The investor survives; only their stake in the deleted startup goes.
        assert!(ledger.user(alice_user.id.as_str()).unwrap().is_some());
        assert!(ledger
            .investments_by_investor(alice_user.id.as_str())
            .unwrap()
            .is_empty());
    }
}

#[test]
fn test_deleting_investor_removes_their_investments() {
    for ledger in ledgers() {
        let (_, _, acme) = founder(&ledger, "acme", "10");
        let (_, _, globex) = founder(&ledger, "globex", "10");
        let (alice_user, alice) = investor(&ledger, "alice");
        let (_, bob) = investor(&ledger, "bob");

        ledger
            .record_investment(&alice, acme.id.as_str(), amount("1"), "0x01")
            .unwrap();
        ledger
            .record_investment(&alice, globex.id.as_str(), amount("2"), "0x02")
            .unwrap();
        ledger
            .record_investment(&bob, acme.id.as_str(), amount("3"), "0x03")
            .unwrap();

        let summary = ledger.delete_user(&alice, alice_user.id.as_str()).unwrap();
        assert_eq!(summary.users, 1);
        assert_eq!(summary.startups, 0);
        assert_eq!(summary.investments, 2);

        let remaining = ledger.investments().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].investor_id, bob.id);

        // Surviving startups no longer count the removed stakes.
        let acme_now = ledger.startup(acme.id.as_str()).unwrap().unwrap();
        assert_eq!(acme_now.current_funding, amount("3"));
        let globex_now = ledger.startup(globex.id.as_str()).unwrap().unwrap();
        assert!(globex_now.current_funding.is_zero());
        assert_eq!(
            ledger.reconcile(acme.id.as_str()).unwrap().current_funding,
            amount("3")
        );
    }
}

#[test]
fn test_delete_is_not_repeatable() {
    for ledger in ledgers() {
        let (alice_user, alice) = investor(&ledger, "alice");
        ledger.delete_user(&alice, alice_user.id.as_str()).unwrap();
        let err = ledger
            .delete_user(&alice, alice_user.id.as_str())
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
