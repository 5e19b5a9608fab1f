pub mod access;
pub mod funding;
pub mod startups;
pub mod users;
pub mod wallet_transfer;

use crate::domain::error::DomainError;
use crate::domain::ports::ledger_store::LedgerStore;
use crate::domain::values::entity_id::{Collection, EntityId};

/// Resolve an id for a read. An id that matches nothing is an empty result,
/// not an error.
pub(crate) fn lookup(
    store: &dyn LedgerStore,
    collection: Collection,
    raw: &str,
) -> Result<Option<EntityId>, DomainError> {
    match store.resolve_id(collection, raw) {
        Ok(id) => Ok(Some(id)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
