use crate::domain::entities::investment::{Investment, NewInvestment};
use crate::domain::entities::milestone::{Milestone, NewMilestone};
use crate::domain::entities::startup::{NewStartup, Startup};
use crate::domain::entities::update::{NewUpdate, Update};
use crate::domain::entities::user::{NewUser, User};
use crate::domain::error::{ConflictReason, DomainError};
use crate::domain::ports::ledger_store::{BackendKind, DeleteSummary, LedgerStore};
use crate::domain::values::amount::Amount;
use crate::domain::values::entity_id::{Collection, EntityId};
use crate::domain::values::wallet_address::WalletAddress;
use crate::infrastructure::document::migrations::run_migrations;
use crate::infrastructure::document::object_id::ObjectIdGenerator;
use crate::infrastructure::resolvers::id_resolver::{ObjectIdResolver, PrefixPolicy};
use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const BY_ID: &str = "id = ?1";
const NEWEST_FIRST: &str = "created_us DESC, seq DESC";
const INSERTION: &str = "seq ASC";

fn field_eq(field: &str) -> String {
    format!("json_extract(doc, '$.{field}') = ?1")
}

fn insert_doc<T: Serialize>(
    conn: &Connection,
    collection: Collection,
    id: &EntityId,
    created_at: DateTime<Utc>,
    doc: &T,
) -> Result<(), DomainError> {
    let body = serde_json::to_string(doc)?;
    conn.execute(
        &format!(
            "INSERT INTO {} (id, created_us, doc) VALUES (?1, ?2, ?3)",
            collection.name()
        ),
        params![id.as_str(), created_at.timestamp_micros(), body],
    )
    .map_err(|e| DomainError::Database(format!("Failed to insert into {collection}: {e}")))?;
    Ok(())
}

fn replace_doc<T: Serialize>(
    conn: &Connection,
    collection: Collection,
    id: &EntityId,
    doc: &T,
) -> Result<(), DomainError> {
    let body = serde_json::to_string(doc)?;
    let rows = conn
        .execute(
            &format!("UPDATE {} SET doc = ?1 WHERE id = ?2", collection.name()),
            params![body, id.as_str()],
        )
        .map_err(|e| DomainError::Database(format!("Failed to update {collection}: {e}")))?;
    if rows == 0 {
        return Err(DomainError::NotFound(format!("{collection} {id}")));
    }
    Ok(())
}

fn fetch_docs<T: DeserializeOwned>(
    conn: &Connection,
    collection: Collection,
    filter: &str,
    args: &[&dyn ToSql],
    order: &str,
) -> Result<Vec<T>, DomainError> {
    let sql = format!(
        "SELECT doc FROM {} WHERE {filter} ORDER BY {order}",
        collection.name()
    );
    let mut stmt = conn.prepare(&sql)?;
    let bodies = stmt
        .query_map(args, |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    bodies
        .iter()
        .map(|b| serde_json::from_str(b).map_err(DomainError::from))
        .collect()
}

fn fetch_one<T: DeserializeOwned>(
    conn: &Connection,
    collection: Collection,
    filter: &str,
    args: &[&dyn ToSql],
) -> Result<Option<T>, DomainError> {
    Ok(fetch_docs(conn, collection, filter, args, INSERTION)?
        .into_iter()
        .next())
}

fn exists(conn: &Connection, collection: Collection, id: &EntityId) -> Result<bool, DomainError> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE id = ?1", collection.name()),
        params![id.as_str()],
        |r| r.get(0),
    )?;
    Ok(count > 0)
}

fn delete_where(
    conn: &Connection,
    collection: Collection,
    filter: &str,
    arg: &str,
) -> Result<usize, DomainError> {
    conn.execute(
        &format!("DELETE FROM {} WHERE {filter}", collection.name()),
        params![arg],
    )
    .map_err(|e| DomainError::Database(format!("Failed to delete from {collection}: {e}")))
}

fn not_found(collection: Collection, id: &EntityId) -> DomainError {
    DomainError::NotFound(format!("{collection} {id}"))
}

fn check_investment(conn: &Connection, investment: &NewInvestment) -> Result<(), DomainError> {
    if investment.amount.is_zero() {
        return Err(DomainError::InvalidInput(
            "Investment amount must be greater than zero".into(),
        ));
    }
    if !exists(conn, Collection::Users, &investment.investor_id)? {
        return Err(not_found(Collection::Users, &investment.investor_id));
    }
    if !exists(conn, Collection::Startups, &investment.startup_id)? {
        return Err(not_found(Collection::Startups, &investment.startup_id));
    }
    if fetch_one::<Investment>(
        conn,
        Collection::Investments,
        &field_eq("transaction_ref"),
        &[&investment.transaction_ref],
    )?
    .is_some()
    {
        return Err(DomainError::Conflict(ConflictReason::TransactionRef));
    }
    Ok(())
}

/// Document backend: each entity is a JSON document in a per-collection
/// table, addressed by a 24-hex object id.
///
/// Single-document mutations are read-modify-write inside an immediate
/// transaction, which the engine serializes against every other writer on
/// the same database file.
pub struct DocumentLedgerStore {
    conn: Mutex<Connection>,
    ids: ObjectIdGenerator,
    resolver: ObjectIdResolver,
}

impl DocumentLedgerStore {
    pub fn open(path: &str, policy: PrefixPolicy) -> Result<Self, DomainError> {
        let conn = Connection::open(path)
            .map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;
        Self::with_connection(conn, policy)
    }

    pub fn with_connection(conn: Connection, policy: PrefixPolicy) -> Result<Self, DomainError> {
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            ids: ObjectIdGenerator::new(),
            resolver: ObjectIdResolver::new(policy),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DomainError> {
        self.conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))
    }

    fn mint(&self) -> EntityId {
        EntityId::new(self.ids.next_id())
    }

    fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &EntityId,
    ) -> Result<Option<T>, DomainError> {
        let conn = self.lock()?;
        fetch_one(&conn, collection, BY_ID, &[&id.as_str()])
    }

    fn list<T: DeserializeOwned>(
        &self,
        collection: Collection,
        filter: &str,
        args: &[&dyn ToSql],
        order: &str,
    ) -> Result<Vec<T>, DomainError> {
        let conn = self.lock()?;
        fetch_docs(&conn, collection, filter, args, order)
    }

    /// Load one document, apply `change`, write it back, all in one
    /// immediate transaction.
    fn modify<T, F>(&self, collection: Collection, id: &EntityId, change: F) -> Result<T, DomainError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&Connection, &mut T) -> Result<(), DomainError>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut doc: T = fetch_one(&tx, collection, BY_ID, &[&id.as_str()])?
            .ok_or_else(|| not_found(collection, id))?;
        change(&tx, &mut doc)?;
        replace_doc(&tx, collection, id, &doc)?;
        tx.commit()?;
        Ok(doc)
    }
}

impl LedgerStore for DocumentLedgerStore {
    fn backend(&self) -> BackendKind {
        BackendKind::Document
    }

    fn resolve_id(&self, collection: Collection, raw: &str) -> Result<EntityId, DomainError> {
        let exists_by_id = |id: &str| {
            let conn = self.lock()?;
            exists(&conn, collection, &EntityId::new(id))
        };
        self.resolver.resolve(collection, raw, exists_by_id, |prefix| {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT id FROM {} WHERE id LIKE ?1 || '%'",
                collection.name()
            ))?;
            let ids = stmt
                .query_map(params![prefix], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    fn create_user(&self, user: NewUser) -> Result<User, DomainError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if fetch_one::<User>(&tx, Collection::Users, &field_eq("username"), &[&user.username])?
            .is_some()
        {
            return Err(DomainError::Conflict(ConflictReason::Username));
        }
        if fetch_one::<User>(&tx, Collection::Users, &field_eq("email"), &[&user.email])?.is_some() {
            return Err(DomainError::Conflict(ConflictReason::Email));
        }
        if let Some(address) = &user.wallet_address {
            if fetch_one::<User>(
                &tx,
                Collection::Users,
                &field_eq("wallet_address"),
                &[&address.as_str()],
            )?
            .is_some()
            {
                return Err(DomainError::Conflict(ConflictReason::Wallet));
            }
        }
        let created = user.into_user(self.mint());
        insert_doc(&tx, Collection::Users, &created.id, created.created_at, &created)?;
        tx.commit()?;
        debug!(id = %created.id, username = %created.username, "user created");
        Ok(created)
    }

    fn get_user(&self, id: &EntityId) -> Result<Option<User>, DomainError> {
        self.get(Collection::Users, id)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let conn = self.lock()?;
        fetch_one(&conn, Collection::Users, &field_eq("username"), &[&username])
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let email = email.trim().to_lowercase();
        let conn = self.lock()?;
        fetch_one(&conn, Collection::Users, &field_eq("email"), &[&email])
    }

    fn list_users(&self) -> Result<Vec<User>, DomainError> {
        self.list(Collection::Users, "1=1", &[], INSERTION)
    }

    fn update_user_wallet_address(
        &self,
        id: &EntityId,
        address: &WalletAddress,
    ) -> Result<User, DomainError> {
        self.modify(Collection::Users, id, |conn, user: &mut User| {
            if user.wallet_confirmed {
                return Err(DomainError::Conflict(ConflictReason::WalletConfirmed));
            }
            let holder: Option<User> = fetch_one(
                conn,
                Collection::Users,
                &field_eq("wallet_address"),
                &[&address.as_str()],
            )?;
            if holder.is_some_and(|h| &h.id != id) {
                return Err(DomainError::Conflict(ConflictReason::Wallet));
            }
            user.wallet_address = Some(address.clone());
            Ok(())
        })
    }

    fn confirm_user_wallet_address(
        &self,
        id: &EntityId,
        address: &WalletAddress,
    ) -> Result<User, DomainError> {
        self.modify(Collection::Users, id, |_, user: &mut User| {
            if user.wallet_address.as_ref() != Some(address) {
                return Err(DomainError::Mismatch(format!(
                    "{address} is not the wallet on record for user {id}"
                )));
            }
            if user.wallet_confirmed {
                return Err(DomainError::Conflict(ConflictReason::WalletConfirmed));
            }
            user.wallet_confirmed = true;
            Ok(())
        })
    }

    fn delete_user(&self, id: &EntityId) -> Result<DeleteSummary, DomainError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !exists(&tx, Collection::Users, id)? {
            return Err(not_found(Collection::Users, id));
        }

        let owned: Vec<Startup> = fetch_docs(
            &tx,
            Collection::Startups,
            &field_eq("user_id"),
            &[&id.as_str()],
            INSERTION,
        )?;

        // Stakes in startups that survive come off their running totals.
        let stakes: Vec<Investment> = fetch_docs(
            &tx,
            Collection::Investments,
            &field_eq("investor_id"),
            &[&id.as_str()],
            INSERTION,
        )?;
        for inv in stakes.iter().filter(|i| !owned.iter().any(|s| s.id == i.startup_id)) {
            let target: Option<Startup> =
                fetch_one(&tx, Collection::Startups, BY_ID, &[&inv.startup_id.as_str()])?;
            if let Some(mut target) = target {
                target.current_funding = target.current_funding.saturating_sub(inv.amount);
                replace_doc(&tx, Collection::Startups, &target.id, &target)?;
            }
        }

        // Children before parents, so a retry after a crash converges.
        let mut summary = DeleteSummary::default();
        for startup in &owned {
            let sid = startup.id.as_str();
            summary.milestones +=
                delete_where(&tx, Collection::Milestones, &field_eq("startup_id"), sid)?;
            summary.updates += delete_where(&tx, Collection::Updates, &field_eq("startup_id"), sid)?;
            summary.investments +=
                delete_where(&tx, Collection::Investments, &field_eq("startup_id"), sid)?;
        }
        summary.investments +=
            delete_where(&tx, Collection::Investments, &field_eq("investor_id"), id.as_str())?;
        summary.startups = delete_where(&tx, Collection::Startups, &field_eq("user_id"), id.as_str())?;
        summary.users = delete_where(&tx, Collection::Users, BY_ID, id.as_str())?;
        tx.commit()?;

        info!(user = %id, ?summary, "user deleted");
        Ok(summary)
    }

    fn create_startup(&self, startup: NewStartup) -> Result<Startup, DomainError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !exists(&tx, Collection::Users, &startup.user_id)? {
            return Err(not_found(Collection::Users, &startup.user_id));
        }
        if fetch_one::<Startup>(
            &tx,
            Collection::Startups,
            &field_eq("user_id"),
            &[&startup.user_id.as_str()],
        )?
        .is_some()
        {
            return Err(DomainError::Conflict(ConflictReason::StartupOwner));
        }
        let created = startup.into_startup(self.mint());
        insert_doc(&tx, Collection::Startups, &created.id, created.created_at, &created)?;
        tx.commit()?;
        Ok(created)
    }

    fn get_startup(&self, id: &EntityId) -> Result<Option<Startup>, DomainError> {
        self.get(Collection::Startups, id)
    }

    fn get_startup_by_user(&self, user_id: &EntityId) -> Result<Option<Startup>, DomainError> {
        let conn = self.lock()?;
        fetch_one(&conn, Collection::Startups, &field_eq("user_id"), &[&user_id.as_str()])
    }

    fn list_startups(&self) -> Result<Vec<Startup>, DomainError> {
        self.list(Collection::Startups, "1=1", &[], NEWEST_FIRST)
    }

    fn update_startup_funding(&self, id: &EntityId, delta: Amount) -> Result<Startup, DomainError> {
        self.modify(Collection::Startups, id, |_, startup: &mut Startup| {
            startup.current_funding = startup
                .current_funding
                .checked_add(delta)
                .ok_or_else(|| DomainError::InvalidInput("Funding total overflow".into()))?;
            Ok(())
        })
    }

    fn reconcile_startup_funding(&self, id: &EntityId) -> Result<(Startup, Amount), DomainError> {
        let mut previous = Amount::ZERO;
        let startup = self.modify(Collection::Startups, id, |conn, startup: &mut Startup| {
            let investments: Vec<Investment> = fetch_docs(
                conn,
                Collection::Investments,
                &field_eq("startup_id"),
                &[&id.as_str()],
                INSERTION,
            )?;
            let amounts: Vec<Amount> = investments.iter().map(|i| i.amount).collect();
            let total = Amount::sum(&amounts)
                .ok_or_else(|| DomainError::InvalidInput("Funding total overflow".into()))?;
            previous = std::mem::replace(&mut startup.current_funding, total);
            Ok(())
        })?;
        Ok((startup, previous))
    }

    fn create_investment(&self, investment: NewInvestment) -> Result<Investment, DomainError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        check_investment(&tx, &investment)?;
        let created = investment.into_investment(self.mint());
        insert_doc(&tx, Collection::Investments, &created.id, created.created_at, &created)?;
        tx.commit()?;
        Ok(created)
    }

    fn record_investment(
        &self,
        investment: NewInvestment,
    ) -> Result<(Investment, Startup), DomainError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        check_investment(&tx, &investment)?;

        let startup_id = investment.startup_id.clone();
        let mut startup: Startup = fetch_one(&tx, Collection::Startups, BY_ID, &[&startup_id.as_str()])?
            .ok_or_else(|| not_found(Collection::Startups, &startup_id))?;
        startup.current_funding = startup
            .current_funding
            .checked_add(investment.amount)
            .ok_or_else(|| DomainError::InvalidInput("Funding total overflow".into()))?;

        let created = investment.into_investment(self.mint());
        insert_doc(&tx, Collection::Investments, &created.id, created.created_at, &created)?;
        replace_doc(&tx, Collection::Startups, &startup_id, &startup)?;
        tx.commit()?;
        Ok((created, startup))
    }

    fn get_investment(&self, id: &EntityId) -> Result<Option<Investment>, DomainError> {
        self.get(Collection::Investments, id)
    }

    fn find_investment_by_transaction(
        &self,
        transaction_ref: &str,
    ) -> Result<Option<Investment>, DomainError> {
        let conn = self.lock()?;
        fetch_one(
            &conn,
            Collection::Investments,
            &field_eq("transaction_ref"),
            &[&transaction_ref],
        )
    }

    fn list_investments(&self) -> Result<Vec<Investment>, DomainError> {
        self.list(Collection::Investments, "1=1", &[], NEWEST_FIRST)
    }

    fn list_investments_by_startup(
        &self,
        startup_id: &EntityId,
    ) -> Result<Vec<Investment>, DomainError> {
        self.list(
            Collection::Investments,
            &field_eq("startup_id"),
            &[&startup_id.as_str()],
            NEWEST_FIRST,
        )
    }

    fn list_investments_by_investor(
        &self,
        investor_id: &EntityId,
    ) -> Result<Vec<Investment>, DomainError> {
        self.list(
            Collection::Investments,
            &field_eq("investor_id"),
            &[&investor_id.as_str()],
            NEWEST_FIRST,
        )
    }

    fn create_update(&self, update: NewUpdate) -> Result<Update, DomainError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !exists(&tx, Collection::Startups, &update.startup_id)? {
            return Err(not_found(Collection::Startups, &update.startup_id));
        }
        let created = update.into_update(self.mint());
        insert_doc(&tx, Collection::Updates, &created.id, created.created_at, &created)?;
        tx.commit()?;
        Ok(created)
    }

    fn get_update(&self, id: &EntityId) -> Result<Option<Update>, DomainError> {
        self.get(Collection::Updates, id)
    }

    fn list_updates(&self) -> Result<Vec<Update>, DomainError> {
        self.list(Collection::Updates, "1=1", &[], NEWEST_FIRST)
    }

    fn list_updates_by_startup(&self, startup_id: &EntityId) -> Result<Vec<Update>, DomainError> {
        self.list(
            Collection::Updates,
            &field_eq("startup_id"),
            &[&startup_id.as_str()],
            NEWEST_FIRST,
        )
    }

    fn create_milestone(&self, milestone: NewMilestone) -> Result<Milestone, DomainError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !exists(&tx, Collection::Startups, &milestone.startup_id)? {
            return Err(not_found(Collection::Startups, &milestone.startup_id));
        }
        let created = milestone.into_milestone(self.mint());
        insert_doc(&tx, Collection::Milestones, &created.id, created.created_at, &created)?;
        tx.commit()?;
        Ok(created)
    }

    fn get_milestone(&self, id: &EntityId) -> Result<Option<Milestone>, DomainError> {
        self.get(Collection::Milestones, id)
    }

    fn list_milestones(&self) -> Result<Vec<Milestone>, DomainError> {
        let mut out: Vec<Milestone> = self.list(Collection::Milestones, "1=1", &[], INSERTION)?;
        out.sort_by(Milestone::schedule_order);
        Ok(out)
    }

    fn list_milestones_by_startup(
        &self,
        startup_id: &EntityId,
    ) -> Result<Vec<Milestone>, DomainError> {
        let mut out: Vec<Milestone> = self.list(
            Collection::Milestones,
            &field_eq("startup_id"),
            &[&startup_id.as_str()],
            INSERTION,
        )?;
        out.sort_by(Milestone::schedule_order);
        Ok(out)
    }

    fn update_milestone_status(
        &self,
        id: &EntityId,
        completed: bool,
    ) -> Result<Milestone, DomainError> {
        self.modify(Collection::Milestones, id, |_, milestone: &mut Milestone| {
            milestone.completed = completed;
            Ok(())
        })
    }
}
