use crate::domain::error::DomainError;
use crate::domain::values::entity_id::Collection;
use rusqlite::Connection;

/// One table per collection. `doc` holds the JSON document; `seq` preserves
/// insertion order for tie-breaking.
pub fn run_migrations(conn: &Connection) -> Result<(), DomainError> {
    for collection in Collection::all() {
        conn.execute_batch(&format!(
            "
            CREATE TABLE IF NOT EXISTS {table} (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                created_us INTEGER NOT NULL,
                doc TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_{table}_created ON {table}(created_us);
            ",
            table = collection.name()
        ))
        .map_err(|e| DomainError::Database(format!("Migration failed: {e}")))?;
    }

    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_users_username ON users(json_extract(doc, '$.username'));
        CREATE INDEX IF NOT EXISTS idx_users_email ON users(json_extract(doc, '$.email'));
        CREATE INDEX IF NOT EXISTS idx_startups_user ON startups(json_extract(doc, '$.user_id'));
        CREATE INDEX IF NOT EXISTS idx_investments_startup ON investments(json_extract(doc, '$.startup_id'));
        CREATE INDEX IF NOT EXISTS idx_investments_investor ON investments(json_extract(doc, '$.investor_id'));
        CREATE INDEX IF NOT EXISTS idx_investments_tx ON investments(json_extract(doc, '$.transaction_ref'));
        CREATE INDEX IF NOT EXISTS idx_updates_startup ON updates(json_extract(doc, '$.startup_id'));
        CREATE INDEX IF NOT EXISTS idx_milestones_startup ON milestones(json_extract(doc, '$.startup_id'));
        ",
    )
    .map_err(|e| DomainError::Database(format!("Migration failed: {e}")))
}
