use crate::sync::StoreError;
use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

const SCHEMA: &str = include_str!("../../sql/schema.sql");

// Thread-local connection slots, one per database path.
thread_local! {
    static DB_CONNS: RefCell<HashMap<String, Connection>> = RefCell::new(HashMap::new());
}

/// Handle to the SQLite file. Cloning copies the path only.
#[derive(Clone, Debug)]
pub struct Database {
    path: String,
}

impl Database {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Provides this thread's connection to the closure, opening it on first use.
    ///
    /// Must not be called re-entrantly from inside `f`.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        DB_CONNS
            .try_with(|cell| {
                let mut conns = cell.borrow_mut();
                let conn = match conns.entry(self.path.clone()) {
                    Entry::Occupied(slot) => slot.into_mut(),
                    Entry::Vacant(slot) => slot.insert(open(&self.path)?),
                };
                f(conn)
            })
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }

    /// Round-trips a trivial query.
    pub fn ping(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map(|_| ())
                .map_err(|e| StoreError::Unavailable(e.to_string()))
        })
    }
}

fn open(path: &str) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)
        .map_err(|e| StoreError::Unavailable(format!("open {path} failed: {e}")))?;

    // The scheduler thread and HTTP workers share the file.
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;

    Ok(conn)
}

/// Applies the embedded schema. Safe to run on every start.
pub fn init_db(db: &Database) -> Result<(), StoreError> {
    db.with_conn(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
    })?;

    info!(path = db.path(), "database initialized");
    Ok(())
}
