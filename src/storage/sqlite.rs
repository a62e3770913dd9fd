//! SQLite executors.
//!
//! [`Executor`] is implemented for plain connections, transactions and
//! r2d2-pooled connections, so a batcher can run inside whatever transaction
//! context the caller already holds. Placeholders in insert templates must
//! use SQLite syntax (`?`, `?NNN`).

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params_from_iter, Connection, Transaction};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::trace;

use super::executor::Executor;
use crate::value::Value;

/// Error type for SQLite setup.
#[derive(Debug, Error)]
pub enum SqliteError {
    #[error("Failed to create connection pool: {0}")]
    PoolCreation(#[from] r2d2::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Apply write-side pragmas to a fresh connection.
pub fn apply_pragmas(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;",
    )
}

/// Open a read-write connection to `path`, creating the file if needed.
pub fn open_connection<P: AsRef<Path>>(path: P) -> Result<Connection, SqliteError> {
    let conn = Connection::open(path)?;
    apply_pragmas(&conn)?;
    Ok(conn)
}

fn execute_on(conn: &Connection, sql: &str, params: &[Value]) -> Result<(), rusqlite::Error> {
    let changed = conn.execute(sql, params_from_iter(params.iter()))?;
    trace!(changed, params = params.len(), "Statement executed");
    Ok(())
}

impl Executor for Connection {
    type Error = rusqlite::Error;

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<(), Self::Error> {
        execute_on(self, sql, params)
    }
}

impl Executor for Transaction<'_> {
    type Error = rusqlite::Error;

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<(), Self::Error> {
        execute_on(self, sql, params)
    }
}

impl Executor for PooledConnection<SqliteConnectionManager> {
    type Error = rusqlite::Error;

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<(), Self::Error> {
        execute_on(self, sql, params)
    }
}

/// Pool of read-write connections.
///
/// Each checked-out connection is an [`Executor`]. SQLite allows one writer
/// at a time; the busy timeout covers short contention between pooled
/// connections.
#[derive(Clone)]
pub struct ConnectionPool {
    pool: Pool<SqliteConnectionManager>,
}

impl ConnectionPool {
    /// Create a new pool for the given database path.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the SQLite database file
    /// * `max_size` - Maximum number of connections in the pool
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be created.
    pub fn new<P: AsRef<Path>>(db_path: P, max_size: u32) -> Result<Self, SqliteError> {
        let manager = SqliteConnectionManager::file(db_path);

        let pool = Pool::builder()
            .max_size(max_size)
            .connection_customizer(Box::new(WriterConnectionCustomizer))
            .build(manager)?;

        Ok(Self { pool })
    }

    /// Get a connection from the pool.
    pub fn get(&self) -> Result<PooledConnection<SqliteConnectionManager>, SqliteError> {
        Ok(self.pool.get()?)
    }

    /// Get the current pool state for monitoring.
    pub fn state(&self) -> r2d2::State {
        self.pool.state()
    }
}

/// Connection customizer that applies write pragmas.
#[derive(Debug)]
struct WriterConnectionCustomizer;

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for WriterConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        apply_pragmas(conn)
    }
}
