//! rowbatch: coalesce small inserts and deletes into multi-row SQL statements.
//!
//! A [`Batcher`] collects single-row deletes and inserts, groups them by
//! statement shape, and hands one statement per group to an [`Executor`]
//! once a row or size threshold is crossed, or when flushed explicitly.
//!
//! # Example
//!
//! ```
//! use rowbatch::{row, Batcher, InsertRow};
//! use rusqlite::Connection;
//!
//! let conn = Connection::open_in_memory().unwrap();
//! conn.execute_batch("CREATE TABLE t (a INTEGER PRIMARY KEY, b TEXT)").unwrap();
//!
//! let mut batcher = Batcher::new(conn);
//! batcher.insert(InsertRow::new("t(a, b)", "?, ?", row![1, "x"], row![1], 9)).unwrap();
//! batcher.insert(InsertRow::new("t(a, b)", "?, ?", row![2, "y"], row![2], 9)).unwrap();
//! batcher.delete("t", [("a", 1)]).unwrap();
//! let conn = batcher.finish().unwrap();
//!
//! // Deletes run before inserts within a flush.
//! let count: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
//! assert_eq!(count, 2);
//! ```
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`observability`]: Logging and metrics setup
//! - [`ops`]: JSON-lines operation log replay
//! - [`storage`]: Batcher, executor trait and SQLite executors
//! - [`value`]: Column values

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // storage::batch::BatchConfig is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::missing_panics_doc,         // Panic docs can be verbose
    clippy::needless_raw_string_hashes, // r#""# is fine for SQL
    clippy::struct_excessive_bools      // Config structs may have flags
)]

pub mod config;
pub mod observability;
pub mod ops;
pub mod storage;
pub mod value;

pub use storage::batch::{BatchConfig, BatchError, Batcher, FlushTrigger, InsertRow};
pub use storage::executor::Executor;
pub use value::{RowKey, Value};
