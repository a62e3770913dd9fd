//! Batching and statement execution.
//!
//! Provides:
//! - The row batcher and its flush thresholds
//! - The executor boundary the batcher emits statements through
//! - SQLite executors and a pooled connection source

pub mod batch;
pub mod executor;
pub mod sqlite;
