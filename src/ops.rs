//! JSON-lines operation log and replay.
//!
//! One operation per line:
//!
//! ```text
//! {"op":"sql","sql":"CREATE TABLE t (a INTEGER PRIMARY KEY, b TEXT)"}
//! {"op":"insert","header":"t(a, b)","template":"?, ?","values":[1,"x"],"key":[1]}
//! {"op":"delete","table":"t","columns":{"a":1}}
//! {"op":"flush"}
//! ```
//!
//! Blank lines are skipped. `sql` operations flush pending work first and
//! then run immediately, outside the batch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::BufRead;
use thiserror::Error;
use tracing::{debug, info};

use crate::storage::batch::{BatchError, Batcher, InsertRow};
use crate::storage::executor::Executor;
use crate::value::{RowKey, Value};

/// One replayable operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Delete {
        table: String,
        columns: BTreeMap<String, Value>,
    },
    Insert {
        header: String,
        template: String,
        values: Vec<Value>,
        key: RowKey,
        /// Defaults to the summed estimated size of `values`.
        #[serde(default)]
        size: Option<usize>,
        #[serde(default = "default_command")]
        command: String,
        #[serde(default)]
        suffix: String,
    },
    Flush,
    Sql {
        sql: String,
    },
}

fn default_command() -> String {
    "INSERT".to_string()
}

/// Counts of what a replay did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub deletes: usize,
    pub inserts: usize,
    pub flushes: usize,
    pub statements: usize,
}

/// Error type for replay.
#[derive(Debug, Error)]
pub enum ReplayError<E> {
    #[error("Failed to read operation log: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: invalid operation: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: {source}")]
    Batch {
        line: usize,
        #[source]
        source: BatchError<E>,
    },
}

/// Apply a single operation to `batcher`.
pub fn apply<E: Executor>(
    batcher: &mut Batcher<E>,
    op: Operation,
    stats: &mut ReplayStats,
) -> Result<(), BatchError<E::Error>> {
    match op {
        Operation::Delete { table, columns } => {
            batcher.delete(&table, columns)?;
            stats.deletes += 1;
        }
        Operation::Insert {
            header,
            template,
            values,
            key,
            size,
            command,
            suffix,
        } => {
            let size = size.unwrap_or_else(|| values.iter().map(Value::estimated_size).sum());
            let row = InsertRow::new(header, template, values, key, size)
                .command(command)
                .suffix(suffix);
            batcher.insert(row)?;
            stats.inserts += 1;
        }
        Operation::Flush => {
            batcher.flush()?;
            stats.flushes += 1;
        }
        Operation::Sql { sql } => {
            batcher.flush()?;
            debug!(%sql, "Executing direct statement");
            batcher
                .executor_mut()
                .execute(&sql, &[])
                .map_err(BatchError::Executor)?;
            stats.statements += 1;
        }
    }
    Ok(())
}

/// Replay every operation from `reader` through `batcher`.
///
/// Pending work is left in the batcher; callers flush or
/// [`finish`](Batcher::finish) afterwards.
pub fn replay<R, E>(
    reader: R,
    batcher: &mut Batcher<E>,
) -> Result<ReplayStats, ReplayError<E::Error>>
where
    R: BufRead,
    E: Executor,
{
    let mut stats = ReplayStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let op: Operation = serde_json::from_str(&line).map_err(|source| ReplayError::Parse {
            line: line_no,
            source,
        })?;
        apply(batcher, op, &mut stats).map_err(|source| ReplayError::Batch {
            line: line_no,
            source,
        })?;
    }

    info!(
        deletes = stats.deletes,
        inserts = stats.inserts,
        flushes = stats.flushes,
        statements = stats.statements,
        "Replay complete"
    );
    Ok(stats)
}
