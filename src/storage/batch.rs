//! Row batching for inserts and deletes.
//!
//! Coalesces many single-row operations into a few multi-row statements:
//! - Deletes are grouped by `(table, sorted columns)` and deduplicated
//! - Inserts are grouped by statement skeleton and deduplicated by row key
//! - A flush happens when `row_limit` or `size_limit` is reached, or on demand

use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, trace};

use super::executor::Executor;
use crate::observability::metrics;
use crate::value::{RowKey, Value};

/// Thresholds that trigger an implicit flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Maximum pending row operations (deletes plus inserts)
    pub row_limit: usize,
    /// Maximum summed insert size hints, in bytes
    pub size_limit: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            row_limit: 100,
            size_limit: 1 << 20,
        }
    }
}

impl BatchConfig {
    /// Create a BatchConfig from application config values.
    pub fn from_config(row_limit: usize, size_limit: usize) -> Self {
        Self {
            row_limit,
            size_limit,
        }
    }

    /// Create a test config that flushes after every second row.
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            row_limit: 2,
            size_limit: 1 << 20,
        }
    }
}

/// Error type for batcher operations.
#[derive(Debug, Error)]
pub enum BatchError<E> {
    #[error("delete from {table} needs at least one column value")]
    NoColumns { table: String },

    #[error(transparent)]
    Executor(E),
}

/// What caused a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    Explicit,
    RowLimit,
    SizeLimit,
}

impl FlushTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            FlushTrigger::Explicit => "explicit",
            FlushTrigger::RowLimit => "row_limit",
            FlushTrigger::SizeLimit => "size_limit",
        }
    }
}

/// One insert row and the statement skeleton it belongs to.
///
/// `command` defaults to `INSERT` and `suffix` to the empty string; set them
/// for dialect upserts such as `INSERT OR REPLACE` or `ON CONFLICT ...`.
#[derive(Debug, Clone)]
pub struct InsertRow {
    header: String,
    template: String,
    values: Vec<Value>,
    key: RowKey,
    size: usize,
    command: String,
    suffix: String,
}

impl InsertRow {
    /// # Arguments
    ///
    /// * `header` - Target table and column list, e.g. `t(a, b)`
    /// * `template` - Placeholders for one row, e.g. `?, ?`
    /// * `values` - Parameters for one row, in template order
    /// * `key` - Identifies the row for overwrite within a batch
    /// * `size` - Estimated byte cost, used only for `size_limit`
    pub fn new(
        header: impl Into<String>,
        template: impl Into<String>,
        values: Vec<Value>,
        key: RowKey,
        size: usize,
    ) -> Self {
        Self {
            header: header.into(),
            template: template.into(),
            values,
            key,
            size,
            command: "INSERT".to_string(),
            suffix: String::new(),
        }
    }

    /// Replace the statement verb (`INSERT` by default).
    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Trailing SQL appended after the values list.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct DeleteKey {
    table: String,
    columns: Vec<String>,
}

// Field order is the emission sort order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct InsertKey {
    command: String,
    header: String,
    template: String,
    suffix: String,
}

/// Accumulates deletes and inserts and emits them as grouped statements.
///
/// The batcher owns its executor. Callers must [`flush`](Self::flush) (or
/// [`finish`](Self::finish)) at the end of their unit of work; dropping a
/// batcher discards anything still pending.
#[derive(Debug)]
pub struct Batcher<E> {
    executor: E,
    config: BatchConfig,
    deletes: BTreeMap<DeleteKey, BTreeSet<Vec<Value>>>,
    inserts: BTreeMap<InsertKey, IndexMap<RowKey, Vec<Value>>>,
    rows_added: usize,
    size_added: usize,
}

impl<E: Executor> Batcher<E> {
    /// Create a batcher with the default limits.
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, BatchConfig::default())
    }

    /// Create a batcher with the given limits.
    pub fn with_config(executor: E, config: BatchConfig) -> Self {
        Self {
            executor,
            config,
            deletes: BTreeMap::new(),
            inserts: BTreeMap::new(),
            rows_added: 0,
            size_added: 0,
        }
    }

    /// Queue deletion of the rows matching every `(column, value)` pair.
    ///
    /// Values are embedded into the statement as SQL literals, so they must
    /// be safe to inline (numbers, or text the caller controls).
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::NoColumns`] if `columns` is empty, or the
    /// executor's error if this call triggers a flush that fails.
    pub fn delete<I, C, V>(&mut self, table: &str, columns: I) -> Result<(), BatchError<E::Error>>
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<String>,
        V: Into<Value>,
    {
        let sorted: BTreeMap<String, Value> = columns
            .into_iter()
            .map(|(column, value)| (column.into(), value.into()))
            .collect();
        if sorted.is_empty() {
            return Err(BatchError::NoColumns {
                table: table.to_string(),
            });
        }

        let (columns, row): (Vec<String>, Vec<Value>) = sorted.into_iter().unzip();
        trace!(table, ?columns, "Queued delete");

        let key = DeleteKey {
            table: table.to_string(),
            columns,
        };
        self.deletes.entry(key).or_default().insert(row);
        self.rows_added += 1;

        if self.rows_added >= self.config.row_limit {
            self.flush_with(FlushTrigger::RowLimit)?;
        }
        Ok(())
    }

    /// Queue one insert row, replacing any pending row with the same key in
    /// the same statement group.
    ///
    /// # Errors
    ///
    /// Returns the executor's error if this call triggers a flush that fails.
    pub fn insert(&mut self, row: InsertRow) -> Result<(), BatchError<E::Error>> {
        let InsertRow {
            header,
            template,
            values,
            key: row_key,
            size,
            command,
            suffix,
        } = row;
        trace!(%header, size, "Queued insert");

        let key = InsertKey {
            command,
            header,
            template,
            suffix,
        };
        self.inserts.entry(key).or_default().insert(row_key, values);
        self.rows_added += 1;
        self.size_added = self.size_added.saturating_add(size);

        if self.rows_added >= self.config.row_limit {
            self.flush_with(FlushTrigger::RowLimit)?;
        } else if self.size_added >= self.config.size_limit {
            self.flush_with(FlushTrigger::SizeLimit)?;
        }
        Ok(())
    }

    /// Emit all pending deletes, then all pending inserts, and reset the
    /// counters. Does nothing when no operations are pending.
    ///
    /// # Errors
    ///
    /// Returns the first executor error. Deletes are cleared only after every
    /// delete statement succeeded, and likewise for inserts, so a failure
    /// leaves the failing phase (and anything after it) still pending.
    pub fn flush(&mut self) -> Result<(), BatchError<E::Error>> {
        self.flush_with(FlushTrigger::Explicit)
    }

    /// Flush remaining work and hand back the executor.
    pub fn finish(mut self) -> Result<E, BatchError<E::Error>> {
        self.flush()?;
        Ok(self.executor)
    }

    /// Pending row operations since the last flush.
    pub fn rows_added(&self) -> usize {
        self.rows_added
    }

    /// Summed insert size hints since the last flush.
    pub fn size_added(&self) -> usize {
        self.size_added
    }

    /// True when no deletes or inserts are pending.
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.inserts.is_empty()
    }

    pub fn config(&self) -> BatchConfig {
        self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Direct access to the executor, bypassing batching.
    ///
    /// Statements run this way are not ordered relative to pending work;
    /// flush first if that matters.
    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    fn flush_with(&mut self, trigger: FlushTrigger) -> Result<(), BatchError<E::Error>> {
        if self.is_empty() {
            self.rows_added = 0;
            self.size_added = 0;
            return Ok(());
        }

        debug!(
            trigger = trigger.as_str(),
            rows = self.rows_added,
            size = self.size_added,
            "Flushing row batch"
        );

        if !self.deletes.is_empty() {
            self.do_deletes()?;
            self.deletes.clear();
        }
        if !self.inserts.is_empty() {
            self.do_inserts()?;
            self.inserts.clear();
        }
        self.rows_added = 0;
        self.size_added = 0;

        metrics::record_flush(trigger.as_str());
        Ok(())
    }

    fn do_deletes(&mut self) -> Result<(), BatchError<E::Error>> {
        for (key, rows) in &self.deletes {
            let stmt = build_delete(key, rows);
            debug!(table = %key.table, rows = rows.len(), "Executing batched delete");
            self.executor
                .execute(&stmt, &[])
                .map_err(BatchError::Executor)?;
            metrics::record_statement("delete", rows.len());
        }
        Ok(())
    }

    fn do_inserts(&mut self) -> Result<(), BatchError<E::Error>> {
        for (key, rows) in &self.inserts {
            let (stmt, params) = build_insert(key, rows);
            debug!(
                header = %key.header,
                rows = rows.len(),
                params = params.len(),
                "Executing batched insert"
            );
            self.executor
                .execute(&stmt, &params)
                .map_err(BatchError::Executor)?;
            metrics::record_statement("insert", rows.len());
        }
        Ok(())
    }
}

fn build_delete(key: &DeleteKey, rows: &BTreeSet<Vec<Value>>) -> String {
    if let [column] = key.columns.as_slice() {
        let values = rows
            .iter()
            .map(|row| row[0].to_string())
            .collect::<Vec<_>>()
            .join(",");
        return format!("DELETE FROM {} WHERE {} IN ({})", key.table, column, values);
    }

    let lines = rows
        .iter()
        .map(|row| {
            key.columns
                .iter()
                .zip(row)
                .map(|(column, value)| format!("{column} = {value}"))
                .collect::<Vec<_>>()
                .join(" AND ")
        })
        .collect::<Vec<_>>();
    format!("DELETE FROM {} WHERE {}", key.table, lines.join(" OR "))
}

// e.g.
// INSERT INTO t(c1, c2) VALUES
// (?, ?),
// (?, ?)
// <suffix>
fn build_insert(key: &InsertKey, rows: &IndexMap<RowKey, Vec<Value>>) -> (String, Vec<Value>) {
    let part = format!("({})", key.template);
    let parts = vec![part.as_str(); rows.len()].join(",\n");
    let params = rows.values().flatten().cloned().collect();

    let stmt = format!(
        "{} INTO {} VALUES\n{}\n{}",
        key.command, key.header, parts, key.suffix
    );
    (stmt, params)
}
