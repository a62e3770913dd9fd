//! rowbatch: replay a JSON-lines operation log into SQLite.
//!
//! # Usage
//!
//! ```bash
//! rowbatch --db ./data.db --input ops.jsonl --row-limit 500
//! ```
//!
//! Environment variables can also be used:
//! - `ROWBATCH_DB`: SQLite database file
//! - `ROWBATCH_INPUT`: Operation log (`-` for stdin)
//! - `RUST_LOG`: Log filter

use anyhow::{Context, Result};
use rowbatch::config::Config;
use rowbatch::observability::metrics::init_metrics;
use rowbatch::observability::tracing::init_tracing;
use rowbatch::ops::replay;
use rowbatch::storage::sqlite::ConnectionPool;
use rowbatch::Batcher;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

fn open_input(config: &Config) -> Result<Box<dyn BufRead>> {
    if config.reads_stdin() {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(&config.input)
        .with_context(|| format!("failed to open {}", config.input.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn main() -> Result<()> {
    let config = Config::parse_args();

    init_tracing(&config.log_level, config.log_json);
    init_metrics();

    let pool = ConnectionPool::new(&config.db, config.pool_size)
        .with_context(|| format!("failed to open {}", config.db.display()))?;
    let mut conn = pool.get()?;
    let state = pool.state();
    tracing::debug!(
        connections = state.connections,
        idle = state.idle_connections,
        "Connection pool ready"
    );
    let tx = conn.transaction().context("failed to begin transaction")?;

    let input = open_input(&config)?;
    let mut batcher = Batcher::with_config(tx, config.batch_config());
    let stats = replay(input, &mut batcher)?;
    let tx = batcher.finish().context("final flush failed")?;
    tx.commit().context("commit failed")?;

    println!(
        "replayed {} deletes, {} inserts, {} statements ({} explicit flushes) into {}",
        stats.deletes,
        stats.inserts,
        stats.statements,
        stats.flushes,
        config.db.display()
    );
    Ok(())
}
