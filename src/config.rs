//! Configuration parsing for the rowbatch replay tool.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Defaults matching the batcher's built-in limits

use clap::Parser;
use std::path::PathBuf;

use crate::storage::batch::BatchConfig;

/// rowbatch: replay a JSON-lines operation log into SQLite through a row batcher.
#[derive(Parser, Debug, Clone)]
#[command(name = "rowbatch")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// SQLite database file to write to
    #[arg(short, long, env = "ROWBATCH_DB", default_value = "./rowbatch.db")]
    pub db: PathBuf,

    /// Operation log to replay (`-` reads stdin)
    #[arg(short, long, env = "ROWBATCH_INPUT", default_value = "-")]
    pub input: PathBuf,

    /// Pending row operations that trigger a flush
    #[arg(long, env = "ROWBATCH_ROW_LIMIT", default_value_t = 100)]
    pub row_limit: usize,

    /// Summed insert size hints (bytes) that trigger a flush
    #[arg(long, env = "ROWBATCH_SIZE_LIMIT", default_value_t = 1 << 20)]
    pub size_limit: usize,

    /// Log filter (trace, debug, info, warn, error, or a full directive)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON objects instead of text
    #[arg(long, env = "ROWBATCH_LOG_JSON")]
    pub log_json: bool,

    /// Size of the SQLite connection pool
    #[arg(long, env = "ROWBATCH_POOL_SIZE", default_value_t = 2)]
    pub pool_size: u32,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Batcher thresholds from this configuration.
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig::from_config(self.row_limit, self.size_limit)
    }

    /// True when the operation log comes from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }

    /// Create a default configuration for testing.
    #[cfg(test)]
    pub fn test_config(db: PathBuf) -> Self {
        Self {
            db,
            input: PathBuf::from("-"),
            row_limit: 2,
            size_limit: 64,
            log_level: "debug".into(),
            log_json: false,
            pool_size: 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let batch = BatchConfig::default();
        Self {
            db: PathBuf::from("./rowbatch.db"),
            input: PathBuf::from("-"),
            row_limit: batch.row_limit,
            size_limit: batch.size_limit,
            log_level: "info".into(),
            log_json: false,
            pool_size: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.batch_config(), BatchConfig::default());
        assert!(config.reads_stdin());
    }

    #[test]
    fn test_parse_limits() {
        let config = Config::try_parse_from([
            "rowbatch",
            "--db",
            "out.db",
            "--input",
            "ops.jsonl",
            "--row-limit",
            "10",
            "--size-limit",
            "4096",
        ])
        .unwrap();
        assert_eq!(config.db, PathBuf::from("out.db"));
        assert!(!config.reads_stdin());
        assert_eq!(config.batch_config(), BatchConfig::from_config(10, 4096));
    }

    #[test]
    fn test_config_for_tests() {
        let config = Config::test_config(PathBuf::from("t.db"));
        assert_eq!(config.batch_config().row_limit, 2);
    }
}
