//! Test utilities for rowbatch tests.
//!
//! Provides:
//! - A recording executor with failure injection
//! - Temporary SQLite database fixtures

#![allow(dead_code)]

use rowbatch::{Executor, Value};
use std::fmt;
use std::path::PathBuf;
use tempfile::TempDir;

/// Error returned by [`RecordingExecutor`] when a statement matches its
/// failure pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedFailure(pub String);

impl fmt::Display for InjectedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "injected failure: {}", self.0)
    }
}

impl std::error::Error for InjectedFailure {}

/// Executor that records every statement it is given.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    /// Executed `(sql, params)` pairs, in order
    pub calls: Vec<(String, Vec<Value>)>,
    /// Statements starting with this prefix fail instead of being recorded
    pub fail_prefix: Option<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor that rejects statements starting with `prefix`.
    pub fn failing_on(prefix: &str) -> Self {
        Self {
            calls: Vec::new(),
            fail_prefix: Some(prefix.to_string()),
        }
    }

    /// Statement texts only.
    pub fn statements(&self) -> Vec<&str> {
        self.calls.iter().map(|(sql, _)| sql.as_str()).collect()
    }
}

impl Executor for RecordingExecutor {
    type Error = InjectedFailure;

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<(), Self::Error> {
        if let Some(prefix) = &self.fail_prefix {
            if sql.starts_with(prefix.as_str()) {
                return Err(InjectedFailure(sql.to_string()));
            }
        }
        self.calls.push((sql.to_string(), params.to_vec()));
        Ok(())
    }
}

/// Test fixture that manages a temporary database directory.
///
/// The directory is automatically cleaned up when the fixture is dropped.
pub struct TestFixture {
    /// Temporary directory for test database
    pub temp_dir: TempDir,
    /// Path to the database file
    pub db_path: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with a temporary database directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        Self { temp_dir, db_path }
    }

    /// Write `contents` to a file in the fixture directory and return its path.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).expect("failed to write fixture file");
        path
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
