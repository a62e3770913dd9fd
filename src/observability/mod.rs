//! Observability infrastructure.
//!
//! Provides:
//! - Structured logging via tracing-subscriber
//! - OpenTelemetry counters for flushes and emitted statements

pub mod metrics;
pub mod tracing;
