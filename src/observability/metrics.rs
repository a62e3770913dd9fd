//! OpenTelemetry metrics for batch flushing.
//!
//! Key metrics:
//! - rowbatch_flush_total: Counter of flushes, by trigger
//! - rowbatch_statements_total: Counter of emitted statements, by kind
//! - rowbatch_rows_total: Counter of rows carried by emitted statements, by kind

use opentelemetry::metrics::{Counter, Meter};
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::metrics::{ManualReader, SdkMeterProvider};
use std::sync::OnceLock;

/// Global metrics instance.
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Rowbatch metrics registry.
#[derive(Debug)]
pub struct Metrics {
    /// Number of non-empty flushes.
    pub flush_total: Counter<u64>,
    /// Number of statements handed to an executor.
    pub statements_total: Counter<u64>,
    /// Number of distinct rows carried by those statements.
    pub rows_total: Counter<u64>,
}

impl Metrics {
    fn new(meter: &Meter) -> Self {
        Self {
            flush_total: meter
                .u64_counter("rowbatch_flush_total")
                .with_description("Number of non-empty batch flushes")
                .with_unit("1")
                .init(),
            statements_total: meter
                .u64_counter("rowbatch_statements_total")
                .with_description("Number of batched statements executed")
                .with_unit("1")
                .init(),
            rows_total: meter
                .u64_counter("rowbatch_rows_total")
                .with_description("Rows carried by batched statements")
                .with_unit("1")
                .init(),
        }
    }
}

/// Initialize the metrics system.
///
/// Metrics are recorded into a manual reader; nothing is exported. This should
/// be called once at startup. Subsequent calls are ignored.
pub fn init_metrics() {
    METRICS.get_or_init(|| {
        let reader = ManualReader::builder().build();
        let provider = SdkMeterProvider::builder().with_reader(reader).build();
        global::set_meter_provider(provider);

        let meter = global::meter("rowbatch");
        Metrics::new(&meter)
    });
}

/// Get the global metrics instance, if initialized.
pub fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

/// Record a completed flush.
pub fn record_flush(trigger: &'static str) {
    if let Some(m) = METRICS.get() {
        m.flush_total.add(1, &[KeyValue::new("trigger", trigger)]);
    }
}

/// Record one executed statement carrying `rows` rows.
pub fn record_statement(kind: &'static str, rows: usize) {
    if let Some(m) = METRICS.get() {
        let attrs = [KeyValue::new("kind", kind)];
        m.statements_total.add(1, &attrs);
        m.rows_total.add(rows as u64, &attrs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_is_idempotent() {
        init_metrics();
        init_metrics();
        assert!(metrics().is_some());
    }

    #[test]
    fn test_record_flush() {
        init_metrics();
        // Should not panic
        record_flush("explicit");
        record_flush("row_limit");
    }

    #[test]
    fn test_record_statement() {
        init_metrics();
        // Should not panic
        record_statement("insert", 42);
    }
}
