//! Structured logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with the given filter directive.
///
/// This sets up:
/// - Console logging to stderr, as text or one JSON object per event
/// - A filter from `directive`, falling back to `info,rowbatch=debug` when it
///   does not parse
///
/// # Panics
///
/// Panics if tracing has already been initialized.
pub fn init_tracing(directive: &str, json: bool) {
    let filter = EnvFilter::try_new(directive)
        .unwrap_or_else(|_| EnvFilter::new("info,rowbatch=debug"));

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true);
        registry.with(json_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);
        registry.with(fmt_layer).init();
    }

    tracing::debug!(filter = directive, "Tracing initialized");
}

/// Initialize tracing for tests (only logs errors).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("error")
        .with_test_writer()
        .try_init();
}
