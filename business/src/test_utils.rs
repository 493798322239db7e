//! Helpers shared by the unit tests in this crate.

#![cfg(test)]

use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once per test binary.
///
/// Filtering follows `RUST_LOG`, defaulting to `filebox_business=debug`.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("filebox_business=debug"));
    // Another test may have installed it already.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
