//! # Tracing Setup
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages
//! - `RUST_LOG=kasir_checkout=trace` - Trace the session only
//! - Default: INFO, DEBUG for kasir crates

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,kasir=debug,kasir_core=debug,kasir_checkout=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global fmt subscriber.
///
/// Panics if a global subscriber is already set; use [`try_init_tracing`]
/// where that can happen.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .init();
}

/// Installs the global subscriber unless one is already set.
///
/// Returns whether this call installed it.
pub fn try_init_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init()
        .is_ok()
}
