//! Tracing/logging initialization.
//!
//! Store operations emit `debug`-level events per commit and `warn` events
//! when a durable write fails, so the default filter keeps the engine crates
//! at `debug` while everything else stays at `info`.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "info,billbook_engine=debug,billbook_ledger=debug";

/// Initialize JSON tracing for the process, filtered via `RUST_LOG`.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .try_init();
}
