//! Opt-in tracing initialization.
//!
//! The library itself only emits `tracing` events and never installs a
//! global subscriber. Applications that want quick console output can call
//! [`init_default_tracing`] once at startup; anything more elaborate should
//! configure `tracing_subscriber` directly.

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber honoring `RUST_LOG`, defaulting to
/// `info`. Safe to call more than once; later calls are no-ops.
pub fn init_default_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
