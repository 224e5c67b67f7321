//! Tracing subscriber installation.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

static TRACING_INSTALLED: Once = Once::new();

/// Installs a global `tracing` subscriber (idempotent).
///
/// The filter comes from `RUST_LOG`, falling back to `info`. Enable
/// `tidal=trace` to see every surface mutation decision and, with
/// [`Config::trace_snapshots`](crate::Config::trace_snapshots), the tree
/// after every pass. Does nothing if another subscriber is already set.
pub fn install_tracing() {
    TRACING_INSTALLED.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let result = tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_filter(filter))
            .try_init();
        if result.is_err() {
            tracing::debug!("a tracing subscriber is already installed");
        }
    });
}
