//! Internal logging.
//!
//! Stdout belongs to the engine protocol, so everything here goes to stderr,
//! which the engine copies into its own log.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "yate_extmod=info";

/// Install the global subscriber. Honors `RUST_LOG`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
