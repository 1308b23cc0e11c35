//! Tracing initialization for harness binaries and tests.

use tracing_subscriber::EnvFilter;

/// Installs a formatted subscriber honoring `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops. Child processes
/// call this independently — nothing is shared with the parent.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
