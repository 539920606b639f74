//! Environment setup helpers.

use std::sync::Arc;
use trellis_core::TransitionMode;
use trellis_state_inmemory::InMemoryStateStore;

/// Install a test-writer subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Fresh root store named `root`
pub fn test_store(mode: TransitionMode) -> Arc<InMemoryStateStore> {
    Arc::new(InMemoryStateStore::with_mode("root", mode))
}
