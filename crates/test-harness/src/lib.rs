//! Shared test infrastructure for the ormcast workspace.
//!
//! Provides a wiremock-backed mock sink plus ready-made model
//! descriptors and instances, so integration tests across crates
//! exercise the same fixtures the reference scenarios use.

pub mod fixtures;
pub mod http;

pub use fixtures::{fake_source_descriptor, fake_source_instance};
pub use http::MockSink;

use tracing_subscriber::EnvFilter;

/// Initializes tracing for tests. Safe to call repeatedly; only the
/// first call installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("warn,ormcast_core=debug,ormcast_delivery=debug")
        }))
        .with_test_writer()
        .try_init();
}
