//! Tracing bootstrap for test binaries

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Install a compact fmt subscriber writing through the test harness
///
/// The filter comes from `RUST_LOG`, defaulting to `warn`. Safe to call from
/// every test; returns `false` when a global subscriber was already set.
pub fn init_tracing() -> bool {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_test_writer()
        .compact()
        .try_init()
        .is_ok()
}
