use std::sync::Once;
use std::time::Duration;

use lastframe::config::WatchConfig;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 10-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}

/// Watch config with short, test-friendly windows.
#[allow(dead_code)]
pub fn test_watch_config(dir: &std::path::Path) -> WatchConfig {
    WatchConfig {
        dir: dir.to_path_buf(),
        patterns: Vec::new(),
        debounce: Duration::from_millis(100),
        poll_interval: None,
        coalesce_window: Duration::from_millis(250),
    }
}
