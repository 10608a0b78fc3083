//! Shared fixtures for the treewatch integration tests.
//!
//! - [`Harness`] drives a `Watcher` over a `MockFileSystem` and a `FakeKernel`.
//! - [`RecordingSink`] / [`FailingSink`] stand in for the command executor.
//! - [`builders`] shortens option and config setup.

pub mod builders;
pub mod harness;
pub mod sink;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};
use treewatch::logging::LOG_ENV_VAR;

pub use harness::Harness;
pub use sink::{FailingSink, RecordingSink};

static INIT: Once = Once::new();

/// How long a live test may wait for the kernel before it is considered hung.
pub const LIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-writer subscriber once per test binary.
///
/// The filter comes from `TREEWATCH_LOG` (e.g. `TREEWATCH_LOG=debug cargo
/// test -- --nocapture`) and defaults to `warn`, so watch bookkeeping stays
/// quiet unless asked for.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .init();
    });
}

/// Await `f`, panicking after [`LIVE_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(LIVE_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("no kernel activity within {LIVE_TIMEOUT:?}"))
}
