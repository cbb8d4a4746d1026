// ABOUTME: Test support utilities.
// ABOUTME: Provides the recording mock driver and engine fixtures for integration tests.

use scon::engine::{Engine, RetentionPolicy};
use scon::metadata::MetadataStore;
use scon::paths::StatePaths;
use scon::types::{ContainerName, ImageRef};
use std::sync::Once;
use tempfile::TempDir;

// Each test binary only uses some of these items, so allow dead_code.
#[allow(dead_code)]
pub mod mock_driver;

pub use mock_driver::MockDriver;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("scon=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// An engine over a mock driver and a fresh state directory.
///
/// Keep the returned `TempDir` alive for the duration of the test.
#[allow(dead_code)]
pub fn engine(policy: RetentionPolicy) -> (Engine<MockDriver>, TempDir) {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = MetadataStore::new(&StatePaths::new(dir.path()));
    (Engine::new(MockDriver::new(), store, policy), dir)
}

#[allow(dead_code)]
pub fn name(value: &str) -> ContainerName {
    ContainerName::new(value).unwrap()
}

#[allow(dead_code)]
pub fn image(value: &str) -> ImageRef {
    ImageRef::parse(value).unwrap()
}
