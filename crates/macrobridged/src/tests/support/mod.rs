//! Harness utilities shared by the server test suites.

mod config_loader;
mod reporter;
mod server;
mod world;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use server::{ServerHarness, TestClient, expect_error_kind, expect_success, test_limits};
pub use world::{TestWorld, world};
