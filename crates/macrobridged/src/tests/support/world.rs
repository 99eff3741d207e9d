//! Shared world for the bootstrap behavioural suite.

use std::cell::RefCell;
use std::sync::Arc;

use crate::bootstrap::{BootstrapError, ConfigLoader, ServerResources, bootstrap_with};

use super::config_loader::{FailingConfigLoader, TestConfigLoader};
use super::reporter::{HealthEvent, RecordingHealthReporter};

/// World state threaded through bootstrap steps.
pub struct TestWorld {
    loader: Arc<dyn ConfigLoader>,
    test_loader: Option<Arc<TestConfigLoader>>,
    reporter: Arc<RecordingHealthReporter>,
    resources: Option<ServerResources>,
    error: Option<BootstrapError>,
}

impl TestWorld {
    fn new() -> Self {
        Self {
            loader: Arc::new(FailingConfigLoader),
            test_loader: None,
            reporter: Arc::new(RecordingHealthReporter::default()),
            resources: None,
            error: None,
        }
    }

    pub fn use_loader(&mut self, loader: TestConfigLoader) {
        let loader = Arc::new(loader);
        self.loader = Arc::clone(&loader) as Arc<dyn ConfigLoader>;
        self.test_loader = Some(loader);
    }

    pub fn use_failing_loader(&mut self) {
        self.loader = Arc::new(FailingConfigLoader);
        self.test_loader = None;
    }

    pub fn bootstrap(&mut self) {
        let reporter: Arc<RecordingHealthReporter> = Arc::clone(&self.reporter);
        match bootstrap_with(self.loader.as_ref(), reporter) {
            Ok(resources) => self.resources = Some(resources),
            Err(error) => self.error = Some(error),
        }
    }

    pub fn resources(&self) -> Option<&ServerResources> {
        self.resources.as_ref()
    }

    pub fn error(&self) -> Option<&BootstrapError> {
        self.error.as_ref()
    }

    pub fn test_loader(&self) -> Option<&TestConfigLoader> {
        self.test_loader.as_deref()
    }

    pub fn events(&self) -> Vec<HealthEvent> {
        self.reporter.events()
    }
}

/// Creates a fresh world whose loader fails until a step replaces it.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
