//! Shared state handed to every command handler.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use macrobridge_config::{Config, DEFAULT_DOCUMENT};
use macrobridge_syntax::{MacroValidator, Normalizer};

use crate::executor::ExecutorBridge;
use crate::report::ReportLog;
use crate::store::MacroStore;

/// Document used for validation run-checks.
pub const SCRATCH_DOCUMENT: &str = "ValidationDoc";

/// Collaborators and limits shared by the command handlers.
///
/// Built once by the launcher and owned by the server; there is no global
/// instance.
pub struct ServerContext {
    pub(crate) store: Arc<dyn MacroStore>,
    pub(crate) report: Arc<ReportLog>,
    pub(crate) validator: MacroValidator,
    pub(crate) normalizer: Normalizer,
    pub(crate) bridge: ExecutorBridge,
    pub(crate) execution_timeout: Duration,
    pub(crate) validation_timeout: Duration,
    pub(crate) default_document: String,
}

impl fmt::Debug for ServerContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ServerContext")
            .field("execution_timeout", &self.execution_timeout)
            .field("validation_timeout", &self.validation_timeout)
            .field("default_document", &self.default_document)
            .finish_non_exhaustive()
    }
}

impl ServerContext {
    /// Builds a context with default timeouts.
    pub fn new(store: Arc<dyn MacroStore>, report: Arc<ReportLog>, bridge: ExecutorBridge) -> Self {
        let defaults = Config::default();
        Self {
            store,
            report,
            validator: MacroValidator::new(),
            normalizer: Normalizer::new(),
            bridge,
            execution_timeout: defaults.execution_timeout(),
            validation_timeout: defaults.validation_timeout(),
            default_document: DEFAULT_DOCUMENT.to_owned(),
        }
    }

    /// Applies timeouts and the default document from `config`.
    #[must_use]
    pub fn configured(mut self, config: &Config) -> Self {
        self.execution_timeout = config.execution_timeout();
        self.validation_timeout = config.validation_timeout();
        config.default_document().clone_into(&mut self.default_document);
        self
    }

    /// Overrides both bridge timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, execution: Duration, validation: Duration) -> Self {
        self.execution_timeout = execution;
        self.validation_timeout = validation;
        self
    }

    /// The shared report log.
    pub fn report(&self) -> &Arc<ReportLog> {
        &self.report
    }
}
