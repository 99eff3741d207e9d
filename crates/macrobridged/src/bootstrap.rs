//! Command server bootstrap orchestration.

use std::fs;
use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::OrthoError;
use thiserror::Error;

use macrobridge_config::Config;

use crate::health::HealthReporter;
use crate::report::ReportLog;
use crate::store::DirectoryMacroStore;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the server configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that reads the process arguments, environment and config file.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_env()
    }
}

/// Loader that returns a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The macro directory could not be created.
    #[error("failed to prepare macro directory '{path}': {source}")]
    MacroDir {
        /// Configured macro directory.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Everything bootstrap prepares before the server starts.
#[derive(Debug)]
pub struct ServerResources {
    config: Config,
    telemetry: TelemetryHandle,
    store: Arc<DirectoryMacroStore>,
    report: Arc<ReportLog>,
}

impl ServerResources {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// The macro store rooted at the configured macro directory.
    #[must_use]
    pub fn store(&self) -> &Arc<DirectoryMacroStore> {
        &self.store
    }

    /// The shared report log.
    #[must_use]
    pub fn report(&self) -> &Arc<ReportLog> {
        &self.report
    }
}

/// Bootstraps the server using the supplied collaborators.
///
/// Every failure is reported to `reporter` before it is returned.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<ServerResources, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let macro_dir = config.macro_dir();
    if let Err(source) = fs::create_dir_all(&macro_dir) {
        let error = BootstrapError::MacroDir {
            path: macro_dir,
            source,
        };
        reporter.bootstrap_failed(&error);
        return Err(error);
    }

    let store = Arc::new(DirectoryMacroStore::new(macro_dir));
    let report = Arc::new(ReportLog::new(
        config.report_max_lines,
        Some(config.report_log_path()),
    ));
    reporter.bootstrap_succeeded(&config);

    Ok(ServerResources {
        config,
        telemetry,
        store,
        report,
    })
}
