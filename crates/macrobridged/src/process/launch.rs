//! Supervises server launch sequencing and runtime orchestration.

use std::sync::Arc;

use macrobridge_config::Config;
use tracing::{error, info, warn};

use crate::bootstrap::{ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::context::ServerContext;
use crate::dispatch::CommandRouter;
use crate::executor::{ExecutorBridge, spawn_application_thread, task_channel};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::runtime::{ApplicationRuntime, SimulatedRuntime};
use crate::store::MacroStore;
use crate::telemetry;
use crate::transport::{CommandServer, ServerLimits};

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Process-level collaborators needed to control the server lifecycle.
pub(crate) struct ProcessControl<S> {
    pub(crate) shutdown: S,
}

/// Service dependencies required to construct the server.
pub(crate) struct ServiceDeps<L, R> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) runtime: R,
}

/// Collaborators required to launch the server.
pub(crate) struct LaunchPlan<L, R, S> {
    pub(crate) process: ProcessControl<S>,
    pub(crate) services: ServiceDeps<L, R>,
}

/// Runs the server with the production collaborators and the simulated host.
pub fn run_server() -> Result<(), LaunchError> {
    let plan = LaunchPlan {
        process: ProcessControl {
            shutdown: SystemShutdownSignal::new(),
        },
        services: ServiceDeps {
            loader: SystemConfigLoader,
            reporter: Arc::new(StructuredHealthReporter::new()),
            runtime: SimulatedRuntime::new(),
        },
    };
    run_server_with(plan)
}

/// Logs a launch failure through `tracing`.
///
/// Configuration errors surface before bootstrap installs telemetry, so the
/// default subscriber is installed here when none exists yet.
pub fn report_launch_failure(failure: &LaunchError) {
    if let Err(telemetry_error) = telemetry::initialise(&Config::default()) {
        warn!(target: PROCESS_TARGET, %telemetry_error, "default telemetry unavailable");
    }
    error!(target: PROCESS_TARGET, error = %failure, "command server failed");
}

/// Runs the server with injected collaborators.
pub(crate) fn run_server_with<L, R, S>(plan: LaunchPlan<L, R, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    R: ApplicationRuntime + 'static,
    S: ShutdownSignal,
{
    let LaunchPlan { process, services } = plan;
    let ProcessControl { shutdown } = process;
    let ServiceDeps {
        loader,
        reporter,
        runtime,
    } = services;

    info!(target: PROCESS_TARGET, "starting command server");
    let resources = bootstrap_with(&loader, Arc::clone(&reporter))?;
    let config = resources.config();

    let (queue, pump) = task_channel();
    let application = spawn_application_thread(pump, runtime)
        .map_err(|source| LaunchError::ApplicationThread { source })?;

    let store: Arc<dyn MacroStore> = resources.store().clone();
    let context = ServerContext::new(store, Arc::clone(resources.report()), ExecutorBridge::new(queue))
        .configured(config);
    let router = CommandRouter::new(Arc::new(context));
    let mut server = CommandServer::new(
        config.listen_socket().clone(),
        ServerLimits::from_config(config),
        Arc::new(router),
    );

    let addr = match server.start() {
        Ok(addr) => addr,
        Err(error) => {
            reporter.server_failed(&error);
            let _ = application.stop();
            return Err(error.into());
        }
    };
    reporter.server_listening(addr);
    resources
        .report()
        .append(format!("Command server listening on {addr}"));

    let waited = shutdown.wait();
    info!(target: PROCESS_TARGET, "stopping command server");
    let stopped = server.stop();
    let joined = application.stop();
    reporter.server_stopped();
    waited?;
    stopped?;
    joined?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}
