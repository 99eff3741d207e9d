//! Embedded command server for a single-threaded CAD host.
//!
//! External clients connect over TCP and send one JSON command per line:
//! create, update, validate or run a macro, move the camera, or read the
//! report log. The server is built from a few pieces:
//!
//! - [`transport`]: a non-blocking listener and a poll thread that owns every
//!   connection, enforcing the client cap, the receive buffer cap and the idle
//!   timeout;
//! - [`dispatch`]: framing, request parsing and the command handlers, which
//!   answer every request with exactly one versioned response envelope;
//! - [`executor`]: the bridge that hands host work to the single application
//!   thread and waits for it with a timeout;
//! - [`runtime`]: the [`ApplicationRuntime`](runtime::ApplicationRuntime) seam
//!   to the host, with an in-memory simulator for stand-alone use.
//!
//! Macro code is normalized and syntax-checked by [`macrobridge_syntax`]
//! before it reaches the host, and configuration comes from
//! [`macrobridge_config`].

mod bootstrap;
mod context;
pub mod dispatch;
pub mod executor;
mod health;
mod process;
mod report;
pub mod runtime;
pub mod store;
mod telemetry;
pub mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, ServerResources, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use context::{SCRATCH_DOCUMENT, ServerContext};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, report_launch_failure,
    run_server,
};
pub use report::ReportLog;
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
