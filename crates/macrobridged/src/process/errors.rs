//! Defines the unified error surface for server launch and supervision.

use std::io;

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::executor::ApplicationThreadPanicked;
use crate::transport::ListenerError;

use super::shutdown::ShutdownError;

/// Errors surfaced while launching or supervising the server process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrapping the server failed.
    #[error("bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying bootstrap error.
        #[source]
        source: BootstrapError,
    },
    /// The application thread could not be spawned.
    #[error("failed to spawn application thread: {source}")]
    ApplicationThread {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The application thread panicked.
    #[error("application thread failed: {source}")]
    ApplicationPanicked {
        /// Panic marker.
        #[source]
        source: ApplicationThreadPanicked,
    },
    /// Socket listener startup or shutdown failed.
    #[error("command server listener failed: {source}")]
    Listener {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
    /// Waiting for shutdown failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
}

impl From<BootstrapError> for LaunchError {
    fn from(source: BootstrapError) -> Self {
        Self::Bootstrap { source }
    }
}

impl From<ApplicationThreadPanicked> for LaunchError {
    fn from(source: ApplicationThreadPanicked) -> Self {
        Self::ApplicationPanicked { source }
    }
}

impl From<ListenerError> for LaunchError {
    fn from(source: ListenerError) -> Self {
        Self::Listener { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}
