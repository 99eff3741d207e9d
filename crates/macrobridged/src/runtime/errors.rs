use thiserror::Error;

/// Host-side failures outside macro code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuntimeError {
    /// The GUI is not up yet.
    #[error("application GUI is not initialised")]
    GuiUnavailable,
    /// No document is active.
    #[error("no active document")]
    NoActiveDocument,
    /// The active document has no 3D view.
    #[error("no active view")]
    NoActiveView,
    /// A named document does not exist.
    #[error("document '{name}' not found")]
    DocumentNotFound {
        /// Requested document.
        name: String,
    },
    /// The host reported an error of its own.
    #[error("host error: {message}")]
    Host {
        /// Host-provided description.
        message: String,
    },
}

/// A failure raised while macro code was running.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ExecutionFailure {
    /// One-line description, `Type: detail` in the style of the host.
    pub message: String,
    /// Host traceback, when the host produced one.
    pub traceback: Option<String>,
}

impl ExecutionFailure {
    /// Builds a failure with no traceback.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            traceback: None,
        }
    }

    /// Attaches a traceback.
    #[must_use]
    pub fn with_traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = Some(traceback.into());
        self
    }
}

impl From<RuntimeError> for ExecutionFailure {
    fn from(error: RuntimeError) -> Self {
        Self::new(error.to_string())
    }
}
