//! Error types for request dispatch failures.
//!
//! Every failure a client can observe maps onto one [`ErrorKind`], which is
//! the `kind` field of the error envelope.

use std::time::Duration;

use macrobridge_syntax::{SyntaxError, SyntaxIssue, describe_issues};
use serde::Serialize;
use strum::{Display, IntoStaticStr};
use thiserror::Error;

use crate::executor::{BridgeError, OperationError};
use crate::runtime::RuntimeError;
use crate::store::StoreError;

/// Wire taxonomy of error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The frame was not a valid request.
    MalformedRequest,
    /// The `type` field named no known command.
    UnknownCommand,
    /// Parameters were missing, mistyped, or unexpected.
    InvalidParams,
    /// The request declared an unsupported protocol version.
    UnsupportedVersion,
    /// Macro code failed the syntax check.
    Validation,
    /// Macro code or a handler failed while running.
    Execution,
    /// The application thread did not answer in time.
    ExecutionTimeout,
    /// Reading or writing a macro file failed.
    MacroStore,
    /// The host refused the operation.
    Runtime,
    /// The application thread is gone.
    ApplicationUnavailable,
    /// Anything else.
    Internal,
}

/// Errors surfaced during request parsing and dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Frame could not be parsed as a request.
    #[error("malformed request: {message}")]
    MalformedRequest {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// `type` names no known command.
    #[error("unknown command type: {command}")]
    UnknownCommand { command: String },

    /// Parameters failed to deserialize or were rejected.
    #[error("invalid params: {message}")]
    InvalidParams { message: String },

    /// Protocol version other than the supported one.
    #[error("unsupported protocol version {version}")]
    UnsupportedVersion { version: u32 },

    /// Syntax check found problems; nothing was executed.
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        issues: Vec<SyntaxIssue>,
    },

    /// Failure raised by macro code or a handler.
    #[error("{message}")]
    Execution {
        message: String,
        traceback: Option<String>,
    },

    /// Bridge wait elapsed.
    #[error("'{label}' timed out after {} ms", timeout.as_millis())]
    ExecutionTimeout {
        label: &'static str,
        timeout: Duration,
    },

    /// Macro store failure.
    #[error(transparent)]
    MacroStore(#[from] StoreError),

    /// Host refused the operation.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// The application thread is not running.
    #[error("application thread unavailable for '{label}'")]
    ApplicationUnavailable { label: &'static str },

    /// Response serialization failed.
    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Internal error (e.g., a handler panicked).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl DispatchError {
    /// Maps the error onto the wire taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedRequest { .. } => ErrorKind::MalformedRequest,
            Self::UnknownCommand { .. } => ErrorKind::UnknownCommand,
            Self::InvalidParams { .. } => ErrorKind::InvalidParams,
            Self::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Execution { .. } => ErrorKind::Execution,
            Self::ExecutionTimeout { .. } => ErrorKind::ExecutionTimeout,
            Self::MacroStore(_) => ErrorKind::MacroStore,
            Self::Runtime(_) => ErrorKind::Runtime,
            Self::ApplicationUnavailable { .. } => ErrorKind::ApplicationUnavailable,
            Self::Serialize(_) | Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Host traceback, for execution failures that carry one.
    pub fn traceback(&self) -> Option<&str> {
        match self {
            Self::Execution { traceback, .. } => traceback.as_deref(),
            _ => None,
        }
    }

    /// Creates a malformed request error from a serde error.
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::MalformedRequest {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a malformed request error with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unknown command error.
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Creates an invalid params error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Creates a validation error listing `issues`.
    pub fn validation(issues: Vec<SyntaxIssue>) -> Self {
        Self::Validation {
            message: describe_issues(&issues),
            issues,
        }
    }

    /// Creates an execution error.
    pub fn execution(message: impl Into<String>, traceback: Option<String>) -> Self {
        Self::Execution {
            message: message.into(),
            traceback,
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<BridgeError> for DispatchError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Timeout { label, timeout } => Self::ExecutionTimeout { label, timeout },
            BridgeError::Unavailable { label } => Self::ApplicationUnavailable { label },
            BridgeError::TaskPanicked { label, message } => {
                Self::execution(format!("'{label}' panicked: {message}"), None)
            }
        }
    }
}

impl From<OperationError> for DispatchError {
    fn from(error: OperationError) -> Self {
        match error {
            OperationError::Failure(failure) => Self::execution(failure.message, failure.traceback),
            OperationError::Runtime(error) => Self::Runtime(error),
        }
    }
}

impl From<SyntaxError> for DispatchError {
    fn from(error: SyntaxError) -> Self {
        match error {
            SyntaxError::InvalidName { .. } => Self::invalid_params(error.to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}
