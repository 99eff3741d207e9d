//! Error types for macro name checks, normalization and validation.

use thiserror::Error;

/// Errors from the macro syntax layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyntaxError {
    /// The Tree-sitter Python grammar could not be loaded.
    #[error("failed to initialise Python parser: {message}")]
    ParserInit {
        /// Description of the failure.
        message: String,
    },

    /// Tree-sitter returned no tree for the source.
    #[error("failed to parse macro source: {message}")]
    Parse {
        /// Description of the failure.
        message: String,
    },

    /// A macro name broke the allow-list.
    #[error("invalid macro name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Which rule the name broke.
        reason: &'static str,
    },

    /// Internal error indicating a bug or a poisoned lock.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl SyntaxError {
    /// Creates a parser initialisation error.
    #[must_use]
    pub fn parser_init(message: impl Into<String>) -> Self {
        Self::ParserInit {
            message: message.into(),
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates an invalid name error.
    #[must_use]
    pub fn invalid_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason,
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
