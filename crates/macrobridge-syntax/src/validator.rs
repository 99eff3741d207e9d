//! Static syntax check for macro source.
//!
//! [`MacroValidator`] only parses; it never executes anything. It is shared
//! between the network thread and handlers, so the parser lives behind a
//! mutex and is created on first use.

use std::fmt;
use std::sync::Mutex;

use crate::error::SyntaxError;
use crate::parser::Parser;

/// Tree-sitter backed syntax validator for Python macros.
pub struct MacroValidator {
    parser: Mutex<Option<Parser>>,
}

impl MacroValidator {
    /// Creates a validator; the parser is built lazily.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            parser: Mutex::new(None),
        }
    }

    /// Parses `code` and returns every syntax issue found.
    ///
    /// An empty list means the code is syntactically valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the parser cannot be initialised or the internal
    /// lock is poisoned.
    pub fn validate(&self, code: &str) -> Result<Vec<SyntaxIssue>, SyntaxError> {
        let mut guard = self
            .parser
            .lock()
            .map_err(|_| SyntaxError::internal("validator lock poisoned"))?;

        if guard.is_none() {
            *guard = Some(Parser::new()?);
        }
        let parser = guard
            .as_mut()
            .ok_or_else(|| SyntaxError::internal("parser missing after initialisation"))?;

        let result = parser.parse(code)?;
        Ok(result
            .errors()
            .into_iter()
            .map(|e| SyntaxIssue {
                line: e.line,
                column: e.column,
                message: e.message,
                context: e.context,
            })
            .collect())
    }
}

impl Default for MacroValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MacroValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroValidator")
            .field("language", &"python")
            .finish_non_exhaustive()
    }
}

/// A syntax problem found in macro source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    /// Line number (one-based).
    pub line: u32,
    /// Column number (one-based).
    pub column: u32,
    /// Human-readable description.
    pub message: String,
    /// Snippet of the offending source.
    pub context: String,
}

impl fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}: {}", self.line, self.column, self.message)?;
        if !self.context.is_empty() {
            write!(f, " near '{}'", self.context)?;
        }
        Ok(())
    }
}

/// Joins issues into one message suitable for an error response.
#[must_use]
pub fn describe_issues(issues: &[SyntaxIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_macro_has_no_issues() {
        let validator = MacroValidator::new();
        let issues = validator
            .validate("import FreeCAD as App\ndoc = App.ActiveDocument\n")
            .expect("validate");
        assert!(issues.is_empty());
    }

    #[test]
    fn invalid_macro_reports_location() {
        let validator = MacroValidator::new();
        let issues = validator.validate("def broken(:\n    pass\n").expect("validate");
        let first = issues.first().expect("at least one issue");
        assert_eq!(first.line, 1);
        assert!(first.to_string().starts_with("line 1"));
    }

    #[test]
    fn validator_is_reusable() {
        let validator = MacroValidator::new();
        assert!(!validator.validate("x = (").expect("validate").is_empty());
        assert!(validator.validate("x = 1").expect("validate").is_empty());
        assert!(!validator.validate("return 1").expect("validate").is_empty());
    }

    #[test]
    fn describe_issues_joins_messages() {
        let issues = vec![
            SyntaxIssue {
                line: 1,
                column: 2,
                message: "invalid syntax".to_owned(),
                context: String::new(),
            },
            SyntaxIssue {
                line: 3,
                column: 1,
                message: "missing )".to_owned(),
                context: "(".to_owned(),
            },
        ];
        assert_eq!(
            describe_issues(&issues),
            "line 1, column 2: invalid syntax; line 3, column 1: missing ) near '('"
        );
    }
}
