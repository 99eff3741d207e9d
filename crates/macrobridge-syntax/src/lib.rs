//! Macro name checks, normalization and static validation for macrobridge.
//!
//! Everything here is pure: no I/O and no host application state. The
//! command server runs these checks before any work is handed to the
//! application thread, so a rejected macro never causes side effects.
//!
//! - [`MacroName`] enforces the file-name allow-list.
//! - [`Normalizer`] adds the standard FreeCAD imports and the view trailer.
//! - [`MacroValidator`] parses Python with Tree-sitter and reports
//!   [`SyntaxIssue`]s without executing anything.
//!
//! # Example
//!
//! ```
//! use macrobridge_syntax::{MacroValidator, Normalizer};
//!
//! let normalized = Normalizer::new().normalize("box = doc.addObject(\"Part::Box\", \"Box\")");
//! let validator = MacroValidator::new();
//! assert!(validator.validate(&normalized.code)?.is_empty());
//! # Ok::<(), macrobridge_syntax::SyntaxError>(())
//! ```

mod error;
mod name;
mod normalize;
mod parser;
mod structure;
mod validator;

pub use error::SyntaxError;
pub use name::{MAX_MACRO_NAME_LEN, MacroName};
pub use normalize::{DEFAULT_HEADER, NormalizedMacro, Normalizer};
pub use validator::{MacroValidator, SyntaxIssue, describe_issues};

#[cfg(test)]
mod tests;
