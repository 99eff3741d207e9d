//! Allow-list for macro names.
//!
//! Names become file stems inside the macro directory, so anything that
//! could escape it (separators, dots, whitespace) is refused up front.

use std::fmt;

use crate::error::SyntaxError;

/// Longest accepted macro name, in bytes.
pub const MAX_MACRO_NAME_LEN: usize = 128;

/// A macro name that passed the allow-list.
///
/// Only ASCII letters, digits, `_` and `-` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacroName(String);

impl MacroName {
    /// Validates `raw` against the allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::InvalidName`] when the name is empty, longer
    /// than [`MAX_MACRO_NAME_LEN`], or contains a disallowed character.
    pub fn parse(raw: &str) -> Result<Self, SyntaxError> {
        if raw.is_empty() {
            return Err(SyntaxError::invalid_name(raw, "name must not be empty"));
        }
        if raw.len() > MAX_MACRO_NAME_LEN {
            return Err(SyntaxError::invalid_name(
                raw,
                "name must be at most 128 characters",
            ));
        }
        if !raw.bytes().all(is_allowed) {
            return Err(SyntaxError::invalid_name(
                raw,
                "name may only contain letters, digits, '_' and '-'",
            ));
        }
        Ok(Self(raw.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

const fn is_allowed(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

impl AsRef<str> for MacroName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacroName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("flange")]
    #[case("Complex_Flange-2")]
    #[case("a")]
    fn accepts_allowed_names(#[case] raw: &str) {
        let name = MacroName::parse(raw).expect("name should be accepted");
        assert_eq!(name.as_str(), raw);
    }

    #[rstest]
    #[case("")]
    #[case("../escape")]
    #[case("with space")]
    #[case("dotted.name")]
    #[case("slash/name")]
    #[case("ümlaut")]
    fn rejects_disallowed_names(#[case] raw: &str) {
        let error = MacroName::parse(raw).expect_err("name should be rejected");
        assert!(matches!(error, SyntaxError::InvalidName { .. }));
    }

    #[test]
    fn enforces_length_cap() {
        let at_cap = "a".repeat(MAX_MACRO_NAME_LEN);
        assert!(MacroName::parse(&at_cap).is_ok());

        let over_cap = "a".repeat(MAX_MACRO_NAME_LEN + 1);
        assert!(MacroName::parse(&over_cap).is_err());
    }
}
