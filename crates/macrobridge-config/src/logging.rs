use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// How the server splits a connection's byte stream into request frames.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FramingMode {
    /// Newline-delimited frames, falling back to a whole-buffer JSON parse
    /// when no newline has arrived yet.
    #[default]
    Auto,
    /// Newline-delimited frames only.
    Newline,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn parses_framing_mode_case_insensitively() {
        assert_eq!(FramingMode::from_str("NEWLINE"), Ok(FramingMode::Newline));
        assert_eq!(FramingMode::from_str("auto"), Ok(FramingMode::Auto));
        assert!(FramingMode::from_str("length-prefixed").is_err());
    }

    #[test]
    fn log_format_displays_snake_case() {
        assert_eq!(LogFormat::Compact.to_string(), "compact");
    }
}
