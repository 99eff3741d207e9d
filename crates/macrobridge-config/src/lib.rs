//! Shared configuration for the macrobridge command server.
//!
//! Configuration is layered by [`ortho_config`]: built-in defaults, then a
//! TOML file (`--config-path` or `MACROBRIDGE_CONFIG_PATH`), then
//! `MACROBRIDGE_*` environment variables, then command-line flags. The
//! resulting [`Config`] carries the listen endpoint, connection limits,
//! executor timeouts, framing policy, logging settings, and the locations of
//! the macro directory and report log.

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;
mod socket;

pub use defaults::{
    DEFAULT_DOCUMENT, DEFAULT_EXECUTION_TIMEOUT_MS, DEFAULT_HOST, DEFAULT_IDLE_TIMEOUT_MS,
    DEFAULT_LOG_FILTER, DEFAULT_MAX_BUFFER_BYTES, DEFAULT_MAX_CLIENTS, DEFAULT_REPORT_MAX_LINES,
    DEFAULT_TCP_PORT, DEFAULT_TICK_INTERVAL_MS, DEFAULT_VALIDATION_TIMEOUT_MS, default_framing,
    default_log_filter, default_log_filter_string, default_log_format, default_macro_dir,
    default_report_log_path, default_socket_endpoint,
};
pub use logging::{FramingMode, LogFormat};
pub use socket::{SocketEndpoint, SocketParseError};

/// Resolved configuration for the command server.
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "MACROBRIDGE")]
pub struct Config {
    /// Endpoint the listener binds.
    #[serde(default = "default_socket_endpoint")]
    pub listen_socket: SocketEndpoint,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format for telemetry.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Connections beyond this count are accepted then closed.
    #[serde(default = "defaults::default_max_clients")]
    pub max_clients: usize,
    /// Receive buffer cap per connection.
    #[serde(default = "defaults::default_max_buffer_bytes")]
    pub max_buffer_bytes: usize,
    /// Silence window after which a connection is dropped.
    #[serde(default = "defaults::default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    /// Interval between poll loop ticks.
    #[serde(default = "defaults::default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Bound on waiting for `run_macro`.
    #[serde(default = "defaults::default_execution_timeout_ms")]
    pub execution_timeout_ms: u64,
    /// Bound on waiting for `validate_macro_code` and `set_view`.
    #[serde(default = "defaults::default_validation_timeout_ms")]
    pub validation_timeout_ms: u64,
    /// Request framing policy.
    #[serde(default = "default_framing")]
    pub framing: FramingMode,
    /// Directory holding `.FCMacro` files.
    #[serde(default)]
    pub macro_dir: Option<Utf8PathBuf>,
    /// File mirroring the report log.
    #[serde(default)]
    pub report_log_path: Option<Utf8PathBuf>,
    /// Lines retained by the in-memory report log.
    #[serde(default = "defaults::default_report_max_lines")]
    pub report_max_lines: usize,
    /// Document created when code runs with no active document.
    #[serde(default = "defaults::default_document_string")]
    pub default_document: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_socket: default_socket_endpoint(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            max_clients: DEFAULT_MAX_CLIENTS,
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            execution_timeout_ms: DEFAULT_EXECUTION_TIMEOUT_MS,
            validation_timeout_ms: DEFAULT_VALIDATION_TIMEOUT_MS,
            framing: default_framing(),
            macro_dir: None,
            report_log_path: None,
            report_max_lines: DEFAULT_REPORT_MAX_LINES,
            default_document: DEFAULT_DOCUMENT.to_owned(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    pub fn load_from_env() -> Result<Self, Arc<OrthoError>> {
        Self::load_from_args(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list.
    ///
    /// The first item is treated as the binary name, as with `clap`.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Endpoint the listener binds.
    #[must_use]
    pub fn listen_socket(&self) -> &SocketEndpoint {
        &self.listen_socket
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format for telemetry.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Request framing policy.
    #[must_use]
    pub const fn framing(&self) -> FramingMode {
        self.framing
    }

    /// Idle window as a [`Duration`].
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Tick interval as a [`Duration`].
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Execution bound as a [`Duration`].
    #[must_use]
    pub const fn execution_timeout(&self) -> Duration {
        Duration::from_millis(self.execution_timeout_ms)
    }

    /// Validation bound as a [`Duration`].
    #[must_use]
    pub const fn validation_timeout(&self) -> Duration {
        Duration::from_millis(self.validation_timeout_ms)
    }

    /// Macro directory, falling back to [`default_macro_dir`].
    #[must_use]
    pub fn macro_dir(&self) -> Utf8PathBuf {
        self.macro_dir.clone().unwrap_or_else(default_macro_dir)
    }

    /// Report log file, falling back to [`default_report_log_path`].
    #[must_use]
    pub fn report_log_path(&self) -> Utf8PathBuf {
        self.report_log_path
            .clone()
            .unwrap_or_else(default_report_log_path)
    }

    /// Name of the document created on demand.
    #[must_use]
    pub fn default_document(&self) -> &str {
        &self.default_document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.listen_socket(), &SocketEndpoint::tcp("localhost", 9876));
        assert_eq!(config.max_clients, 5);
        assert_eq!(config.execution_timeout(), Duration::from_secs(10));
        assert_eq!(config.validation_timeout(), Duration::from_secs(5));
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
        assert_eq!(config.framing(), FramingMode::Auto);
    }

    #[test]
    fn macro_dir_falls_back_to_platform_default() {
        let config = Config::default();
        assert!(config.macro_dir().ends_with("macrobridge/Macro"));
    }

    #[test]
    fn explicit_macro_dir_wins() {
        let config = Config {
            macro_dir: Some(Utf8PathBuf::from("/srv/macros")),
            ..Config::default()
        };
        assert_eq!(config.macro_dir(), Utf8PathBuf::from("/srv/macros"));
    }
}
