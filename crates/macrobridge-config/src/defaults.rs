use std::env;

use camino::Utf8PathBuf;

use crate::logging::{FramingMode, LogFormat};
use crate::socket::SocketEndpoint;

/// Default host the command server binds.
pub const DEFAULT_HOST: &str = "localhost";

/// Default TCP port the command server binds.
pub const DEFAULT_TCP_PORT: u16 = 9876;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default cap on simultaneously open client connections.
pub const DEFAULT_MAX_CLIENTS: usize = 5;

/// Default cap on a single connection's receive buffer.
pub const DEFAULT_MAX_BUFFER_BYTES: usize = 1024 * 1024;

/// Default idle window before a silent connection is dropped.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 30_000;

/// Default interval between poll loop ticks.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;

/// Default bound on waiting for macro execution.
pub const DEFAULT_EXECUTION_TIMEOUT_MS: u64 = 10_000;

/// Default bound on waiting for validation and view commands.
pub const DEFAULT_VALIDATION_TIMEOUT_MS: u64 = 5_000;

/// Default number of lines retained by the report log.
pub const DEFAULT_REPORT_MAX_LINES: usize = 100;

/// Document created when a macro runs without an active document.
pub const DEFAULT_DOCUMENT: &str = "Unnamed";

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default framing policy for request streams.
pub fn default_framing() -> FramingMode {
    FramingMode::Auto
}

/// Computes the default listen endpoint for the command server.
pub fn default_socket_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_HOST, DEFAULT_TCP_PORT)
}

pub(crate) fn default_max_clients() -> usize {
    DEFAULT_MAX_CLIENTS
}

pub(crate) fn default_max_buffer_bytes() -> usize {
    DEFAULT_MAX_BUFFER_BYTES
}

pub(crate) fn default_idle_timeout_ms() -> u64 {
    DEFAULT_IDLE_TIMEOUT_MS
}

pub(crate) fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

pub(crate) fn default_execution_timeout_ms() -> u64 {
    DEFAULT_EXECUTION_TIMEOUT_MS
}

pub(crate) fn default_validation_timeout_ms() -> u64 {
    DEFAULT_VALIDATION_TIMEOUT_MS
}

pub(crate) fn default_report_max_lines() -> usize {
    DEFAULT_REPORT_MAX_LINES
}

pub(crate) fn default_document_string() -> String {
    DEFAULT_DOCUMENT.to_owned()
}

/// Directory holding persisted macros when none is configured.
///
/// Uses the platform data directory, falling back to the temporary directory
/// when the platform offers none or the path is not UTF-8.
pub fn default_macro_dir() -> Utf8PathBuf {
    let mut base = dirs::data_dir()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .unwrap_or_else(fallback_base_directory);
    base.push("macrobridge");
    base.push("Macro");
    base
}

/// File mirroring the report log when none is configured.
pub fn default_report_log_path() -> Utf8PathBuf {
    fallback_base_directory().join("macrobridge.log")
}

fn fallback_base_directory() -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(env::temp_dir()).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}
