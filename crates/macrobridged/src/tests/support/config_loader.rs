//! Configuration loaders for bootstrap and launch scenarios.

use std::ffi::OsString;
use std::fs;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::OrthoError;
use tempfile::TempDir;

use macrobridge_config::{Config, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader that points every path at a private temporary directory and binds
/// an ephemeral loopback port.
pub struct TestConfigLoader {
    workspace: TempDir,
    macro_dir: Utf8PathBuf,
    listen_socket: SocketEndpoint,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let workspace = TempDir::new().expect("failed to create temporary workspace");
        let root = Utf8PathBuf::from_path_buf(workspace.path().to_path_buf())
            .expect("temporary workspace path was not valid UTF-8");
        Self {
            workspace,
            macro_dir: root.join("Macro"),
            listen_socket: SocketEndpoint::tcp("127.0.0.1", 0),
        }
    }

    /// Points the macro directory at a plain file so it cannot be created.
    #[must_use]
    pub fn with_blocked_macro_dir(mut self) -> Self {
        let blocker = self.root().join("not-a-directory");
        fs::write(&blocker, "occupied").expect("failed to write blocking file");
        self.macro_dir = blocker.join("Macro");
        self
    }

    /// Binds the given endpoint instead of an ephemeral port.
    #[must_use]
    pub fn with_listen_socket(mut self, endpoint: SocketEndpoint) -> Self {
        self.listen_socket = endpoint;
        self
    }

    pub fn macro_dir(&self) -> &Utf8PathBuf {
        &self.macro_dir
    }

    pub fn report_log_path(&self) -> Utf8PathBuf {
        self.root().join("macrobridge.log")
    }

    fn root(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.workspace.path().to_path_buf())
            .expect("temporary workspace path was not valid UTF-8")
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            listen_socket: self.listen_socket.clone(),
            macro_dir: Some(self.macro_dir.clone()),
            report_log_path: Some(self.report_log_path()),
            tick_interval_ms: 5,
            ..Config::default()
        })
    }
}

/// Loader that fails because the CLI names an unsupported socket scheme.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_args([
            OsString::from("macrobridged"),
            OsString::from("--listen-socket"),
            OsString::from("unix:///tmp/macrobridge.sock"),
        ])
    }
}
