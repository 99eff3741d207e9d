//! An in-process command server wired to a simulated host, plus a line
//! oriented TCP client for driving it.

use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde_json::Value;
use tempfile::TempDir;

use macrobridge_config::SocketEndpoint;

use crate::context::ServerContext;
use crate::dispatch::CommandRouter;
use crate::executor::{ApplicationThread, ExecutorBridge, spawn_application_thread, task_channel};
use crate::report::ReportLog;
use crate::runtime::SimulatedRuntime;
use crate::store::{DirectoryMacroStore, MACRO_EXTENSION, MacroStore};
use crate::transport::{CommandServer, ServerLimits};

const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Limits suitable for tests: a fast tick and generous everything else.
#[must_use]
pub fn test_limits() -> ServerLimits {
    ServerLimits {
        tick_interval: Duration::from_millis(5),
        ..ServerLimits::default()
    }
}

/// Running server with its simulated host and a temporary macro directory.
pub struct ServerHarness {
    runtime: SimulatedRuntime,
    report: Arc<ReportLog>,
    macro_dir: Utf8PathBuf,
    server: CommandServer,
    application: Option<ApplicationThread>,
    addr: SocketAddr,
    _workspace: TempDir,
}

impl ServerHarness {
    /// Starts a server with `limits` against a GUI-up host.
    #[must_use]
    pub fn start(limits: ServerLimits) -> Self {
        Self::start_with(limits, SimulatedRuntime::new(), Duration::from_secs(5))
    }

    /// Starts a server against `runtime` with the given execution bound.
    #[must_use]
    pub fn start_with(limits: ServerLimits, runtime: SimulatedRuntime, execution: Duration) -> Self {
        let workspace = TempDir::new().expect("failed to create macro directory");
        let macro_dir = Utf8PathBuf::from_path_buf(workspace.path().to_path_buf())
            .expect("macro directory path was not valid UTF-8");
        let store: Arc<dyn MacroStore> = Arc::new(DirectoryMacroStore::new(macro_dir.clone()));
        let report = Arc::new(ReportLog::in_memory(1_000));

        let (queue, pump) = task_channel();
        let application = spawn_application_thread(pump, runtime.clone())
            .expect("failed to spawn application thread");
        let context = ServerContext::new(store, Arc::clone(&report), ExecutorBridge::new(queue))
            .with_timeouts(execution, Duration::from_secs(5));
        let router = CommandRouter::new(Arc::new(context));
        let mut server = CommandServer::new(
            SocketEndpoint::tcp("127.0.0.1", 0),
            limits,
            Arc::new(router),
        );
        let addr = server.start().expect("server should start");

        Self {
            runtime,
            report,
            macro_dir,
            server,
            application: Some(application),
            addr,
            _workspace: workspace,
        }
    }

    pub fn runtime(&self) -> &SimulatedRuntime {
        &self.runtime
    }

    pub fn report(&self) -> &ReportLog {
        &self.report
    }

    /// Writes a macro file directly, bypassing the protocol.
    pub fn write_macro(&self, name: &str, code: &str) -> Utf8PathBuf {
        let path = self.macro_dir.join(format!("{name}.{MACRO_EXTENSION}"));
        std::fs::write(&path, code).expect("failed to write macro file");
        path
    }

    pub fn read_macro(&self, name: &str) -> String {
        let path = self.macro_dir.join(format!("{name}.{MACRO_EXTENSION}"));
        std::fs::read_to_string(path).expect("failed to read macro file")
    }

    /// Opens a new client connection.
    pub fn connect(&self) -> TestClient {
        TestClient::connect(self.addr)
    }

    pub fn is_running(&self) -> bool {
        self.server.is_running()
    }
}

impl Drop for ServerHarness {
    fn drop(&mut self) {
        let _ = self.server.stop();
        if let Some(application) = self.application.take() {
            let _ = application.stop();
        }
    }
}

/// Blocking client that speaks newline-delimited JSON.
pub struct TestClient {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
}

impl TestClient {
    pub fn connect(addr: SocketAddr) -> Self {
        let writer = TcpStream::connect(addr).expect("failed to connect to server");
        writer
            .set_read_timeout(Some(CLIENT_TIMEOUT))
            .expect("failed to set read timeout");
        let reader = BufReader::new(writer.try_clone().expect("failed to clone stream"));
        Self { writer, reader }
    }

    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).expect("failed to write request");
        self.writer.flush().expect("failed to flush request");
    }

    /// Sends `request` as one JSON line.
    pub fn send(&mut self, request: &Value) {
        let mut line = serde_json::to_vec(request).expect("request should serialize");
        line.push(b'\n');
        self.send_raw(&line);
    }

    /// Reads exactly one response line.
    pub fn read_response(&mut self) -> Value {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).expect("failed to read response");
        assert!(read > 0, "server closed the connection before responding");
        serde_json::from_str(&line).expect("response should be JSON")
    }

    pub fn request(&mut self, request: &Value) -> Value {
        self.send(request);
        self.read_response()
    }

    /// Waits for the server to close the connection. Returns `false` if any
    /// bytes arrive first or the deadline passes.
    pub fn wait_closed(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.reader
            .get_ref()
            .set_read_timeout(Some(Duration::from_millis(50)))
            .expect("failed to set read timeout");
        let mut byte = [0_u8; 1];
        while Instant::now() < deadline {
            match self.reader.read(&mut byte) {
                Ok(0) => return true,
                Ok(_) => return false,
                Err(error) if matches!(error.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    thread::sleep(Duration::from_millis(5));
                }
                Err(_) => return true,
            }
        }
        false
    }
}

/// Returns the `result` object of a success response, failing otherwise.
pub fn expect_success(response: &Value) -> &Value {
    assert_eq!(response["status"], "success", "unexpected response: {response}");
    &response["result"]
}

/// Returns the error kind of an error response, failing otherwise.
pub fn expect_error_kind(response: &Value) -> &str {
    assert_eq!(response["status"], "error", "unexpected response: {response}");
    response["error"]["kind"]
        .as_str()
        .expect("error kind should be a string")
}
