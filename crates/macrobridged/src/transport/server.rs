//! Start/stop control for the poll thread.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use macrobridge_config::{
    Config, DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_MAX_BUFFER_BYTES, DEFAULT_MAX_CLIENTS,
    DEFAULT_TICK_INTERVAL_MS, FramingMode, SocketEndpoint,
};
use tracing::info;

use super::listener::SocketListener;
use super::poll::PollLoop;
use super::{LISTENER_TARGET, ListenerError, RequestHandler};

/// Connection limits and pacing for the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerLimits {
    /// Connections held at once; further connections are closed on accept.
    pub max_clients: usize,
    /// Receive buffer cap per connection.
    pub max_buffer_bytes: usize,
    /// Silence window before a connection is dropped.
    pub idle_timeout: Duration,
    /// Sleep between poll loop passes.
    pub tick_interval: Duration,
    /// Frame detection policy.
    pub framing: FramingMode,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            max_clients: DEFAULT_MAX_CLIENTS,
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
            idle_timeout: Duration::from_millis(DEFAULT_IDLE_TIMEOUT_MS),
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            framing: FramingMode::default(),
        }
    }
}

impl ServerLimits {
    /// Reads the limits from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_clients: config.max_clients,
            max_buffer_bytes: config.max_buffer_bytes,
            idle_timeout: config.idle_timeout(),
            tick_interval: config.tick_interval(),
            framing: config.framing(),
        }
    }
}

struct Running {
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    handle: thread::JoinHandle<()>,
}

/// The command server: a listener plus the poll thread that drives it.
///
/// [`start`](Self::start) and [`stop`](Self::stop) are idempotent.
pub struct CommandServer {
    endpoint: SocketEndpoint,
    limits: ServerLimits,
    handler: Arc<dyn RequestHandler>,
    running: Option<Running>,
}

impl fmt::Debug for CommandServer {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CommandServer")
            .field("endpoint", &self.endpoint)
            .field("limits", &self.limits)
            .field("local_addr", &self.local_addr())
            .finish_non_exhaustive()
    }
}

impl CommandServer {
    /// Creates a stopped server.
    pub fn new(
        endpoint: SocketEndpoint,
        limits: ServerLimits,
        handler: Arc<dyn RequestHandler>,
    ) -> Self {
        Self {
            endpoint,
            limits,
            handler,
            running: None,
        }
    }

    /// Binds the listener and starts the poll thread.
    ///
    /// Returns the bound address. Calling `start` on a running server returns
    /// the existing address.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the endpoint cannot be resolved or bound,
    /// or the thread cannot be spawned.
    pub fn start(&mut self) -> Result<SocketAddr, ListenerError> {
        if let Some(running) = &self.running {
            return Ok(running.local_addr);
        }
        let listener = SocketListener::bind(&self.endpoint)?;
        let local_addr = listener.local_addr()?;
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let poll = PollLoop::new(listener, self.limits, Arc::clone(&self.handler));
        let handle = thread::Builder::new()
            .name("macrobridge-poll".to_owned())
            .spawn(move || poll.run(&flag))
            .map_err(|source| ListenerError::ThreadSpawn { source })?;
        info!(
            target: LISTENER_TARGET,
            endpoint = %self.endpoint,
            %local_addr,
            "command server started"
        );
        self.running = Some(Running {
            local_addr,
            shutdown,
            handle,
        });
        Ok(local_addr)
    }

    /// Stops the poll thread, closing the listener and every connection.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] if the poll thread panicked.
    pub fn stop(&mut self) -> Result<(), ListenerError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        running.shutdown.store(true, Ordering::SeqCst);
        running
            .handle
            .join()
            .map_err(|_| ListenerError::ThreadPanic)?;
        info!(target: LISTENER_TARGET, "command server stopped");
        Ok(())
    }

    /// Whether the poll thread is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Bound address while running.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }
}

impl Drop for CommandServer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpStream;

    use super::*;
    use crate::transport::test_utils::EchoHandler;

    fn server() -> CommandServer {
        let limits = ServerLimits {
            tick_interval: Duration::from_millis(5),
            ..ServerLimits::default()
        };
        CommandServer::new(
            SocketEndpoint::tcp("127.0.0.1", 0),
            limits,
            Arc::new(EchoHandler),
        )
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut server = server();
        let first = server.start().expect("start");
        assert_eq!(server.start().expect("second start"), first);
        assert!(server.is_running());
        server.stop().expect("stop");
        server.stop().expect("second stop");
        assert!(!server.is_running());
        assert!(server.local_addr().is_none());
    }

    #[test]
    fn serves_requests_until_stopped() {
        let mut server = server();
        let addr = server.start().expect("start");
        let mut client = TcpStream::connect(addr).expect("connect");
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("timeout");
        client.write_all(b"ping\n").expect("write");
        let mut line = String::new();
        BufReader::new(&client).read_line(&mut line).expect("read");
        assert_eq!(line, "ping\n");
        server.stop().expect("stop");
        assert!(TcpStream::connect(addr).is_err());
    }

    #[test]
    fn bind_failure_surfaces_from_start() {
        let mut first = server();
        let addr = first.start().expect("start");
        let mut second = CommandServer::new(
            SocketEndpoint::tcp("127.0.0.1", addr.port()),
            ServerLimits::default(),
            Arc::new(EchoHandler),
        );
        assert!(matches!(second.start(), Err(ListenerError::BindTcp { .. })));
        assert!(!second.is_running());
    }
}
