//! Fixed-interval driver for accepting, servicing and sweeping connections.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use tracing::{info, warn};

use super::listener::SocketListener;
use super::registry::ConnectionRegistry;
use super::{LISTENER_TARGET, RequestHandler, ServerLimits};

/// Owns the listener and every connection. Runs on the poll thread only.
pub(crate) struct PollLoop {
    listener: SocketListener,
    registry: ConnectionRegistry,
    handler: Arc<dyn RequestHandler>,
    limits: ServerLimits,
    last_accept_error: Option<io::ErrorKind>,
}

impl PollLoop {
    pub(crate) fn new(
        listener: SocketListener,
        limits: ServerLimits,
        handler: Arc<dyn RequestHandler>,
    ) -> Self {
        Self {
            listener,
            registry: ConnectionRegistry::new(limits),
            handler,
            limits,
            last_accept_error: None,
        }
    }

    /// One pass: accept, service readable connections, sweep idle ones.
    pub(crate) fn tick(&mut self) {
        self.accept_pending();
        self.registry.service(self.handler.as_ref());
        self.registry.sweep_idle(Instant::now());
    }

    pub(crate) fn run(mut self, shutdown: &AtomicBool) {
        info!(
            target: LISTENER_TARGET,
            endpoint = %self.listener.endpoint(),
            tick_ms = self.limits.tick_interval.as_millis(),
            "poll loop active"
        );
        while !shutdown.load(Ordering::SeqCst) {
            self.tick();
            thread::sleep(self.limits.tick_interval);
        }
        self.registry.close_all();
        info!(target: LISTENER_TARGET, "poll loop stopped");
    }

    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok(Some((stream, peer))) => {
                    self.last_accept_error = None;
                    self.registry.admit(stream, peer, Instant::now());
                }
                Ok(None) => return,
                Err(error) => {
                    let kind = error.kind();
                    if self.last_accept_error != Some(kind) {
                        warn!(
                            target: LISTENER_TARGET,
                            error = %error,
                            "socket accept error"
                        );
                    }
                    self.last_accept_error = Some(kind);
                    return;
                }
            }
        }
    }
}
