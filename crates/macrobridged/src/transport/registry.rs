//! Live connections owned by the poll thread.

use std::net::{SocketAddr, TcpStream};
use std::time::Instant;

use tracing::{debug, info, warn};

use super::connection::{ClientConnection, ReadOutcome};
use super::{LISTENER_TARGET, RequestHandler, ServerLimits};

/// Result of offering a new stream to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    Admitted(u64),
    Rejected,
}

/// Connection set with count, buffer and idle limits.
#[derive(Debug)]
pub(crate) struct ConnectionRegistry {
    connections: Vec<ClientConnection>,
    limits: ServerLimits,
    next_id: u64,
}

impl ConnectionRegistry {
    pub(crate) fn new(limits: ServerLimits) -> Self {
        Self {
            connections: Vec::new(),
            limits,
            next_id: 1,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.connections.len()
    }

    /// Registers `stream`, or closes it at once when the registry is full.
    pub(crate) fn admit(&mut self, stream: TcpStream, peer: SocketAddr, now: Instant) -> Admission {
        if self.connections.len() >= self.limits.max_clients {
            let _ = stream.shutdown(std::net::Shutdown::Both);
            info!(
                target: LISTENER_TARGET,
                %peer,
                max_clients = self.limits.max_clients,
                "connection rejected"
            );
            return Admission::Rejected;
        }
        let id = self.next_id;
        self.next_id += 1;
        match ClientConnection::new(id, stream, peer, now) {
            Ok(connection) => {
                info!(target: LISTENER_TARGET, id, %peer, "connection accepted");
                self.connections.push(connection);
                Admission::Admitted(id)
            }
            Err(error) => {
                warn!(target: LISTENER_TARGET, %peer, %error, "failed to configure connection");
                Admission::Rejected
            }
        }
    }

    /// Reads every connection and dispatches each complete frame in order.
    ///
    /// Connections that close, fail, or overflow are dropped without a
    /// response.
    pub(crate) fn service(&mut self, handler: &dyn RequestHandler) {
        let limits = self.limits;
        self.connections.retain_mut(|connection| {
            let keep = service_one(connection, handler, limits);
            if !keep {
                connection.close();
            }
            keep
        });
    }

    /// Drops connections silent for longer than the idle timeout.
    pub(crate) fn sweep_idle(&mut self, now: Instant) -> usize {
        let idle_timeout = self.limits.idle_timeout;
        let before = self.connections.len();
        self.connections.retain(|connection| {
            let idle = connection.idle_for(now);
            if idle <= idle_timeout {
                return true;
            }
            info!(
                target: LISTENER_TARGET,
                id = connection.id(),
                peer = %connection.peer(),
                idle_ms = idle.as_millis(),
                buffered = connection.buffered(),
                "closing idle connection"
            );
            connection.close();
            false
        });
        before - self.connections.len()
    }

    pub(crate) fn close_all(&mut self) {
        for connection in self.connections.drain(..) {
            connection.close();
        }
    }
}

fn service_one(
    connection: &mut ClientConnection,
    handler: &dyn RequestHandler,
    limits: ServerLimits,
) -> bool {
    match connection.read_available(limits.max_buffer_bytes) {
        ReadOutcome::Idle => return true,
        ReadOutcome::Data(read) => {
            debug!(target: LISTENER_TARGET, id = connection.id(), read, "received bytes");
        }
        ReadOutcome::Closed => {
            info!(
                target: LISTENER_TARGET,
                id = connection.id(),
                peer = %connection.peer(),
                age_ms = connection.age(Instant::now()).as_millis(),
                "client disconnected"
            );
            return false;
        }
        ReadOutcome::Overflow(size) => {
            warn!(
                target: LISTENER_TARGET,
                id = connection.id(),
                peer = %connection.peer(),
                size,
                max = limits.max_buffer_bytes,
                "receive buffer overflow, closing connection"
            );
            return false;
        }
        ReadOutcome::Failed(error) => {
            warn!(
                target: LISTENER_TARGET,
                id = connection.id(),
                %error,
                "read failed, closing connection"
            );
            return false;
        }
    }

    while let Some(frame) = connection.next_frame(limits.framing) {
        let response = handler.handle(&frame);
        if let Err(error) = connection.send(&response) {
            warn!(
                target: LISTENER_TARGET,
                id = connection.id(),
                %error,
                "failed to write response, closing connection"
            );
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    use rstest::{fixture, rstest};

    use super::*;
    use crate::transport::test_utils::EchoHandler;

    struct Fixture {
        listener: TcpListener,
        registry: ConnectionRegistry,
    }

    impl Fixture {
        fn connect(&mut self) -> (TcpStream, Admission) {
            let client =
                TcpStream::connect(self.listener.local_addr().expect("addr")).expect("connect");
            let (server, peer) = self.listener.accept().expect("accept");
            let admission = self.registry.admit(server, peer, Instant::now());
            (client, admission)
        }
    }

    #[fixture]
    fn fixture() -> Fixture {
        let limits = ServerLimits {
            max_clients: 2,
            max_buffer_bytes: 64,
            idle_timeout: Duration::from_millis(200),
            ..ServerLimits::default()
        };
        Fixture {
            listener: TcpListener::bind(("127.0.0.1", 0)).expect("bind"),
            registry: ConnectionRegistry::new(limits),
        }
    }

    fn service_until<F: Fn(&ConnectionRegistry) -> bool>(registry: &mut ConnectionRegistry, done: F) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !done(registry) && Instant::now() < deadline {
            registry.service(&EchoHandler);
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[rstest]
    fn rejects_beyond_max_clients(mut fixture: Fixture) {
        let (_a, first) = fixture.connect();
        let (_b, second) = fixture.connect();
        let (mut third, rejected) = fixture.connect();
        assert!(matches!(first, Admission::Admitted(_)));
        assert!(matches!(second, Admission::Admitted(_)));
        assert_eq!(rejected, Admission::Rejected);
        assert_eq!(fixture.registry.len(), 2);

        third
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("timeout");
        let mut buf = [0_u8; 8];
        assert_eq!(third.read(&mut buf).unwrap_or(0), 0);
    }

    #[rstest]
    fn answers_each_frame_in_order(mut fixture: Fixture) {
        let (mut client, _) = fixture.connect();
        client.write_all(b"one\ntwo\n").expect("write");
        client
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("timeout");
        for _ in 0..20 {
            fixture.registry.service(&EchoHandler);
            thread::sleep(Duration::from_millis(10));
        }
        let mut reader = BufReader::new(client);
        let mut lines = Vec::new();
        for _ in 0..2 {
            let mut line = String::new();
            reader.read_line(&mut line).expect("response line");
            lines.push(line);
        }
        assert_eq!(lines, vec!["one\n".to_owned(), "two\n".to_owned()]);
    }

    #[rstest]
    fn overflow_drops_connection(mut fixture: Fixture) {
        let (mut client, _) = fixture.connect();
        client.write_all(&[b'x'; 65]).expect("write");
        service_until(&mut fixture.registry, |registry| registry.len() == 0);
        assert_eq!(fixture.registry.len(), 0);
    }

    struct SlowEcho(Duration);

    impl RequestHandler for SlowEcho {
        fn handle(&self, frame: &[u8]) -> Vec<u8> {
            thread::sleep(self.0);
            EchoHandler.handle(frame)
        }
    }

    #[rstest]
    fn slow_handler_does_not_age_later_connections(mut fixture: Fixture) {
        let (mut busy, _) = fixture.connect();
        let (mut partial, _) = fixture.connect();
        busy.write_all(b"work\n").expect("write");
        partial.write_all(b"par").expect("write");
        thread::sleep(Duration::from_millis(50));

        // Longer than the 200 ms idle timeout.
        fixture.registry.service(&SlowEcho(Duration::from_millis(300)));

        assert_eq!(fixture.registry.sweep_idle(Instant::now()), 0);
        assert_eq!(fixture.registry.len(), 2);
    }

    #[rstest]
    fn idle_connections_are_swept(mut fixture: Fixture) {
        let (_client, _) = fixture.connect();
        assert_eq!(fixture.registry.sweep_idle(Instant::now()), 0);
        let later = Instant::now() + Duration::from_millis(250);
        assert_eq!(fixture.registry.sweep_idle(later), 1);
        assert_eq!(fixture.registry.len(), 0);
    }
}
