//! One accepted client and its receive buffer.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use macrobridge_config::FramingMode;

use crate::dispatch::next_frame;

/// Largest single read from a socket.
pub(crate) const READ_CHUNK: usize = 32 * 1024;

/// Bound on writing one response to a slow client.
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// What a non-blocking read pass produced.
#[derive(Debug)]
pub(crate) enum ReadOutcome {
    /// Nothing to read.
    Idle,
    /// Bytes were appended to the buffer.
    Data(usize),
    /// The peer closed its side.
    Closed,
    /// The buffer grew beyond its cap.
    Overflow(usize),
    /// The socket reported an error.
    Failed(io::Error),
}

#[derive(Debug)]
pub(crate) struct ClientConnection {
    id: u64,
    peer: SocketAddr,
    stream: TcpStream,
    buffer: Vec<u8>,
    created_at: Instant,
    last_activity: Instant,
}

impl ClientConnection {
    pub(crate) fn new(id: u64, stream: TcpStream, peer: SocketAddr, now: Instant) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        Ok(Self {
            id,
            peer,
            stream,
            buffer: Vec::new(),
            created_at: now,
            last_activity: now,
        })
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub(crate) fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    pub(crate) fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Reads everything currently available, up to `max_buffer` buffered bytes.
    ///
    /// Bytes that arrive before an end-of-stream are reported as data; the
    /// close is seen on the next pass. Activity is stamped when bytes are
    /// read, not when the pass began.
    pub(crate) fn read_available(&mut self, max_buffer: usize) -> ReadOutcome {
        let mut chunk = vec![0_u8; READ_CHUNK];
        let mut total = 0;
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) if total == 0 => return ReadOutcome::Closed,
                Ok(0) => return ReadOutcome::Data(total),
                Ok(read) => {
                    self.buffer.extend_from_slice(&chunk[..read]);
                    self.last_activity = Instant::now();
                    total += read;
                    if self.buffer.len() > max_buffer {
                        return ReadOutcome::Overflow(self.buffer.len());
                    }
                }
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                    return if total == 0 {
                        ReadOutcome::Idle
                    } else {
                        ReadOutcome::Data(total)
                    };
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return ReadOutcome::Failed(error),
            }
        }
    }

    pub(crate) fn next_frame(&mut self, mode: FramingMode) -> Option<Vec<u8>> {
        next_frame(&mut self.buffer, mode)
    }

    /// Writes a whole response, blocking up to the write timeout.
    pub(crate) fn send(&mut self, response: &[u8]) -> io::Result<()> {
        self.stream.set_nonblocking(false)?;
        let written = self
            .stream
            .write_all(response)
            .and_then(|()| self.stream.flush());
        self.stream.set_nonblocking(true)?;
        written?;
        self.last_activity = Instant::now();
        Ok(())
    }

    pub(crate) fn close(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
