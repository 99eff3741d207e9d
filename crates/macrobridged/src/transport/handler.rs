//! Seam between the transport and request dispatch.

/// Turns one complete request frame into one response line.
///
/// Called on the poll thread, once per frame, in arrival order.
/// Implementations must always return a response, never panic, and include
/// the trailing newline.
pub trait RequestHandler: Send + Sync + 'static {
    /// Handles `frame` and returns the bytes to write back.
    fn handle(&self, frame: &[u8]) -> Vec<u8>;
}
