//! Test helpers for the transport module.

use super::RequestHandler;

/// Replies to every frame with the frame itself.
pub(crate) struct EchoHandler;

impl RequestHandler for EchoHandler {
    fn handle(&self, frame: &[u8]) -> Vec<u8> {
        let mut response = frame.to_vec();
        response.push(b'\n');
        response
    }
}
