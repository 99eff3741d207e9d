//! Splits a connection's receive buffer into request frames.

use macrobridge_config::FramingMode;
use serde::de::IgnoredAny;

/// Removes and returns the next complete frame from `buffer`.
///
/// Newline-terminated lines are frames; blank lines are dropped. In
/// [`FramingMode::Auto`], a buffer with no newline that holds exactly one
/// JSON object is also a frame. Returns `None` when more bytes are needed.
/// The buffer is drained by exactly the bytes of the returned frame and any
/// blank lines before it.
pub fn next_frame(buffer: &mut Vec<u8>, mode: FramingMode) -> Option<Vec<u8>> {
    while let Some(position) = buffer.iter().position(|byte| *byte == b'\n') {
        let mut line: Vec<u8> = buffer.drain(..=position).collect();
        line.pop();
        if !line.trim_ascii().is_empty() {
            return Some(line);
        }
    }
    if mode == FramingMode::Auto && is_complete_object(buffer) {
        return Some(std::mem::take(buffer));
    }
    None
}

fn is_complete_object(buffer: &[u8]) -> bool {
    let trimmed = buffer.trim_ascii();
    trimmed.first() == Some(&b'{') && serde_json::from_slice::<IgnoredAny>(trimmed).is_ok()
}
