//! Response envelope and serialization.
//!
//! Every command yields exactly one [`CommandResponse`], serialized as one
//! JSON line:
//!
//! ```json
//! {"version":1,"status":"success","result":{"view_name":"top"}}
//! {"version":1,"status":"error","error":{"kind":"validation","message":"..."}}
//! ```

use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use super::errors::{DispatchError, ErrorKind};

/// Protocol version spoken by this server.
pub const PROTOCOL_VERSION: u32 = 1;

/// Error details carried by an error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

/// The single response sent for each request.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandResponse {
    Success { version: u32, result: Value },
    Error { version: u32, error: ErrorBody },
}

impl CommandResponse {
    /// Wraps a successful result.
    pub fn success(result: Value) -> Self {
        Self::Success {
            version: PROTOCOL_VERSION,
            result,
        }
    }

    /// Wraps a dispatch failure.
    pub fn error(error: &DispatchError) -> Self {
        Self::Error {
            version: PROTOCOL_VERSION,
            error: ErrorBody {
                kind: error.kind(),
                message: error.to_string(),
                traceback: error.traceback().map(str::to_owned),
            },
        }
    }

    /// Serializes to one newline-terminated JSON line.
    ///
    /// Serialization of this enum cannot fail for well-formed `Value`s; should
    /// it fail anyway, a fixed internal-error line is returned.
    pub fn to_line(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        if ResponseWriter::new(&mut buffer).write(self).is_err() {
            buffer = FALLBACK_LINE.to_vec();
        }
        buffer
    }
}

const FALLBACK_LINE: &[u8] = b"{\"version\":1,\"status\":\"error\",\"error\":{\"kind\":\"internal\",\"message\":\"failed to serialize response\"}}\n";

/// Writer that serializes responses to a stream as JSON lines.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Creates a new response writer wrapping the given output stream.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes `response` followed by a newline and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write(&mut self, response: &CommandResponse) -> Result<(), DispatchError> {
        serde_json::to_writer(&mut self.writer, response)?;
        self.writer
            .write_all(b"\n")
            .and_then(|()| self.writer.flush())
            .map_err(|error| DispatchError::internal(error.to_string()))
    }
}
