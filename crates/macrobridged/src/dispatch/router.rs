//! Turns one request frame into one response line.
//!
//! The router parses the frame, resolves the command, runs its handler with
//! panics contained, and records failures in the report log. It never fails:
//! every frame produces exactly one serialized [`CommandResponse`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::context::ServerContext;
use crate::transport::RequestHandler;

use super::errors::DispatchError;
use super::handlers::route;
use super::request::CommandRequest;
use super::response::CommandResponse;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Routes frames to command handlers.
#[derive(Debug, Clone)]
pub struct CommandRouter {
    context: Arc<ServerContext>,
}

impl CommandRouter {
    /// Creates a router over `context`.
    pub fn new(context: Arc<ServerContext>) -> Self {
        Self { context }
    }

    /// Dispatches one frame.
    pub fn dispatch(&self, frame: &[u8]) -> CommandResponse {
        match self.try_dispatch(frame) {
            Ok(result) => CommandResponse::success(result),
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    kind = %error.kind(),
                    %error,
                    "command failed"
                );
                CommandResponse::error(&error)
            }
        }
    }

    fn try_dispatch(&self, frame: &[u8]) -> Result<Value, DispatchError> {
        let request = CommandRequest::parse(frame)?;
        let kind = request.validate()?;
        debug!(target: DISPATCH_TARGET, command = kind.as_str(), "dispatching request");

        let context = self.context.as_ref();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| route(context, kind, &request)))
            .unwrap_or_else(|_| {
                Err(DispatchError::execution(
                    format!("handler for '{kind}' panicked"),
                    None,
                ))
            });
        if let Err(error) = &outcome {
            context.report.append_error(format!("{kind} failed: {error}"));
        }
        outcome
    }
}

impl RequestHandler for CommandRouter {
    fn handle(&self, frame: &[u8]) -> Vec<u8> {
        self.dispatch(frame).to_line()
    }
}
