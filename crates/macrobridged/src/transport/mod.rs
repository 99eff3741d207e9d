//! TCP transport: listener, connection registry and poll loop.
//!
//! A single poll thread owns the listener and every connection. Each tick it
//! accepts pending clients (closing those beyond the client cap), reads what
//! is available, dispatches complete frames through a [`RequestHandler`], and
//! drops idle connections.

mod connection;
mod errors;
mod handler;
mod listener;
mod poll;
mod registry;
mod server;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub use self::handler::RequestHandler;
pub use self::server::{CommandServer, ServerLimits};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
