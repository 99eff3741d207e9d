//! Request framing, parsing and command dispatch.
//!
//! Clients send one JSON request per line:
//!
//! ```json
//! {"version":1,"type":"set_view","params":{"view_type":"7"}}
//! ```
//!
//! and receive exactly one response line, a [`CommandResponse`] envelope.
//! Unknown commands, bad params and handler failures all come
//! back as error envelopes; the connection stays open.

mod errors;
mod framing;
mod handlers;
mod request;
mod response;
mod router;

pub use self::errors::{DispatchError, ErrorKind};
pub use self::framing::next_frame;
pub use self::request::{CommandKind, CommandRequest};
pub use self::response::{CommandResponse, PROTOCOL_VERSION};
pub use self::router::CommandRouter;
