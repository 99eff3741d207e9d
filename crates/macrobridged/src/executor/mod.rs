//! Hands host-state work from the network thread to the application thread.
//!
//! The network thread never touches the [`ApplicationRuntime`]. Work is boxed
//! into a task, sent over a single-consumer queue and executed by whichever
//! thread owns the [`TaskPump`]. Callers wait on a single-slot result channel
//! bounded by a timeout.
//!
//! [`ApplicationRuntime`]: crate::runtime::ApplicationRuntime

mod bridge;
mod cancel;
mod operations;
mod queue;

pub use self::bridge::{BridgeError, ExecutorBridge};
pub use self::cancel::CancellationToken;
pub use self::operations::{
    ExecutionOutcome, OperationError, apply_view, execute_in_document, validate_in_scratch,
};
pub use self::queue::{
    ApplicationThread, ApplicationThreadPanicked, TaskPump, TaskQueue, spawn_application_thread,
    task_channel,
};

const EXECUTOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::executor");
