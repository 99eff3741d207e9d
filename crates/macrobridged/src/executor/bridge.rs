use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::runtime::ApplicationRuntime;

use super::EXECUTOR_TARGET;
use super::cancel::CancellationToken;
use super::queue::TaskQueue;

/// Failures of the hand-off itself, as opposed to failures of the task.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The task did not complete within its budget.
    #[error("'{label}' did not complete within {} ms", timeout.as_millis())]
    Timeout {
        /// Task label.
        label: &'static str,
        /// Budget that elapsed.
        timeout: Duration,
    },
    /// The application thread is not accepting work.
    #[error("application thread is unavailable for '{label}'")]
    Unavailable {
        /// Task label.
        label: &'static str,
    },
    /// The task panicked on the application thread.
    #[error("'{label}' panicked: {message}")]
    TaskPanicked {
        /// Task label.
        label: &'static str,
        /// Panic payload, when it was a string.
        message: String,
    },
}

/// Submits work to the application thread and waits for it.
#[derive(Debug, Clone)]
pub struct ExecutorBridge {
    queue: TaskQueue,
}

impl ExecutorBridge {
    /// Wraps the producer side of a task channel.
    #[must_use]
    pub fn new(queue: TaskQueue) -> Self {
        Self { queue }
    }

    /// Runs `task` on the application thread, waiting at most `timeout`.
    ///
    /// On timeout the task is cancelled: if it has not started it never
    /// runs, otherwise its eventual result is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError`] when the task times out, panics, or cannot be
    /// queued.
    pub fn submit<T, F>(
        &self,
        label: &'static str,
        timeout: Duration,
        task: F,
    ) -> Result<T, BridgeError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn ApplicationRuntime) -> T + Send + 'static,
    {
        let (slot, result) = mpsc::sync_channel::<Result<T, String>>(1);
        let token = CancellationToken::new();
        let job = Box::new(move |runtime: &mut dyn ApplicationRuntime| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(runtime)))
                .map_err(|payload| panic_message(payload.as_ref()));
            if slot.send(outcome).is_err() {
                warn!(
                    target: EXECUTOR_TARGET,
                    task = label,
                    "orphaned completion: caller stopped waiting"
                );
            }
        });
        self.queue
            .enqueue(label, token.clone(), job)
            .map_err(|_| BridgeError::Unavailable { label })?;

        match result.recv_timeout(timeout) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(BridgeError::TaskPanicked { label, message }),
            Err(RecvTimeoutError::Timeout) => {
                let skipped = token.cancel();
                warn!(
                    target: EXECUTOR_TARGET,
                    task = label,
                    timeout_ms = timeout.as_millis(),
                    skipped,
                    "task timed out"
                );
                Err(BridgeError::Timeout { label, timeout })
            }
            Err(RecvTimeoutError::Disconnected) => Err(BridgeError::Unavailable { label }),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
