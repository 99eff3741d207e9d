//! Single-consumer task channel feeding the application thread.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::runtime::ApplicationRuntime;

use super::EXECUTOR_TARGET;
use super::cancel::CancellationToken;

const PUMP_INTERVAL: Duration = Duration::from_millis(20);

pub(crate) type Job = Box<dyn FnOnce(&mut dyn ApplicationRuntime) + Send + 'static>;

struct Envelope {
    label: &'static str,
    token: CancellationToken,
    job: Job,
}

/// Producer half of the task channel. Cheap to clone.
#[derive(Clone)]
pub struct TaskQueue {
    sender: Sender<Envelope>,
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("TaskQueue").finish_non_exhaustive()
    }
}

impl TaskQueue {
    /// Enqueues `job`. Fails when the consumer has gone away.
    pub(crate) fn enqueue(
        &self,
        label: &'static str,
        token: CancellationToken,
        job: Job,
    ) -> Result<(), QueueClosed> {
        self.sender
            .send(Envelope { label, token, job })
            .map_err(|_| QueueClosed)
    }
}

/// The consumer has been dropped.
#[derive(Debug, Error)]
#[error("application task queue is closed")]
pub(crate) struct QueueClosed;

/// Consumer half of the task channel, owned by the application thread.
pub struct TaskPump {
    receiver: Receiver<Envelope>,
}

impl fmt::Debug for TaskPump {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("TaskPump").finish_non_exhaustive()
    }
}

/// Creates a connected queue and pump.
#[must_use]
pub fn task_channel() -> (TaskQueue, TaskPump) {
    let (sender, receiver) = mpsc::channel();
    (TaskQueue { sender }, TaskPump { receiver })
}

impl TaskPump {
    /// Runs every task already queued, without blocking.
    ///
    /// Hosts with their own main loop call this from each tick. Returns the
    /// number of tasks that actually ran; cancelled tasks are skipped.
    pub fn run_pending(&self, runtime: &mut dyn ApplicationRuntime) -> usize {
        let mut ran = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) => {
                    if run_envelope(envelope, runtime) {
                        ran += 1;
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return ran,
            }
        }
    }

    fn wait_and_run(
        &self,
        runtime: &mut dyn ApplicationRuntime,
        wait: Duration,
    ) -> Result<(), RecvTimeoutError> {
        let envelope = self.receiver.recv_timeout(wait)?;
        run_envelope(envelope, runtime);
        Ok(())
    }
}

fn run_envelope(envelope: Envelope, runtime: &mut dyn ApplicationRuntime) -> bool {
    let Envelope { label, token, job } = envelope;
    if !token.try_start() {
        warn!(
            target: EXECUTOR_TARGET,
            task = label,
            "skipping task cancelled before it started"
        );
        return false;
    }
    debug!(target: EXECUTOR_TARGET, task = label, "running task");
    job(runtime);
    true
}

/// Handle to a dedicated application thread.
#[derive(Debug)]
pub struct ApplicationThread {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

/// The application thread panicked outside a task.
#[derive(Debug, Error)]
#[error("application thread panicked")]
pub struct ApplicationThreadPanicked;

/// Moves `runtime` onto a new thread that drains `pump` until stopped.
///
/// # Errors
///
/// Returns the spawn error if the thread could not be created.
pub fn spawn_application_thread<R>(pump: TaskPump, runtime: R) -> io::Result<ApplicationThread>
where
    R: ApplicationRuntime + 'static,
{
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    let handle = thread::Builder::new()
        .name("macrobridge-app".to_owned())
        .spawn(move || run_application_loop(&pump, runtime, &flag))?;
    Ok(ApplicationThread {
        shutdown,
        handle: Some(handle),
    })
}

fn run_application_loop<R: ApplicationRuntime>(pump: &TaskPump, mut runtime: R, shutdown: &AtomicBool) {
    info!(target: EXECUTOR_TARGET, "application thread running");
    while !shutdown.load(Ordering::SeqCst) {
        match pump.wait_and_run(&mut runtime, PUMP_INTERVAL) {
            Ok(()) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    info!(target: EXECUTOR_TARGET, "application thread stopped");
}

impl ApplicationThread {
    /// Signals the thread to stop and waits for it.
    ///
    /// A task in progress runs to completion first.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationThreadPanicked`] if the thread panicked.
    pub fn stop(mut self) -> Result<(), ApplicationThreadPanicked> {
        self.shutdown.store(true, Ordering::SeqCst);
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ApplicationThreadPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for ApplicationThread {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}
