//! Host operations that run inside bridge tasks.
//!
//! These functions execute on the application thread and receive the runtime
//! directly; handlers wrap them in [`ExecutorBridge::submit`].
//!
//! [`ExecutorBridge::submit`]: super::ExecutorBridge::submit

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::runtime::{ApplicationRuntime, ExecutionFailure, Namespace, RuntimeError, ViewKind};

/// Result of running macro code against a document.
///
/// A macro may switch or create documents while it runs; the outcome then
/// describes the document that is active once it returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    /// Document active after the code ran.
    pub document: String,
    /// Artifacts in that document that were absent from the starting
    /// document before the run, sorted.
    pub affected_objects: Vec<String>,
}

/// Failure of an operation on the application thread.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OperationError {
    /// Macro code raised.
    #[error(transparent)]
    Failure(#[from] ExecutionFailure),
    /// The host refused the operation.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Runs `code` against `target`, the active document, or a fresh
/// `default_document`, in that order of preference.
pub fn execute_in_document(
    runtime: &mut dyn ApplicationRuntime,
    code: &str,
    params: Map<String, Value>,
    default_document: &str,
    target: Option<&str>,
) -> Result<ExecutionOutcome, OperationError> {
    if !runtime.gui_up() {
        return Err(RuntimeError::GuiUnavailable.into());
    }
    let document = match target {
        Some(name) => {
            runtime.open_document(name)?;
            name.to_owned()
        }
        None => match runtime.active_document() {
            Some(active) => active,
            None => runtime.create_document(default_document)?,
        },
    };
    run_and_diff(runtime, code, document, params)
}

/// Runs `code` in a throwaway document and returns the artifacts it created.
///
/// The scratch document is always closed and the previously active document
/// re-opened, whether or not the code succeeded.
pub fn validate_in_scratch(
    runtime: &mut dyn ApplicationRuntime,
    code: &str,
    scratch_name: &str,
) -> Result<Vec<String>, OperationError> {
    let previous = runtime.active_document();
    let scratch = runtime.create_document(scratch_name)?;
    let outcome = run_and_diff(runtime, code, scratch.clone(), Map::new());
    let closed = runtime.close_document(&scratch);
    let restored = previous.map_or(Ok(()), |name| runtime.open_document(&name));

    let outcome = outcome?;
    closed?;
    restored?;
    Ok(outcome.affected_objects)
}

/// Moves the camera of the active view.
pub fn apply_view(
    runtime: &mut dyn ApplicationRuntime,
    kind: ViewKind,
) -> Result<ViewKind, RuntimeError> {
    if !runtime.gui_up() {
        return Err(RuntimeError::GuiUnavailable);
    }
    if !runtime.has_active_view() {
        return Err(RuntimeError::NoActiveView);
    }
    runtime.set_view(kind)?;
    Ok(kind)
}

fn run_and_diff(
    runtime: &mut dyn ApplicationRuntime,
    code: &str,
    document: String,
    params: Map<String, Value>,
) -> Result<ExecutionOutcome, OperationError> {
    let before = runtime.artifact_names(&document)?;
    runtime.execute(code, &Namespace::for_document(document.clone(), params))?;
    let current = runtime.active_document().unwrap_or(document);
    runtime.recompute(&current)?;
    let after = runtime.artifact_names(&current)?;
    let affected_objects = after.difference(&before).cloned().collect();
    Ok(ExecutionOutcome {
        document: current,
        affected_objects,
    })
}
