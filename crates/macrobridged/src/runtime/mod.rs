//! Seam between the command server and the host application.
//!
//! Everything that touches host state goes through [`ApplicationRuntime`],
//! and only ever on the application thread. The server ships with
//! [`SimulatedRuntime`], an in-memory host used by the stand-alone binary and
//! the test suites.

mod errors;
mod namespace;
mod simulated;
mod view;

use std::collections::BTreeSet;

pub use self::errors::{ExecutionFailure, RuntimeError};
pub use self::namespace::{Binding, Namespace};
pub use self::simulated::SimulatedRuntime;
pub use self::view::ViewKind;

/// Host application operations available to command handlers.
///
/// Implementations are owned by the application thread and are never shared
/// with the network thread.
pub trait ApplicationRuntime: Send {
    /// Whether the host GUI has finished initialising.
    fn gui_up(&self) -> bool;

    /// Name of the active document, if any.
    fn active_document(&self) -> Option<String>;

    /// Creates a document, makes it active and returns its final name.
    ///
    /// Hosts may adjust the name to keep it unique.
    fn create_document(&mut self, name: &str) -> Result<String, RuntimeError>;

    /// Makes an existing document active.
    fn open_document(&mut self, name: &str) -> Result<(), RuntimeError>;

    /// Closes a document, discarding its contents.
    fn close_document(&mut self, name: &str) -> Result<(), RuntimeError>;

    /// Names of every artifact in `document`.
    fn artifact_names(&self, document: &str) -> Result<BTreeSet<String>, RuntimeError>;

    /// Recomputes `document`.
    fn recompute(&mut self, document: &str) -> Result<(), RuntimeError>;

    /// Executes macro `code` against the bindings in `namespace`.
    fn execute(&mut self, code: &str, namespace: &Namespace) -> Result<(), ExecutionFailure>;

    /// Whether the active document has a 3D view.
    fn has_active_view(&self) -> bool;

    /// Moves the camera of the active view and fits the scene.
    fn set_view(&mut self, kind: ViewKind) -> Result<(), RuntimeError>;
}
