//! Persistence for `.FCMacro` files.
//!
//! Handlers talk to a [`MacroStore`]; the default [`DirectoryMacroStore`]
//! keeps one file per macro under the configured macro directory.

mod directory;
mod errors;
mod template;

use camino::{Utf8Path, Utf8PathBuf};
use macrobridge_syntax::MacroName;

pub use self::directory::{DirectoryMacroStore, MACRO_EXTENSION};
pub use self::errors::StoreError;
pub use self::template::TemplateKind;

/// Storage backend for macro source files.
#[cfg_attr(test, mockall::automock)]
pub trait MacroStore: Send + Sync {
    /// Location a macro with `name` is stored at.
    fn path_for(&self, name: &MacroName) -> Utf8PathBuf;

    /// Creates a new macro from `template`. Fails if it already exists.
    fn create(&self, name: &MacroName, template: TemplateKind) -> Result<Utf8PathBuf, StoreError>;

    /// Replaces the code of an existing macro. Fails if it does not exist.
    fn update(&self, name: &MacroName, code: &str) -> Result<Utf8PathBuf, StoreError>;

    /// Reads the code of the named macro.
    fn read(&self, name: &MacroName) -> Result<String, StoreError>;

    /// Reads the macro at a path previously returned by [`MacroStore::resolve`].
    fn read_path(&self, path: &Utf8Path) -> Result<String, StoreError>;

    /// Resolves a client-supplied path to an existing macro inside the store.
    fn resolve(&self, path: &Utf8Path) -> Result<Utf8PathBuf, StoreError>;
}
