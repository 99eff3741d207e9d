use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Failures reported by a [`super::MacroStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// A macro with that name already exists.
    #[error("macro file '{path}' already exists")]
    AlreadyExists {
        /// Existing file.
        path: Utf8PathBuf,
    },
    /// No macro exists at the path.
    #[error("macro file '{path}' not found")]
    NotFound {
        /// Missing file.
        path: Utf8PathBuf,
    },
    /// The path points outside the macro directory.
    #[error("macro path '{path}' is outside the macro directory '{root}'")]
    OutsideMacroDir {
        /// Rejected path.
        path: Utf8PathBuf,
        /// Configured macro directory.
        root: Utf8PathBuf,
    },
    /// The resolved path is not valid UTF-8.
    #[error("macro path '{path}' is not valid UTF-8")]
    NonUtf8Path {
        /// Lossy rendering of the path.
        path: String,
    },
    /// Filesystem access failed.
    #[error("failed to access macro file '{path}': {source}")]
    Io {
        /// File or directory being accessed.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }
}
