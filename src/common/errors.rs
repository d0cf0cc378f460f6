use std::path::{Path, PathBuf};

use crate::upstream::SyncOutcome;

/// Typed errors for import operations.
/// The binary wraps these in `anyhow` for top-level reporting,
/// but library functions return them so callers can match on the failure.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Launched from somewhere other than `<project root>/util`
    #[error(
        "must be executed from within <project root>/util (current directory: '{}'). \
         Pass --root to run from elsewhere.",
        .cwd.display()
    )]
    WrongWorkingDir { cwd: PathBuf },

    /// File system operation failed
    #[error("I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Destination resolves to a path we must never clean or overwrite
    #[error("refusing to modify protected path: '{}' ({reason})", .path.display())]
    ProtectedPath { path: PathBuf, reason: String },

    /// The upstream library folder to copy from does not exist
    #[error(
        "upstream library folder not found: '{}'. Run `propimport fetch` with git available first.",
        .path.display()
    )]
    MissingUpstream { path: PathBuf },

    /// Clone or pull failed and no earlier clone exists to fall back on
    #[error("{}", .outcome.diagnostics().join("\n"))]
    UpstreamUnavailable {
        outcome: SyncOutcome,
        #[source]
        source: Box<ImportError>,
    },

    /// Settings file is unreadable or invalid
    #[error("config error in '{}': {message}", .path.display())]
    Config { path: PathBuf, message: String },

    /// Directory traversal failed
    #[error("failed to walk directory tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// An assembly-source glob in the settings is malformed
    #[error("invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

impl ImportError {
    /// Build a closure that attaches `path` to an I/O error,
    /// for use with `map_err`.
    pub fn io(path: &Path) -> impl FnOnce(std::io::Error) -> ImportError + '_ {
        move |source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
