//! Error types for pkgmeta.

use std::io;
use std::path::PathBuf;

/// Result type alias for pkgmeta operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or expanding package metadata.
///
/// Only [`Error::Io`] aborts a parse call. Expansion failures hit while
/// building a [`Record`](crate::record::Record) are attached to the record as
/// diagnostics instead, see [`Record::check`](crate::record::Record::check).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input could not be opened or read. No record is produced.
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Variable expansion nested deeper than the configured limit, which
    /// happens when a variable refers back to itself directly or indirectly.
    #[error("variable expansion of '{variable}' exceeded the maximum depth of {depth}")]
    RecursionLimitExceeded { variable: String, depth: usize },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means no record could be produced at all.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
