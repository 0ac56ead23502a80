use std::path::PathBuf;

/// Errors surfaced by the record store.
///
/// A missing record or namespace is never an error: reads return `None` or an
/// empty list, deletes are idempotent.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The storage root (or a namespace directory under it) cannot be read or
    /// created. Everything downstream of this should be skipped.
    #[error("store unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid namespace: {0:?}")]
    InvalidNamespace(String),

    #[error("invalid session key: {0:?}")]
    InvalidSessionKey(String),

    /// A single record could not be read or written.
    #[error("record I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file malformed: {path}: {details}")]
    Config { path: PathBuf, details: String },
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }

    pub(crate) fn unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Unavailable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
