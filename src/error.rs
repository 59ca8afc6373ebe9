use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single file's indexing or restore. None of these stop a walk.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The file could not be opened, or its path could not be canonicalized.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The stream failed after it was opened.
    #[error("read failed for {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The store rejected a write or read.
    #[error("store error: {source}")]
    Persistence {
        #[from]
        source: redb::Error,
    },

    /// Stored rows do not reproduce a file.
    #[error("corrupt store: {reason}")]
    Corrupt { reason: String },
}

impl IndexError {
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IndexError::Open {
            path: path.into(),
            source,
        }
    }

    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IndexError::Read {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt(reason: impl Into<String>) -> Self {
        IndexError::Corrupt {
            reason: reason.into(),
        }
    }
}

// redb splits its errors by operation; all of them are persistence failures here.

impl From<redb::TransactionError> for IndexError {
    fn from(err: redb::TransactionError) -> Self {
        IndexError::Persistence { source: err.into() }
    }
}

impl From<redb::TableError> for IndexError {
    fn from(err: redb::TableError) -> Self {
        IndexError::Persistence { source: err.into() }
    }
}

impl From<redb::StorageError> for IndexError {
    fn from(err: redb::StorageError) -> Self {
        IndexError::Persistence { source: err.into() }
    }
}

impl From<redb::CommitError> for IndexError {
    fn from(err: redb::CommitError) -> Self {
        IndexError::Persistence { source: err.into() }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
