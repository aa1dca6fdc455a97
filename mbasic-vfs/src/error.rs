//! Store and file error types

use crate::file::Handle;
use thiserror::Error;

/// Result type for host store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for program-facing file operations
pub type FileResult<T> = Result<T, FileError>;

/// Failure reported by a [`HostStore`](crate::HostStore) backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Name cannot be stored by this backend
    #[error("Invalid file name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Backend I/O failure
    #[error("IO error: {message}")]
    Io { message: String },

    /// Shared state lock was poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io {
            message: err.to_string(),
        }
    }
}

/// Failure of a program-facing file operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileError {
    /// Input open of an absent name, rename of an absent name, or an open
    /// refused by a host hook
    #[error("File not found: {name}")]
    NotFound { name: String },

    /// Handle is not (or no longer) open
    #[error("Bad file handle: {0}")]
    BadHandle(Handle),

    /// Record numbers start at 1
    #[error("Bad record number: {record}")]
    BadRecord { record: u64 },

    /// Zero-length records cannot be addressed
    #[error("Bad record length: {length}")]
    BadRecordLength { length: usize },

    /// A raw window would end past the largest supported file
    #[error("File too large: {length} bytes")]
    TooLarge { length: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = FileError::NotFound {
            name: "A.DAT".into(),
        };
        assert_eq!(err.to_string(), "File not found: A.DAT");
        assert_eq!(FileError::BadRecord { record: 0 }.to_string(), "Bad record number: 0");
    }

    #[test]
    fn test_store_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: FileError = StoreError::from(io).into();
        assert!(matches!(err, FileError::Store(StoreError::Io { .. })));
        assert!(err.to_string().contains("disk gone"));
    }
}
