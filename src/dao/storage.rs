use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation. A session
    /// rebuild hitting this error is abandoned without publishing anything.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A stored record could not be mapped back to an entity.
    #[error("corrupt record in `{collection}`: {message}")]
    Corrupt {
        collection: &'static str,
        message: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a corrupt-record error for `collection`.
    pub fn corrupt(collection: &'static str, message: impl Into<String>) -> Self {
        StorageError::Corrupt {
            collection,
            message: message.into(),
        }
    }
}
