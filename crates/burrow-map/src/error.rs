//! Error types for the map adapter layer

use std::error::Error;
use std::fmt;

use burrow_core::BurrowError;

/// Map adapter error types
#[derive(Debug)]
pub enum MapError {
    /// An engine-level failure, wrapping the original cause
    Storage(BurrowError),

    /// The operation is deliberately not part of this map's capability set
    Unsupported {
        /// Name of the rejected operation
        operation: &'static str,
    },

    /// The iterator's look-ahead buffer is empty; nothing remains
    Exhausted,

    /// `create_map` was given a commit threshold of zero
    InvalidCommitThreshold,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Storage(err) => write!(f, "storage failure: {}", err),
            MapError::Unsupported { operation } => {
                write!(f, "operation not supported: {}", operation)
            }
            MapError::Exhausted => write!(f, "iteration exhausted"),
            MapError::InvalidCommitThreshold => {
                write!(f, "commit threshold must be at least 1")
            }
        }
    }
}

impl Error for MapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MapError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BurrowError> for MapError {
    fn from(err: BurrowError) -> Self {
        MapError::Storage(err)
    }
}

/// Result type alias for map adapter operations
pub type MapResult<T> = Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_keeps_cause() {
        let err = MapError::from(BurrowError::EngineClosed);
        assert!(err.source().is_some());
        assert!(format!("{}", err).contains("storage failure"));
    }

    #[test]
    fn test_unsupported_names_operation() {
        let err = MapError::Unsupported { operation: "key_set" };
        assert!(format!("{}", err).contains("key_set"));
    }
}
