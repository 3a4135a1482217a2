//! Error types for Burrow engine operations
//!
//! All engine-level failures are represented by the BurrowError enum, which
//! carries enough context to diagnose which file and offset went wrong.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Burrow error types with detailed context
#[derive(Debug, Clone)]
pub enum BurrowError {
    /// I/O operation failed
    Io {
        /// The file path where the error occurred
        path: Option<PathBuf>,
        /// The underlying I/O error kind
        kind: io::ErrorKind,
        /// Human-readable description
        message: String,
    },

    /// A log or snapshot record is structurally invalid
    RecordCorrupted {
        /// Byte offset where corruption was detected
        offset: u64,
        /// Description of the corruption
        reason: String,
    },

    /// Checksum verification failed
    ChecksumMismatch {
        /// Expected checksum value
        expected: u32,
        /// Actual checksum computed
        actual: u32,
        /// Byte offset of the corrupted data
        offset: u64,
    },

    /// Torn write detected (partial record at end of file)
    TornWrite {
        /// Expected record size
        expected_size: u32,
        /// Actual bytes available
        available_bytes: u64,
        /// Offset where the torn record begins
        offset: u64,
    },

    /// Magic bytes not found at expected location
    NoMagicFound {
        /// Offset where magic was expected
        offset: u64,
        /// Bytes actually found
        found_bytes: [u8; 4],
    },

    /// Key or value exceeds the maximum allowed size
    OversizedEntry {
        /// Size of the oversized component
        entry_size: u64,
        /// Maximum allowed size
        max_size: u64,
        /// Whether it's the key or value that's oversized
        component: &'static str,
    },

    /// A key or value failed to encode or decode
    Codec {
        /// Description of the conversion failure
        reason: String,
    },

    /// Operation attempted on an engine that has been closed
    EngineClosed,

    /// Engine configuration failed validation
    InvalidConfig {
        /// Which parameter was out of range
        reason: String,
    },
}

impl fmt::Display for BurrowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BurrowError::Io { path, kind, message } => {
                if let Some(path) = path {
                    write!(f, "I/O error in {}: {} ({})", path.display(), message, kind)
                } else {
                    write!(f, "I/O error: {} ({})", message, kind)
                }
            }

            BurrowError::RecordCorrupted { offset, reason } => {
                write!(f, "Corrupt record at offset {}: {}", offset, reason)
            }

            BurrowError::ChecksumMismatch { expected, actual, offset } => {
                write!(f, "Checksum mismatch at offset {}: expected 0x{:08x}, got 0x{:08x}",
                       offset, expected, actual)
            }

            BurrowError::TornWrite { expected_size, available_bytes, offset } => {
                write!(f, "Torn write at offset {}: expected {} bytes, only {} available",
                       offset, expected_size, available_bytes)
            }

            BurrowError::NoMagicFound { offset, found_bytes } => {
                write!(f, "Magic bytes not found at offset {}: found {:02x}{:02x}{:02x}{:02x}",
                       offset, found_bytes[0], found_bytes[1], found_bytes[2], found_bytes[3])
            }

            BurrowError::OversizedEntry { entry_size, max_size, component } => {
                write!(f, "Entry {} too large: {} bytes exceeds limit of {} bytes",
                       component, entry_size, max_size)
            }

            BurrowError::Codec { reason } => {
                write!(f, "Codec failure: {}", reason)
            }

            BurrowError::EngineClosed => {
                write!(f, "Engine has been closed")
            }

            BurrowError::InvalidConfig { reason } => {
                write!(f, "Invalid engine configuration: {}", reason)
            }
        }
    }
}

impl Error for BurrowError {}

/// Convert std::io::Error to BurrowError::Io
impl From<io::Error> for BurrowError {
    fn from(err: io::Error) -> Self {
        BurrowError::Io {
            path: None,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for Burrow engine operations
pub type BurrowResult<T> = Result<T, BurrowError>;
