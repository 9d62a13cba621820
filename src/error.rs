//! Error types for the runrar crate.

use thiserror::Error;

/// The archive bytes do not describe a structure this reader understands.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The first block is not the RAR marker.
    #[error("Not a valid RAR file: signature {found:02x?} does not match the RAR marker")]
    BadSignature { found: Vec<u8> },

    /// A block carries a type tag outside marker, archive, file and end.
    #[error("Unsupported block type {tag:#04x} at offset {offset}")]
    UnsupportedBlockType { tag: u8, offset: u64 },

    /// A file block names a host OS outside the known table.
    #[error("Unknown host OS index {index} in file block at offset {offset}")]
    UnknownHostOs { index: u8, offset: u64 },

    /// Header fields contradict each other or the stream length.
    #[error("Inconsistent header at offset {offset}: {reason}")]
    InconsistentHeader { offset: u64, reason: String },
}

/// The primary error type for all library operations.
#[derive(Debug, Error)]
pub enum RarError {
    /// A read from the underlying source failed, including a stream that
    /// ends in the middle of a block.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Format(#[from] FormatError),

    /// No catalog entry carries the requested name.
    #[error("That file does not exist: {name}")]
    NotFound { name: String },

    /// A catalog id past the last entry.
    #[error("No entry with id {index} (catalog holds {count} entries)")]
    NoSuchIndex { index: usize, count: usize },

    /// Extraction offset beyond the stored payload.
    #[error("Offset {offset} is outside the stored payload of {packed_size} bytes")]
    OutOfRange { offset: u64, packed_size: u64 },

    /// The entry uses a feature whose bytes this reader cannot interpret.
    #[error("{name}: {feature} is not supported")]
    Unsupported { name: String, feature: &'static str },
}

impl RarError {
    /// True for errors a caller can recover from by choosing another entry
    /// or range.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::NoSuchIndex { .. }
                | Self::OutOfRange { .. }
                | Self::Unsupported { .. }
        )
    }
}

/// A convenience `Result` type alias using the crate's `RarError` type.
pub type Result<T> = std::result::Result<T, RarError>;
