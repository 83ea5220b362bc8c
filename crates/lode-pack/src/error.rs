use thiserror::Error;
use lode_types::{ObjectId, ObjectKind};

#[derive(Debug, Error)]
pub enum PackError {
    #[error("invalid pack magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported pack version: {0}")]
    UnsupportedVersion(u32),

    #[error("pack checksum mismatch")]
    ChecksumMismatch,

    #[error("corrupt pack entry at offset {offset}: {reason}")]
    CorruptEntry { offset: u64, reason: String },

    #[error("CRC32 mismatch for object {0}")]
    CrcMismatch(ObjectId),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("delta base not found: {0}")]
    DeltaBaseNotFound(ObjectId),

    #[error("delta chain deeper than {0} links")]
    DeltaChainTooDeep(usize),

    #[error("corrupt delta: {0}")]
    CorruptDelta(String),

    #[error("kind {0:?} cannot be packed standalone")]
    UnpackableKind(ObjectKind),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index corrupted: {0}")]
    IndexCorrupted(String),
}

pub type PackResult<T> = Result<T, PackError>;
