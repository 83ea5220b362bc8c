/// Errors from reading a working-directory index file.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The file does not start with the index signature.
    #[error("not an index file: bad signature")]
    BadSignature,

    /// The index version is not supported.
    #[error("unsupported index version: {0}")]
    UnsupportedVersion(u32),

    /// The trailing checksum does not match the file contents.
    #[error("index checksum mismatch")]
    ChecksumMismatch,

    /// The entry table or an extension is malformed.
    #[error("corrupt index: {0}")]
    Corrupt(String),

    /// I/O error reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;
