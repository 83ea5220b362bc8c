use crate::kind::ObjectKind;

/// Errors from constructing or hashing core value types.
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    /// A hex string could not be decoded.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// A decoded id had the wrong byte length.
    #[error("invalid id length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// The kind cannot be stored (and therefore hashed) as a standalone
    /// object. Only commits, trees, blobs and tags are loose-representable.
    #[error("kind {0:?} is not a loose object kind")]
    NotLoose(ObjectKind),
}

/// Result alias for core type operations.
pub type TypeResult<T> = Result<T, TypeError>;
