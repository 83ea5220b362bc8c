use lode_types::ObjectId;

/// Errors from object database operations.
#[derive(Debug, thiserror::Error)]
pub enum OdbError {
    /// No backend contains the requested object.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The backend does not implement the requested capability.
    #[error("backend does not support this operation")]
    Unsupported,

    /// The backend instance is already bound to an object database.
    #[error("backend is already bound to an object database")]
    Busy,

    /// A write was requested but no backend can store objects.
    #[error("no backend accepts writes")]
    NoWritableBackend,

    /// The object's on-disk bytes are malformed.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// Identity or kind-table violation from the core types.
    #[error(transparent)]
    Type(#[from] lode_types::TypeError),

    /// Failure in the packfile substrate.
    #[error(transparent)]
    Pack(#[from] lode_pack::PackError),

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for object database operations.
pub type OdbResult<T> = Result<T, OdbError>;
