use std::path::PathBuf;

use lode_types::{ObjectId, ObjectKind};

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// The path failed the structural repository check.
    #[error("not a repository: {0}")]
    NotARepository(PathBuf),

    /// An explicitly configured path does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// A lookup asked for one kind and the stored object is another.
    #[error("object {id} is a {actual}, expected {expected}")]
    KindMismatch {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// Only the four loose kinds can be constructed as objects.
    #[error("cannot create standalone {0:?} objects")]
    UnsupportedKind(ObjectKind),

    /// An object's bytes do not parse as its kind.
    #[error("cannot parse {kind} object: {reason}")]
    Parse { kind: ObjectKind, reason: String },

    /// An object is missing fields its serialization requires.
    #[error("object is incomplete: missing {0}")]
    Incomplete(&'static str),

    /// Failure in the object database.
    #[error(transparent)]
    Odb(#[from] lode_odb::OdbError),

    /// Identity or kind-table violation from the core types.
    #[error(transparent)]
    Type(#[from] lode_types::TypeError),

    /// I/O error outside the object database.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepoError {
    /// Whether this error means "the object does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Odb(lode_odb::OdbError::NotFound(_)))
    }
}

/// Result alias for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;
