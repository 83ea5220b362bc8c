//! The typed object envelope.
//!
//! Every materialized object is one of four payloads wrapped in a common
//! header: the owning repository, the content id, the source slot, and two
//! lifecycle flags. `in_memory` is set from creation until the first
//! successful write gives the object a digest; `modified` is set whenever
//! the in-memory state diverges from whatever the digest names.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use lode_types::{ObjectId, ObjectKind};

use crate::blob::Blob;
use crate::commit::Commit;
use crate::error::{RepoError, RepoResult};
use crate::repository::{Repository, RepositoryInner};
use crate::source::Source;
use crate::tag::Tag;
use crate::tree::Tree;

/// Shared handle to a cached object.
///
/// Handles obtained from lookups all point at the same instance; the cache
/// holds one of the references, clients hold the rest.
pub type ObjectHandle = Rc<RefCell<Object>>;

/// Kind-tagged object contents.
#[derive(Debug)]
pub(crate) enum Payload {
    Commit(Commit),
    Tree(Tree),
    Blob(Blob),
    Tag(Tag),
}

impl Payload {
    /// A zero-valued payload of the given kind. Only the four loose kinds
    /// can exist as standalone objects.
    pub fn empty(kind: ObjectKind) -> RepoResult<Self> {
        match kind {
            ObjectKind::Commit => Ok(Self::Commit(Commit::default())),
            ObjectKind::Tree => Ok(Self::Tree(Tree::default())),
            ObjectKind::Blob => Ok(Self::Blob(Blob::default())),
            ObjectKind::Tag => Ok(Self::Tag(Tag::default())),
            other => Err(RepoError::UnsupportedKind(other)),
        }
    }

    /// Parse raw bytes as the given kind.
    pub fn parse(kind: ObjectKind, data: &[u8]) -> RepoResult<Self> {
        match kind {
            ObjectKind::Commit => Ok(Self::Commit(Commit::parse(data)?)),
            ObjectKind::Tree => Ok(Self::Tree(Tree::parse(data)?)),
            ObjectKind::Blob => Ok(Self::Blob(Blob::parse(data)?)),
            ObjectKind::Tag => Ok(Self::Tag(Tag::parse(data)?)),
            other => Err(RepoError::UnsupportedKind(other)),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Commit(_) => ObjectKind::Commit,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tag(_) => ObjectKind::Tag,
        }
    }

    /// Dispatch to the kind-specific serializer.
    pub fn serialize(&self, buf: &mut crate::source::WriteBuffer) -> RepoResult<()> {
        match self {
            Self::Commit(c) => c.serialize(buf),
            Self::Tree(t) => t.serialize(buf),
            Self::Blob(b) => b.serialize(buf),
            Self::Tag(t) => t.serialize(buf),
        }
    }
}

/// A typed, cached object.
pub struct Object {
    pub(crate) repo: Weak<RepositoryInner>,
    pub(crate) id: ObjectId,
    pub(crate) in_memory: bool,
    pub(crate) modified: bool,
    pub(crate) source: Source,
    pub(crate) payload: Payload,
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("kind", &self.kind())
            .field("id", &self.id())
            .field("in_memory", &self.in_memory)
            .field("modified", &self.modified)
            .finish()
    }
}

impl Object {
    /// A brand-new object that has never been written: no digest, dirty.
    pub(crate) fn new_in_memory(
        repo: Weak<RepositoryInner>,
        kind: ObjectKind,
    ) -> RepoResult<Self> {
        Ok(Self {
            repo,
            id: ObjectId::null(),
            in_memory: true,
            modified: true,
            source: Source::for_kind(kind),
            payload: Payload::empty(kind)?,
        })
    }

    /// Materialize an object from raw database bytes: install the bytes in
    /// the source slot, parse, then release the slot.
    pub(crate) fn from_raw(
        repo: Weak<RepositoryInner>,
        id: ObjectId,
        raw: lode_types::RawObject,
    ) -> RepoResult<Self> {
        let kind = raw.kind;
        let mut source = Source::open_read(raw);
        let payload = Payload::parse(kind, source.bytes())?;
        source.close();

        Ok(Self {
            repo,
            id,
            in_memory: false,
            modified: false,
            source,
            payload,
        })
    }

    /// The object's digest, or `None` while it only exists in memory.
    pub fn id(&self) -> Option<ObjectId> {
        if self.in_memory {
            None
        } else {
            Some(self.id)
        }
    }

    /// The object's kind, fixed at materialization.
    pub fn kind(&self) -> ObjectKind {
        self.source.kind()
    }

    /// Whether the in-memory state diverges from the stored digest.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Whether the object has never been written to the database.
    pub fn is_in_memory(&self) -> bool {
        self.in_memory
    }

    /// The repository this object belongs to, while it is still alive.
    pub fn owner(&self) -> Option<Repository> {
        self.repo.upgrade().map(Repository::from_inner)
    }

    /// Read access to a commit payload.
    pub fn as_commit(&self) -> Option<&Commit> {
        match &self.payload {
            Payload::Commit(c) => Some(c),
            _ => None,
        }
    }

    /// Write access to a commit payload; marks the object modified.
    pub fn as_commit_mut(&mut self) -> Option<&mut Commit> {
        match &mut self.payload {
            Payload::Commit(c) => {
                self.modified = true;
                Some(c)
            }
            _ => None,
        }
    }

    /// Read access to a tree payload.
    pub fn as_tree(&self) -> Option<&Tree> {
        match &self.payload {
            Payload::Tree(t) => Some(t),
            _ => None,
        }
    }

    /// Write access to a tree payload; marks the object modified.
    pub fn as_tree_mut(&mut self) -> Option<&mut Tree> {
        match &mut self.payload {
            Payload::Tree(t) => {
                self.modified = true;
                Some(t)
            }
            _ => None,
        }
    }

    /// Read access to a blob payload.
    pub fn as_blob(&self) -> Option<&Blob> {
        match &self.payload {
            Payload::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Write access to a blob payload; marks the object modified.
    pub fn as_blob_mut(&mut self) -> Option<&mut Blob> {
        match &mut self.payload {
            Payload::Blob(b) => {
                self.modified = true;
                Some(b)
            }
            _ => None,
        }
    }

    /// Read access to a tag payload.
    pub fn as_tag(&self) -> Option<&Tag> {
        match &self.payload {
            Payload::Tag(t) => Some(t),
            _ => None,
        }
    }

    /// Write access to a tag payload; marks the object modified.
    pub fn as_tag_mut(&mut self) -> Option<&mut Tag> {
        match &mut self.payload {
            Payload::Tag(t) => {
                self.modified = true;
                Some(t)
            }
            _ => None,
        }
    }

    /// Run the kind-specific serializer into a freshly prepared source
    /// slot. On failure the slot is closed and the object is untouched.
    pub(crate) fn serialize_into_source(&mut self) -> RepoResult<()> {
        self.source.prepare_write(self.payload.kind());
        let Self {
            payload, source, ..
        } = self;
        match payload.serialize(source.writer()) {
            Ok(()) => Ok(()),
            Err(e) => {
                source.close();
                Err(e)
            }
        }
    }
}
