//! Repository discovery, layout and the object pipelines.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use lode_index::Index;
use lode_odb::Odb;
use lode_types::{ObjectId, ObjectKind, RawObject};

use crate::cache::ObjectCache;
use crate::error::{RepoError, RepoResult};
use crate::object::{Object, ObjectHandle};

const GIT_DIR_NAME: &str = ".git";
const OBJECTS_DIR_NAME: &str = "objects";
const INDEX_FILE_NAME: &str = "index";
const HEAD_FILE_NAME: &str = "HEAD";

/// Explicit repository layout for [`Repository::open_with`].
///
/// Only `git_dir` is mandatory; the object directory and index file default
/// to their conventional locations inside it. A repository opened without a
/// `work_tree` is bare.
#[derive(Clone, Debug)]
pub struct RepositoryLayout {
    pub git_dir: PathBuf,
    pub object_directory: Option<PathBuf>,
    pub index_file: Option<PathBuf>,
    pub work_tree: Option<PathBuf>,
}

impl RepositoryLayout {
    /// A layout with every optional path at its default.
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
            object_directory: None,
            index_file: None,
            work_tree: None,
        }
    }
}

pub(crate) struct RepositoryInner {
    path_repository: PathBuf,
    path_odb: PathBuf,
    path_index: Option<PathBuf>,
    path_workdir: Option<PathBuf>,
    is_bare: bool,
    odb: Odb,
    cache: RefCell<ObjectCache>,
    index: RefCell<Option<Rc<Index>>>,
}

/// An opened repository: layout paths, the object database, and the typed
/// object cache.
///
/// The handle is a shared reference; clones see the same cache and
/// database. A repository handle is single-threaded -- callers wanting
/// parallelism open one handle per thread.
#[derive(Clone)]
pub struct Repository {
    inner: Rc<RepositoryInner>,
}

impl Repository {
    /// Open a repository by inspecting a directory's structure.
    ///
    /// The directory must contain an `objects/` directory and a `HEAD`
    /// file. A final path component of `.git` classifies the repository as
    /// non-bare, with the working directory one level up and the index at
    /// its conventional place; any other name means bare.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref();
        let not_a_repo = || RepoError::NotARepository(path.to_path_buf());

        if !path.is_dir() {
            return Err(not_a_repo());
        }

        let path_odb = path.join(OBJECTS_DIR_NAME);
        if !path_odb.is_dir() {
            return Err(not_a_repo());
        }
        if !path.join(HEAD_FILE_NAME).exists() {
            return Err(not_a_repo());
        }

        let is_git_dir = path
            .file_name()
            .map(|name| name == GIT_DIR_NAME)
            .unwrap_or(false);

        let (path_index, path_workdir) = if is_git_dir {
            (
                Some(path.join(INDEX_FILE_NAME)),
                Some(path.parent().unwrap_or(path).to_path_buf()),
            )
        } else {
            (None, None)
        };

        Self::assemble(
            path.to_path_buf(),
            path_odb,
            path_index,
            path_workdir,
            !is_git_dir,
        )
    }

    /// Open a repository from explicit paths; no layout heuristics apply.
    ///
    /// Violated path requirements surface as [`RepoError::NotFound`].
    pub fn open_with(layout: RepositoryLayout) -> RepoResult<Self> {
        let git_dir = layout.git_dir;
        if !git_dir.is_dir() {
            return Err(RepoError::NotFound(git_dir));
        }

        let path_odb = layout
            .object_directory
            .unwrap_or_else(|| git_dir.join(OBJECTS_DIR_NAME));
        if !path_odb.is_dir() {
            return Err(RepoError::NotFound(path_odb));
        }

        let path_index = layout
            .index_file
            .unwrap_or_else(|| git_dir.join(INDEX_FILE_NAME));
        if !path_index.exists() {
            return Err(RepoError::NotFound(path_index));
        }

        let is_bare = layout.work_tree.is_none();
        Self::assemble(git_dir, path_odb, Some(path_index), layout.work_tree, is_bare)
    }

    fn assemble(
        path_repository: PathBuf,
        path_odb: PathBuf,
        path_index: Option<PathBuf>,
        path_workdir: Option<PathBuf>,
        is_bare: bool,
    ) -> RepoResult<Self> {
        let odb = Odb::open(&path_odb)?;
        tracing::debug!(
            repository = %path_repository.display(),
            bare = is_bare,
            backends = odb.backend_count(),
            "opened repository"
        );

        Ok(Self {
            inner: Rc::new(RepositoryInner {
                path_repository,
                path_odb,
                path_index,
                path_workdir,
                is_bare,
                odb,
                cache: RefCell::new(ObjectCache::new()),
                index: RefCell::new(None),
            }),
        })
    }

    pub(crate) fn from_inner(inner: Rc<RepositoryInner>) -> Self {
        Self { inner }
    }

    /// The repository directory itself.
    pub fn path(&self) -> &Path {
        &self.inner.path_repository
    }

    /// The object directory the database is rooted at.
    pub fn objects_path(&self) -> &Path {
        &self.inner.path_odb
    }

    /// The index file location, if the layout has one.
    pub fn index_path(&self) -> Option<&Path> {
        self.inner.path_index.as_deref()
    }

    /// The working directory, absent for bare repositories.
    pub fn workdir(&self) -> Option<&Path> {
        self.inner.path_workdir.as_deref()
    }

    /// Whether the repository has no working tree.
    pub fn is_bare(&self) -> bool {
        self.inner.is_bare
    }

    /// The underlying object database.
    pub fn odb(&self) -> &Odb {
        &self.inner.odb
    }

    /// Number of objects currently held by the cache.
    pub fn cached_objects(&self) -> usize {
        self.inner.cache.borrow().len()
    }

    /// The working-directory index, materialized on first use.
    ///
    /// Returns `None` for layouts without an index path and when the file
    /// cannot be read; open failures are not propagated.
    pub fn index(&self) -> Option<Rc<Index>> {
        let path = self.inner.path_index.as_ref()?;
        let mut slot = self.inner.index.borrow_mut();
        if slot.is_none() {
            match Index::open(path) {
                Ok(index) => *slot = Some(Rc::new(index)),
                Err(e) => {
                    tracing::debug!(path = %path.display(), "index unavailable: {e}");
                    return None;
                }
            }
        }
        slot.clone()
    }

    /// Fetch the object named by `id`, parsing and caching it on first
    /// access.
    ///
    /// A cache hit returns the shared instance directly, without a kind
    /// check (the kind was fixed when the object was first materialized).
    /// On a miss, `expected` (when set) is checked against the stored kind
    /// before the object is parsed.
    pub fn lookup(
        &self,
        id: &ObjectId,
        expected: Option<ObjectKind>,
    ) -> RepoResult<ObjectHandle> {
        if let Some(hit) = self.inner.cache.borrow().get(id) {
            return Ok(hit);
        }

        let raw = self.inner.odb.read(id)?;
        if let Some(expected) = expected {
            if expected != raw.kind {
                return Err(RepoError::KindMismatch {
                    id: *id,
                    expected,
                    actual: raw.kind,
                });
            }
        }

        let object = Object::from_raw(Rc::downgrade(&self.inner), *id, raw)?;
        let handle = Rc::new(RefCell::new(object));
        self.inner.cache.borrow_mut().insert(*id, handle.clone());
        Ok(handle)
    }

    /// Create a new, never-written object of the given kind.
    ///
    /// The object has no digest and is not cached until its first
    /// successful write. Only the four loose kinds are constructible.
    pub fn new_object(&self, kind: ObjectKind) -> RepoResult<ObjectHandle> {
        let object = Object::new_in_memory(Rc::downgrade(&self.inner), kind)?;
        Ok(Rc::new(RefCell::new(object)))
    }

    /// Serialize a modified object, store it, and rebind the cache under
    /// its new digest.
    ///
    /// A clean object is a no-op success. A serializer failure leaves the
    /// object exactly as it was: still modified, still bound under its old
    /// digest if it had one.
    pub fn write_object(&self, handle: &ObjectHandle) -> RepoResult<ObjectId> {
        let mut object = handle.borrow_mut();
        if !object.modified {
            return Ok(object.id);
        }

        object.serialize_into_source()?;

        let raw = RawObject::new(object.kind(), object.source.take_written());
        let new_id = self.inner.odb.write(&raw)?;

        let old_binding = (!object.in_memory).then_some(object.id);
        object.id = new_id;
        object.modified = false;
        object.in_memory = false;
        object.source.close();
        drop(object);

        let mut cache = self.inner.cache.borrow_mut();
        if let Some(old_id) = old_binding {
            cache.remove(&old_id);
        }
        cache.insert(new_id, handle.clone());

        Ok(new_id)
    }

    /// Drop the cache binding for a digest.
    ///
    /// Outstanding handles stay usable; the next lookup of the digest
    /// materializes a fresh instance.
    pub fn evict(&self, id: &ObjectId) -> bool {
        self.inner.cache.borrow_mut().remove(id).is_some()
    }

    /// Fetch a commit.
    pub fn lookup_commit(&self, id: &ObjectId) -> RepoResult<ObjectHandle> {
        self.lookup(id, Some(ObjectKind::Commit))
    }

    /// Fetch a tree.
    pub fn lookup_tree(&self, id: &ObjectId) -> RepoResult<ObjectHandle> {
        self.lookup(id, Some(ObjectKind::Tree))
    }

    /// Fetch a blob.
    pub fn lookup_blob(&self, id: &ObjectId) -> RepoResult<ObjectHandle> {
        self.lookup(id, Some(ObjectKind::Blob))
    }

    /// Fetch a tag.
    pub fn lookup_tag(&self, id: &ObjectId) -> RepoResult<ObjectHandle> {
        self.lookup(id, Some(ObjectKind::Tag))
    }

    /// Create a new commit object.
    pub fn new_commit(&self) -> RepoResult<ObjectHandle> {
        self.new_object(ObjectKind::Commit)
    }

    /// Create a new tree object.
    pub fn new_tree(&self) -> RepoResult<ObjectHandle> {
        self.new_object(ObjectKind::Tree)
    }

    /// Create a new blob object.
    pub fn new_blob(&self) -> RepoResult<ObjectHandle> {
        self.new_object(ObjectKind::Blob)
    }

    /// Create a new tag object.
    pub fn new_tag(&self) -> RepoResult<ObjectHandle> {
        self.new_object(ObjectKind::Tag)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.inner.path_repository)
            .field("bare", &self.inner.is_bare)
            .field("cached", &self.cached_objects())
            .finish()
    }
}
