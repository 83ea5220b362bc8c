//! The object database: a priority-ordered stack of backends.

use std::cmp::Reverse;
use std::path::Path;
use std::sync::Arc;

use lode_types::{ObjectHeader, ObjectId, RawObject};

use crate::backend::Backend;
use crate::error::{OdbError, OdbResult};
use crate::loose::LooseBackend;
use crate::pack_backend::PackBackend;

/// Priority-ordered collection of storage backends.
///
/// The database is a pure dispatch layer: it parses nothing, validates
/// nothing and caches nothing. Every operation probes the backends in
/// descending priority order (insertion order breaks ties) and the first
/// backend to succeed wins.
pub struct Odb {
    backends: Vec<Arc<dyn Backend>>,
}

impl Odb {
    /// An empty database with no backends.
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// Open a database over an object directory, composing the default
    /// stack: the loose backend, then the packed backend.
    ///
    /// Either backend silently declines when its on-disk substrate is
    /// absent. An empty database is not an open-time error; reads against
    /// it simply fail with `NotFound`.
    pub fn open(objects_dir: &Path) -> OdbResult<Self> {
        let mut db = Self::new();

        if let Some(loose) = LooseBackend::open(objects_dir) {
            db.add_backend(Arc::new(loose))?;
        } else {
            tracing::debug!("no loose substrate at {:?}", objects_dir);
        }

        if let Some(packed) = PackBackend::open(objects_dir) {
            db.add_backend(Arc::new(packed))?;
        } else {
            tracing::debug!("no packed substrate at {:?}", objects_dir);
        }

        Ok(db)
    }

    /// Add a backend and re-sort the probe order.
    ///
    /// Fails with [`OdbError::Busy`] if this exact backend instance is
    /// already bound.
    pub fn add_backend(&mut self, backend: Arc<dyn Backend>) -> OdbResult<()> {
        if self.backends.iter().any(|b| Arc::ptr_eq(b, &backend)) {
            return Err(OdbError::Busy);
        }
        self.backends.push(backend);
        // Stable sort: equal priorities keep their insertion order.
        self.backends.sort_by_key(|b| Reverse(b.priority()));
        Ok(())
    }

    /// Number of bound backends.
    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Whether any backend contains the object.
    pub fn exists(&self, id: &ObjectId) -> bool {
        self.backends.iter().any(|b| b.exists(id))
    }

    /// Read a whole object from the first backend that has it.
    pub fn read(&self, id: &ObjectId) -> OdbResult<RawObject> {
        let mut hard_error = None;
        for backend in &self.backends {
            match backend.read(id) {
                Ok(obj) => return Ok(obj),
                Err(OdbError::NotFound(_)) => {}
                Err(e) => hard_error = Some(e),
            }
        }
        Err(hard_error.unwrap_or(OdbError::NotFound(*id)))
    }

    /// Read an object's kind and size.
    ///
    /// Probes backends with a header capability first; if none answers,
    /// degrades to a full read and discards the payload.
    pub fn read_header(&self, id: &ObjectId) -> OdbResult<ObjectHeader> {
        for backend in &self.backends {
            if let Ok(header) = backend.read_header(id) {
                return Ok(header);
            }
        }
        // No backend could read only the header; read the whole object and
        // keep just its kind and length.
        let obj = self.read(id)?;
        Ok(obj.header())
    }

    /// Write an object through the first backend that accepts writes.
    pub fn write(&self, obj: &RawObject) -> OdbResult<ObjectId> {
        let mut hard_error = None;
        for backend in &self.backends {
            match backend.write(obj) {
                Ok(id) => return Ok(id),
                Err(OdbError::Unsupported) => {}
                Err(e) => hard_error = Some(e),
            }
        }
        Err(hard_error.unwrap_or(OdbError::NoWritableBackend))
    }
}

impl Default for Odb {
    fn default() -> Self {
        Self::new()
    }
}
