//! Packed object storage behind the backend trait.

use std::path::Path;

use lode_pack::PackManager;
use lode_types::{ObjectHeader, ObjectId, RawObject};

use crate::backend::Backend;
use crate::error::{OdbError, OdbResult};

/// Read-only backend over every pack in an object directory.
///
/// Writes stay declined; new objects land loose and are packed by
/// maintenance tooling, never by the database itself.
pub struct PackBackend {
    packs: PackManager,
}

impl PackBackend {
    /// Open the packed backend over an object directory.
    ///
    /// Declines (`None`) when the directory does not exist. An existing
    /// directory without packs is a valid, empty backend.
    pub fn open(objects_dir: &Path) -> Option<Self> {
        if !objects_dir.is_dir() {
            return None;
        }
        match PackManager::load(objects_dir) {
            Ok(packs) => Some(Self { packs }),
            Err(e) => {
                tracing::warn!("packed backend unavailable: {e}");
                None
            }
        }
    }

    /// Number of packs behind this backend.
    pub fn pack_count(&self) -> usize {
        self.packs.pack_count()
    }
}

impl Backend for PackBackend {
    fn read(&self, id: &ObjectId) -> OdbResult<RawObject> {
        self.packs.read(id)?.ok_or(OdbError::NotFound(*id))
    }

    fn exists(&self, id: &ObjectId) -> bool {
        self.packs.contains(id)
    }

    fn read_header(&self, id: &ObjectId) -> OdbResult<ObjectHeader> {
        self.packs.read_header(id)?.ok_or(OdbError::NotFound(*id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lode_pack::PackWriter;
    use lode_types::ObjectKind;

    #[test]
    fn declines_missing_directory() {
        assert!(PackBackend::open(Path::new("/nonexistent/objects")).is_none());
    }

    #[test]
    fn empty_directory_is_a_valid_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = PackBackend::open(dir.path()).unwrap();
        assert_eq!(backend.pack_count(), 0);
        let id = ObjectId::from_raw([1; 20]);
        assert!(matches!(backend.read(&id), Err(OdbError::NotFound(_))));
    }

    #[test]
    fn reads_packed_objects() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = PackWriter::new();
        let obj = RawObject::new(ObjectKind::Commit, b"packed commit".to_vec());
        let id = writer.add_object(obj.clone()).unwrap();
        writer.write_to(&dir.path().join("pack")).unwrap();

        let backend = PackBackend::open(dir.path()).unwrap();
        assert!(backend.exists(&id));
        assert_eq!(backend.read(&id).unwrap(), obj);
        let header = backend.read_header(&id).unwrap();
        assert_eq!(header.kind, ObjectKind::Commit);
        assert_eq!(header.len, obj.len());
    }

    #[test]
    fn writes_stay_declined() {
        let dir = tempfile::tempdir().unwrap();
        let backend = PackBackend::open(dir.path()).unwrap();
        let obj = RawObject::new(ObjectKind::Blob, b"x".to_vec());
        assert!(matches!(backend.write(&obj), Err(OdbError::Unsupported)));
    }
}
