//! Multi-pack access for an object directory.

use std::path::{Path, PathBuf};

use lode_types::{ObjectHeader, ObjectId, RawObject};

use crate::error::PackResult;
use crate::reader::PackReader;

/// Manages every pack under an object directory's `pack/` subdirectory.
pub struct PackManager {
    pack_dir: PathBuf,
    packs: Vec<PackReader>,
}

impl PackManager {
    /// Load all pack/index pairs under `<objects_dir>/pack`.
    ///
    /// A missing `pack/` directory is an empty manager, not an error.
    /// Individual corrupt packs are skipped.
    pub fn load(objects_dir: &Path) -> PackResult<Self> {
        let pack_dir = objects_dir.join("pack");
        let mut packs = Vec::new();

        if pack_dir.is_dir() {
            let mut index_paths = Vec::new();
            for entry in std::fs::read_dir(&pack_dir)? {
                let path = entry?.path();
                if path.extension().map(|e| e == "idx").unwrap_or(false) {
                    index_paths.push(path);
                }
            }
            // Deterministic probe order across platforms.
            index_paths.sort();

            for index_path in index_paths {
                let pack_path = index_path.with_extension("pack");
                if !pack_path.is_file() {
                    tracing::warn!("index {:?} has no sibling pack", index_path);
                    continue;
                }
                match PackReader::open(&pack_path) {
                    Ok(reader) => packs.push(reader),
                    Err(e) => {
                        tracing::warn!("skipping corrupt pack {:?}: {}", pack_path, e);
                    }
                }
            }
        }

        Ok(Self { pack_dir, packs })
    }

    /// Read an object from the first pack that contains it.
    pub fn read(&self, id: &ObjectId) -> PackResult<Option<RawObject>> {
        for pack in &self.packs {
            if let Some(obj) = pack.read(id)? {
                return Ok(Some(obj));
            }
        }
        Ok(None)
    }

    /// Read an object's header from the first pack that contains it.
    pub fn read_header(&self, id: &ObjectId) -> PackResult<Option<ObjectHeader>> {
        for pack in &self.packs {
            if let Some(header) = pack.read_header(id)? {
                return Ok(Some(header));
            }
        }
        Ok(None)
    }

    /// Check containment across all packs.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.packs.iter().any(|p| p.contains(id))
    }

    /// Number of loaded packs.
    pub fn pack_count(&self) -> usize {
        self.packs.len()
    }

    /// Total objects across all packs.
    pub fn total_objects(&self) -> usize {
        self.packs.iter().map(|p| p.object_count()).sum()
    }

    /// The directory this manager scans.
    pub fn pack_dir(&self) -> &Path {
        &self.pack_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lode_types::ObjectKind;

    use crate::writer::PackWriter;

    #[test]
    fn missing_pack_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manager = PackManager::load(dir.path()).unwrap();
        assert_eq!(manager.pack_count(), 0);
        assert!(!manager.contains(&ObjectId::null()));
        assert_eq!(manager.read(&ObjectId::null()).unwrap(), None);
    }

    #[test]
    fn reads_across_multiple_packs() {
        let dir = tempfile::tempdir().unwrap();
        let pack_dir = dir.path().join("pack");

        let mut first = PackWriter::new();
        let id_a = first
            .add_object(RawObject::new(ObjectKind::Blob, b"first pack".to_vec()))
            .unwrap();
        first.write_to(&pack_dir).unwrap();

        let mut second = PackWriter::new();
        let id_b = second
            .add_object(RawObject::new(ObjectKind::Tree, b"second pack".to_vec()))
            .unwrap();
        second.write_to(&pack_dir).unwrap();

        let manager = PackManager::load(dir.path()).unwrap();
        assert_eq!(manager.pack_count(), 2);
        assert_eq!(manager.total_objects(), 2);
        assert_eq!(manager.read(&id_a).unwrap().unwrap().data, b"first pack");
        assert_eq!(manager.read(&id_b).unwrap().unwrap().kind, ObjectKind::Tree);
        assert_eq!(
            manager.read_header(&id_b).unwrap().unwrap().len,
            b"second pack".len()
        );
    }

    #[test]
    fn corrupt_pack_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let pack_dir = dir.path().join("pack");

        let mut writer = PackWriter::new();
        let id = writer
            .add_object(RawObject::new(ObjectKind::Blob, b"survivor".to_vec()))
            .unwrap();
        writer.write_to(&pack_dir).unwrap();

        std::fs::write(pack_dir.join("pack-junk.pack"), b"not a pack").unwrap();
        std::fs::write(pack_dir.join("pack-junk.idx"), b"not an index").unwrap();

        let manager = PackManager::load(dir.path()).unwrap();
        assert_eq!(manager.pack_count(), 1);
        assert!(manager.contains(&id));
    }
}
