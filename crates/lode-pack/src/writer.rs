//! Pack construction.
//!
//! Builds a pack and its version-2 index from complete objects. Entries are
//! written whole (no delta compression); readers resolve deltas, writers do
//! not produce them.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use sha1::{Digest, Sha1};
use lode_types::{ObjectId, RawObject, OBJECT_ID_LEN};

use crate::error::{PackError, PackResult};

const PACK_MAGIC: &[u8; 4] = b"PACK";
const V2_MAGIC: [u8; 4] = [0xff, 0x74, 0x4f, 0x63];

/// Result of writing a pack to disk.
#[derive(Clone, Debug)]
pub struct PackFile {
    pub pack_path: PathBuf,
    pub index_path: PathBuf,
    pub object_count: usize,
    pub checksum: [u8; OBJECT_ID_LEN],
}

/// Builds a pack file from a collection of complete objects.
pub struct PackWriter {
    entries: Vec<(ObjectId, RawObject)>,
}

impl PackWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Queue an object for packing. The id is computed from the object.
    pub fn add_object(&mut self, obj: RawObject) -> PackResult<ObjectId> {
        if !obj.kind.is_loose() {
            return Err(PackError::UnpackableKind(obj.kind));
        }
        let id = obj.id().expect("loose kinds hash");
        if !self.entries.iter().any(|(existing, _)| *existing == id) {
            self.entries.push((id, obj));
        }
        Ok(id)
    }

    /// Number of objects queued.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no objects are queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the pack and its index into byte buffers.
    pub fn finish_to_bytes(self) -> PackResult<(Vec<u8>, Vec<u8>)> {
        let mut pack = Vec::new();
        pack.extend_from_slice(PACK_MAGIC);
        pack.extend_from_slice(&2u32.to_be_bytes());
        pack.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());

        // (id, crc, offset), crc taken over each entry's packed bytes.
        let mut locations = Vec::with_capacity(self.entries.len());
        for (id, obj) in &self.entries {
            let offset = pack.len() as u64;
            let raw_kind = obj.kind.as_raw().expect("loose kinds have raw encodings");
            encode_entry_header(&mut pack, raw_kind, obj.data.len() as u64);

            let mut encoder = ZlibEncoder::new(&mut pack, Compression::default());
            encoder.write_all(&obj.data)?;
            encoder.finish()?;

            let crc = crc32fast::hash(&pack[offset as usize..]);
            locations.push((*id, crc, offset));
        }

        let mut hasher = Sha1::new();
        hasher.update(&pack);
        let checksum: [u8; OBJECT_ID_LEN] = hasher.finalize().into();
        pack.extend_from_slice(&checksum);

        Ok((pack, build_index_bytes(locations, checksum)))
    }

    /// Write `pack-<checksum>.pack` and its `.idx` into a directory.
    pub fn write_to(self, pack_dir: &Path) -> PackResult<PackFile> {
        let object_count = self.entries.len();
        let (pack, index) = self.finish_to_bytes()?;

        let mut checksum = [0u8; OBJECT_ID_LEN];
        checksum.copy_from_slice(&pack[pack.len() - OBJECT_ID_LEN..]);

        std::fs::create_dir_all(pack_dir)?;
        let stem = format!("pack-{}", hex::encode(checksum));
        let pack_path = pack_dir.join(format!("{stem}.pack"));
        let index_path = pack_dir.join(format!("{stem}.idx"));
        std::fs::write(&pack_path, &pack)?;
        std::fs::write(&index_path, &index)?;

        Ok(PackFile {
            pack_path,
            index_path,
            object_count,
            checksum,
        })
    }
}

impl Default for PackWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode the type-and-size varint that opens every pack entry.
fn encode_entry_header(out: &mut Vec<u8>, raw_kind: u8, mut size: u64) {
    let mut byte = (raw_kind << 4) | (size & 0x0f) as u8;
    size >>= 4;
    while size > 0 {
        out.push(byte | 0x80);
        byte = (size & 0x7f) as u8;
        size >>= 7;
    }
    out.push(byte);
}

/// Serialize a version-2 index for the given entry locations.
pub(crate) fn build_index_bytes(
    mut locations: Vec<(ObjectId, u32, u64)>,
    pack_checksum: [u8; OBJECT_ID_LEN],
) -> Vec<u8> {
    locations.sort_by(|a, b| a.0.cmp(&b.0));

    let mut buf = Vec::new();
    buf.extend_from_slice(&V2_MAGIC);
    buf.extend_from_slice(&2u32.to_be_bytes());

    let mut fanout = [0u32; 256];
    for (i, (id, _, _)) in locations.iter().enumerate() {
        let first = id.as_bytes()[0] as usize;
        for slot in fanout.iter_mut().skip(first) {
            *slot = (i + 1) as u32;
        }
    }
    for count in fanout {
        buf.extend_from_slice(&count.to_be_bytes());
    }
    for (id, _, _) in &locations {
        buf.extend_from_slice(id.as_bytes());
    }
    for (_, crc, _) in &locations {
        buf.extend_from_slice(&crc.to_be_bytes());
    }

    let mut large = Vec::new();
    for (_, _, offset) in &locations {
        if *offset < 0x8000_0000 {
            buf.extend_from_slice(&(*offset as u32).to_be_bytes());
        } else {
            let idx = (large.len() as u32) | 0x8000_0000;
            buf.extend_from_slice(&idx.to_be_bytes());
            large.push(*offset);
        }
    }
    for offset in large {
        buf.extend_from_slice(&offset.to_be_bytes());
    }

    buf.extend_from_slice(&pack_checksum);
    let mut hasher = Sha1::new();
    hasher.update(&buf);
    let digest: [u8; OBJECT_ID_LEN] = hasher.finalize().into();
    buf.extend_from_slice(&digest);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use lode_types::ObjectKind;

    use crate::index::PackIndex;

    #[test]
    fn header_encoding_small() {
        let mut out = Vec::new();
        encode_entry_header(&mut out, 3, 5);
        assert_eq!(out, vec![0x35]);
    }

    #[test]
    fn header_encoding_multibyte() {
        let mut out = Vec::new();
        encode_entry_header(&mut out, 1, 336);
        assert_eq!(out, vec![0x90, 0x15]);
    }

    #[test]
    fn dedupes_identical_objects() {
        let mut writer = PackWriter::new();
        writer
            .add_object(RawObject::new(ObjectKind::Blob, b"same".to_vec()))
            .unwrap();
        writer
            .add_object(RawObject::new(ObjectKind::Blob, b"same".to_vec()))
            .unwrap();
        assert_eq!(writer.len(), 1);
    }

    #[test]
    fn index_parses_back() {
        let mut writer = PackWriter::new();
        let id = writer
            .add_object(RawObject::new(ObjectKind::Blob, b"indexed".to_vec()))
            .unwrap();
        let (_, index_bytes) = writer.finish_to_bytes().unwrap();
        let index = PackIndex::from_bytes(&index_bytes).unwrap();
        assert!(index.contains(&id));
        assert_eq!(index.object_count(), 1);
    }
}
