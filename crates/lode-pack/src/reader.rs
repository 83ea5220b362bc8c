//! Random-access pack reading.

use std::collections::HashMap;
use std::path::Path;

use sha1::{Digest, Sha1};
use lode_types::{ObjectHeader, ObjectId, RawObject, OBJECT_ID_LEN};

use crate::delta::{apply_delta, delta_target_size};
use crate::entry::{parse_entry_header, PackEntryKind};
use crate::error::{PackError, PackResult};
use crate::index::PackIndex;
use crate::inflate::{inflate_exact, inflate_prefix};

/// Upper bound on delta chain length; deeper chains indicate corruption
/// (or a cycle) rather than a legitimately packed object.
const MAX_DELTA_DEPTH: usize = 64;

/// Delta payload headers are two varints; this budget always covers them.
const DELTA_HEADER_PEEK: usize = 24;

/// Reads objects from a pack file using its index for random access.
#[derive(Debug)]
pub struct PackReader {
    data: Vec<u8>,
    index: PackIndex,
    /// Packed-bytes CRC per entry offset (version-2 indexes only).
    crc_by_offset: HashMap<u64, u32>,
    /// Entry start offsets plus the trailer start, sorted; each entry's
    /// packed bytes run to the next boundary.
    boundaries: Vec<u64>,
}

impl PackReader {
    /// Open a `.pack` file together with its sibling `.idx`.
    pub fn open(pack_path: &Path) -> PackResult<Self> {
        let data = std::fs::read(pack_path)?;
        let index = PackIndex::open(&pack_path.with_extension("idx"))?;
        Self::from_bytes(data, index)
    }

    /// Construct from raw pack bytes and a parsed index.
    ///
    /// Verifies the pack framing, the trailer checksum, and that the index
    /// was built for this pack.
    pub fn from_bytes(data: Vec<u8>, index: PackIndex) -> PackResult<Self> {
        if data.len() < 12 + OBJECT_ID_LEN {
            return Err(PackError::CorruptEntry {
                offset: 0,
                reason: "pack data too short".into(),
            });
        }
        if &data[0..4] != b"PACK" {
            return Err(PackError::InvalidMagic {
                expected: "PACK".into(),
                actual: String::from_utf8_lossy(&data[0..4]).into(),
            });
        }
        let version = u32::from_be_bytes(data[4..8].try_into().unwrap());
        if version != 2 && version != 3 {
            return Err(PackError::UnsupportedVersion(version));
        }

        let trailer_start = data.len() - OBJECT_ID_LEN;
        let mut hasher = Sha1::new();
        hasher.update(&data[..trailer_start]);
        let digest: [u8; OBJECT_ID_LEN] = hasher.finalize().into();
        if digest != data[trailer_start..] {
            return Err(PackError::ChecksumMismatch);
        }
        if index.pack_checksum() != &digest {
            return Err(PackError::ChecksumMismatch);
        }

        let mut crc_by_offset = HashMap::new();
        for (id, offset) in index.object_ids().iter().zip(index.offsets()) {
            if let Some(crc) = index.lookup(id).and_then(|e| e.crc32) {
                crc_by_offset.insert(*offset, crc);
            }
        }

        let mut boundaries: Vec<u64> = index.offsets().to_vec();
        boundaries.push(trailer_start as u64);
        boundaries.sort_unstable();
        boundaries.dedup();

        Ok(Self {
            data,
            index,
            crc_by_offset,
            boundaries,
        })
    }

    /// Read an object by id, resolving delta chains. `Ok(None)` when the
    /// pack does not contain the id.
    pub fn read(&self, id: &ObjectId) -> PackResult<Option<RawObject>> {
        let entry = match self.index.lookup(id) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        self.object_at(entry.offset, 0).map(Some)
    }

    /// Read an object's kind and inflated size without materializing its
    /// payload. Delta chains contribute the kind from their base and the
    /// size from the topmost delta's declared target size.
    pub fn read_header(&self, id: &ObjectId) -> PackResult<Option<ObjectHeader>> {
        let entry = match self.index.lookup(id) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        self.header_at(entry.offset, 0).map(Some)
    }

    /// Check containment without any I/O.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.index.contains(id)
    }

    /// Object count.
    pub fn object_count(&self) -> usize {
        self.index.object_count()
    }

    /// Access the index.
    pub fn index(&self) -> &PackIndex {
        &self.index
    }

    fn object_at(&self, offset: u64, depth: usize) -> PackResult<RawObject> {
        if depth > MAX_DELTA_DEPTH {
            return Err(PackError::DeltaChainTooDeep(MAX_DELTA_DEPTH));
        }
        self.verify_crc(offset)?;

        let header = parse_entry_header(&self.data, offset)?;
        match header.kind {
            PackEntryKind::Base(kind) => {
                let data =
                    inflate_exact(&self.data[header.data_offset..], header.size as usize)?;
                Ok(RawObject::new(kind, data))
            }
            PackEntryKind::OfsDelta { base_offset } => {
                let base = self.object_at(base_offset, depth + 1)?;
                let delta =
                    inflate_exact(&self.data[header.data_offset..], header.size as usize)?;
                Ok(RawObject::new(base.kind, apply_delta(&base.data, &delta)?))
            }
            PackEntryKind::RefDelta { base } => {
                let base_entry = self
                    .index
                    .lookup(&base)
                    .ok_or(PackError::DeltaBaseNotFound(base))?;
                let base = self.object_at(base_entry.offset, depth + 1)?;
                let delta =
                    inflate_exact(&self.data[header.data_offset..], header.size as usize)?;
                Ok(RawObject::new(base.kind, apply_delta(&base.data, &delta)?))
            }
        }
    }

    fn header_at(&self, offset: u64, depth: usize) -> PackResult<ObjectHeader> {
        if depth > MAX_DELTA_DEPTH {
            return Err(PackError::DeltaChainTooDeep(MAX_DELTA_DEPTH));
        }

        let header = parse_entry_header(&self.data, offset)?;
        let base_offset = match header.kind {
            PackEntryKind::Base(kind) => {
                return Ok(ObjectHeader {
                    kind,
                    len: header.size as usize,
                })
            }
            PackEntryKind::OfsDelta { base_offset } => base_offset,
            PackEntryKind::RefDelta { base } => {
                self.index
                    .lookup(&base)
                    .ok_or(PackError::DeltaBaseNotFound(base))?
                    .offset
            }
        };

        let peek = inflate_prefix(&self.data[header.data_offset..], DELTA_HEADER_PEEK)?;
        let len = delta_target_size(&peek)? as usize;
        let kind = self.header_at(base_offset, depth + 1)?.kind;
        Ok(ObjectHeader { kind, len })
    }

    /// Verify the index CRC over the entry's packed bytes, when recorded.
    fn verify_crc(&self, offset: u64) -> PackResult<()> {
        let expected = match self.crc_by_offset.get(&offset) {
            Some(crc) => *crc,
            None => return Ok(()),
        };
        let end = match self.boundaries.iter().find(|b| **b > offset) {
            Some(end) => *end as usize,
            None => self.data.len() - OBJECT_ID_LEN,
        };
        let actual = crc32fast::hash(&self.data[offset as usize..end]);
        if actual != expected {
            let id = self
                .index
                .object_ids()
                .iter()
                .zip(self.index.offsets())
                .find(|(_, o)| **o == offset)
                .map(|(id, _)| *id)
                .unwrap_or_else(ObjectId::null);
            return Err(PackError::CrcMismatch(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use lode_types::ObjectKind;

    use crate::writer::PackWriter;

    fn reader_for(objects: &[RawObject]) -> (PackReader, Vec<ObjectId>) {
        let mut writer = PackWriter::new();
        let ids = objects
            .iter()
            .map(|obj| writer.add_object(obj.clone()).unwrap())
            .collect();
        let (pack, index_bytes) = writer.finish_to_bytes().unwrap();
        let index = PackIndex::from_bytes(&index_bytes).unwrap();
        (PackReader::from_bytes(pack, index).unwrap(), ids)
    }

    #[test]
    fn roundtrip_single_blob() {
        let blob = RawObject::new(ObjectKind::Blob, b"hello world".to_vec());
        let (reader, ids) = reader_for(std::slice::from_ref(&blob));

        assert_eq!(reader.object_count(), 1);
        assert!(reader.contains(&ids[0]));
        let read = reader.read(&ids[0]).unwrap().unwrap();
        assert_eq!(read, blob);
    }

    #[test]
    fn roundtrip_many_kinds() {
        let objects = vec![
            RawObject::new(ObjectKind::Blob, b"blob data".to_vec()),
            RawObject::new(ObjectKind::Commit, b"commit data".to_vec()),
            RawObject::new(ObjectKind::Tree, b"tree data".to_vec()),
            RawObject::new(ObjectKind::Tag, b"tag data".to_vec()),
        ];
        let (reader, ids) = reader_for(&objects);
        for (obj, id) in objects.iter().zip(&ids) {
            assert_eq!(&reader.read(id).unwrap().unwrap(), obj);
        }
    }

    #[test]
    fn missing_id_reads_none() {
        let (reader, _) = reader_for(&[RawObject::new(ObjectKind::Blob, b"x".to_vec())]);
        assert_eq!(reader.read(&ObjectId::from_raw([9; 20])).unwrap(), None);
        assert!(reader
            .read_header(&ObjectId::from_raw([9; 20]))
            .unwrap()
            .is_none());
    }

    #[test]
    fn read_header_skips_payload() {
        let blob = RawObject::new(ObjectKind::Blob, vec![7u8; 4096]);
        let (reader, ids) = reader_for(std::slice::from_ref(&blob));
        let header = reader.read_header(&ids[0]).unwrap().unwrap();
        assert_eq!(header.kind, ObjectKind::Blob);
        assert_eq!(header.len, 4096);
    }

    #[test]
    fn corrupt_pack_byte_fails_crc() {
        let blob = RawObject::new(ObjectKind::Blob, b"crc guarded".to_vec());
        let mut writer = PackWriter::new();
        let id = writer.add_object(blob).unwrap();
        let (mut pack, index_bytes) = writer.finish_to_bytes().unwrap();

        let original = PackIndex::from_bytes(&index_bytes).unwrap();
        let entry = original.lookup(&id).unwrap();

        // Flip a payload byte and re-seal the trailer so only the CRC trips.
        pack[14] ^= 0x01;
        let trailer_start = pack.len() - OBJECT_ID_LEN;
        let mut hasher = Sha1::new();
        hasher.update(&pack[..trailer_start]);
        let digest: [u8; OBJECT_ID_LEN] = hasher.finalize().into();
        pack.truncate(trailer_start);
        pack.extend_from_slice(&digest);

        // Rebuild the index for the new trailer, keeping the stale CRC.
        let rebuilt = crate::writer::build_index_bytes(
            vec![(id, entry.crc32.unwrap(), entry.offset)],
            digest,
        );
        let index = PackIndex::from_bytes(&rebuilt).unwrap();

        let reader = PackReader::from_bytes(pack, index).unwrap();
        assert!(matches!(reader.read(&id), Err(PackError::CrcMismatch(_))));
    }

    #[test]
    fn ref_delta_chain_resolves() {
        // Hand-build a pack: one base blob plus one ref-delta entry.
        let base = RawObject::new(ObjectKind::Blob, b"0123456789".to_vec());
        let base_id = base.id().unwrap();

        let delta = vec![
            10,                 // base size
            4,                  // target size
            0x80 | 0x01 | 0x10, // copy: offset=2, size=4
            2,
            4,
        ];

        let mut pack = Vec::new();
        pack.extend_from_slice(b"PACK");
        pack.extend_from_slice(&2u32.to_be_bytes());
        pack.extend_from_slice(&2u32.to_be_bytes());

        let base_offset = pack.len() as u64;
        pack.push(0x3a); // blob, size 10
        let mut enc = ZlibEncoder::new(&mut pack, Compression::default());
        enc.write_all(&base.data).unwrap();
        enc.finish().unwrap();

        let delta_offset = pack.len() as u64;
        pack.push(0x75); // ref-delta, size 5 (delta payload length)
        pack.extend_from_slice(base_id.as_bytes());
        let mut enc = ZlibEncoder::new(&mut pack, Compression::default());
        enc.write_all(&delta).unwrap();
        enc.finish().unwrap();
        let entries_end = pack.len();

        let mut hasher = Sha1::new();
        hasher.update(&pack);
        let checksum: [u8; OBJECT_ID_LEN] = hasher.finalize().into();
        pack.extend_from_slice(&checksum);

        let base_crc = crc32fast::hash(&pack[base_offset as usize..delta_offset as usize]);
        let delta_crc = crc32fast::hash(&pack[delta_offset as usize..entries_end]);

        // The delta result is "2345"; the index names it by that blob's id.
        let derived = RawObject::new(ObjectKind::Blob, b"2345".to_vec());
        let derived_id = derived.id().unwrap();

        let index_bytes = crate::writer::build_index_bytes(
            vec![
                (base_id, base_crc, base_offset),
                (derived_id, delta_crc, delta_offset),
            ],
            checksum,
        );
        let index = PackIndex::from_bytes(&index_bytes).unwrap();
        let reader = PackReader::from_bytes(pack, index).unwrap();

        let read = reader.read(&derived_id).unwrap().unwrap();
        assert_eq!(read, derived);

        let header = reader.read_header(&derived_id).unwrap().unwrap();
        assert_eq!(header.kind, ObjectKind::Blob);
        assert_eq!(header.len, 4);
    }
}
