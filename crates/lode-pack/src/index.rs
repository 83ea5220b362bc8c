//! Pack index parsing and lookup.
//!
//! An index file gives random access into its sibling pack:
//! - Fan-out table: 256 entries counting objects with first byte <= index
//! - Sorted object id array
//! - CRC32 array over each entry's packed bytes (version 2 only)
//! - Offset array, with an 8-byte extension table for offsets past 2 GiB
//! - Pack and index trailer checksums
//!
//! Version 2 starts with the `\xff tOc` magic; files without it are the
//! legacy version 1 layout (fan-out followed by offset/id pairs).

use std::path::Path;

use sha1::{Digest, Sha1};
use lode_types::{ObjectId, OBJECT_ID_LEN};

use crate::error::{PackError, PackResult};

const V2_MAGIC: [u8; 4] = [0xff, 0x74, 0x4f, 0x63];
const TRAILER_LEN: usize = OBJECT_ID_LEN * 2;

/// Where an object lives in the pack, plus its packed-bytes checksum when
/// the index records one.
#[derive(Clone, Copy, Debug)]
pub struct PackIndexEntry {
    pub offset: u64,
    pub crc32: Option<u32>,
}

/// Parsed pack index with fan-out accelerated lookups.
#[derive(Clone, Debug)]
pub struct PackIndex {
    fanout: [u32; 256],
    ids: Vec<ObjectId>,
    offsets: Vec<u64>,
    crc32s: Option<Vec<u32>>,
    pack_checksum: [u8; OBJECT_ID_LEN],
}

impl PackIndex {
    /// Read and parse an index file.
    pub fn open(path: &Path) -> PackResult<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Parse an index from raw bytes, verifying the trailer checksum.
    pub fn from_bytes(data: &[u8]) -> PackResult<Self> {
        if data.len() < TRAILER_LEN + 4 {
            return Err(PackError::IndexCorrupted("too short".into()));
        }

        let mut hasher = Sha1::new();
        hasher.update(&data[..data.len() - OBJECT_ID_LEN]);
        let digest: [u8; OBJECT_ID_LEN] = hasher.finalize().into();
        if digest != data[data.len() - OBJECT_ID_LEN..] {
            return Err(PackError::ChecksumMismatch);
        }

        if data[..4] == V2_MAGIC {
            Self::parse_v2(data)
        } else {
            Self::parse_v1(data)
        }
    }

    fn parse_v2(data: &[u8]) -> PackResult<Self> {
        let version = read_u32(data, 4)?;
        if version != 2 {
            return Err(PackError::UnsupportedVersion(version));
        }

        let fanout = read_fanout(data, 8)?;
        let count = fanout[255] as usize;
        let mut pos = 8 + 256 * 4;

        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let end = pos + OBJECT_ID_LEN;
            let slice = data
                .get(pos..end)
                .ok_or_else(|| PackError::IndexCorrupted("truncated id table".into()))?;
            ids.push(ObjectId::try_from_slice(slice).expect("slice is 20 bytes"));
            pos = end;
        }

        let mut crc32s = Vec::with_capacity(count);
        for _ in 0..count {
            crc32s.push(read_u32(data, pos)?);
            pos += 4;
        }

        let mut raw_offsets = Vec::with_capacity(count);
        for _ in 0..count {
            raw_offsets.push(read_u32(data, pos)?);
            pos += 4;
        }

        let large_table = data
            .get(pos..data.len() - TRAILER_LEN)
            .ok_or_else(|| PackError::IndexCorrupted("truncated offset table".into()))?;

        let mut offsets = Vec::with_capacity(count);
        for raw in raw_offsets {
            if raw & 0x8000_0000 != 0 {
                let idx = (raw & 0x7fff_ffff) as usize * 8;
                let slice = large_table.get(idx..idx + 8).ok_or_else(|| {
                    PackError::IndexCorrupted("large offset out of range".into())
                })?;
                offsets.push(u64::from_be_bytes(slice.try_into().expect("8 bytes")));
            } else {
                offsets.push(u64::from(raw));
            }
        }

        let pack_checksum = read_checksum(data, data.len() - TRAILER_LEN);

        Ok(Self {
            fanout,
            ids,
            offsets,
            crc32s: Some(crc32s),
            pack_checksum,
        })
    }

    fn parse_v1(data: &[u8]) -> PackResult<Self> {
        let fanout = read_fanout(data, 0)?;
        let count = fanout[255] as usize;
        let mut pos = 256 * 4;

        let mut ids = Vec::with_capacity(count);
        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            offsets.push(u64::from(read_u32(data, pos)?));
            pos += 4;
            let end = pos + OBJECT_ID_LEN;
            let slice = data
                .get(pos..end)
                .ok_or_else(|| PackError::IndexCorrupted("truncated entry table".into()))?;
            ids.push(ObjectId::try_from_slice(slice).expect("slice is 20 bytes"));
            pos = end;
        }

        if pos + TRAILER_LEN != data.len() {
            return Err(PackError::IndexCorrupted("trailing garbage".into()));
        }
        let pack_checksum = read_checksum(data, pos);

        Ok(Self {
            fanout,
            ids,
            offsets,
            crc32s: None,
            pack_checksum,
        })
    }

    /// Look up an object's pack location by id.
    pub fn lookup(&self, id: &ObjectId) -> Option<PackIndexEntry> {
        let first_byte = id.as_bytes()[0] as usize;
        let start = if first_byte == 0 {
            0
        } else {
            self.fanout[first_byte - 1] as usize
        };
        let end = self.fanout[first_byte] as usize;

        let range = self.ids.get(start..end)?;
        match range.binary_search_by(|probe| probe.as_bytes().cmp(id.as_bytes())) {
            Ok(pos) => {
                let idx = start + pos;
                Some(PackIndexEntry {
                    offset: self.offsets[idx],
                    crc32: self.crc32s.as_ref().map(|t| t[idx]),
                })
            }
            Err(_) => None,
        }
    }

    /// Check if an object exists.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.lookup(id).is_some()
    }

    /// Total object count.
    pub fn object_count(&self) -> usize {
        self.ids.len()
    }

    /// All object ids, sorted.
    pub fn object_ids(&self) -> &[ObjectId] {
        &self.ids
    }

    /// All entry offsets, in id order.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// The checksum the sibling pack's trailer must carry.
    pub fn pack_checksum(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.pack_checksum
    }
}

fn read_u32(data: &[u8], pos: usize) -> PackResult<u32> {
    let slice = data
        .get(pos..pos + 4)
        .ok_or_else(|| PackError::IndexCorrupted("unexpected end of index".into()))?;
    Ok(u32::from_be_bytes(slice.try_into().expect("4 bytes")))
}

fn read_fanout(data: &[u8], start: usize) -> PackResult<[u32; 256]> {
    let mut fanout = [0u32; 256];
    for (i, slot) in fanout.iter_mut().enumerate() {
        *slot = read_u32(data, start + i * 4)?;
    }
    if fanout.windows(2).any(|w| w[0] > w[1]) {
        return Err(PackError::IndexCorrupted("fan-out not monotonic".into()));
    }
    Ok(fanout)
}

fn read_checksum(data: &[u8], pos: usize) -> [u8; OBJECT_ID_LEN] {
    let mut out = [0u8; OBJECT_ID_LEN];
    out.copy_from_slice(&data[pos..pos + OBJECT_ID_LEN]);
    out
}
