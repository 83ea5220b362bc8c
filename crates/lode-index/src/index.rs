//! Binary index file parsing.
//!
//! Layout: a 12-byte header (`DIRC`, version, entry count), the entry
//! table, optional extensions, and a trailing SHA-1 over everything
//! before it. Each entry is 62 bytes of fixed fields followed by the
//! NUL-terminated path, padded with NULs to an 8-byte boundary.

use std::collections::BTreeMap;
use std::path::Path;

use sha1::{Digest, Sha1};
use lode_types::{ObjectId, OBJECT_ID_LEN};

use crate::entry::{IndexEntry, IndexTime};
use crate::error::{IndexError, IndexResult};

const SIGNATURE: &[u8; 4] = b"DIRC";
const SUPPORTED_VERSION: u32 = 2;
const HEADER_LEN: usize = 12;
const ENTRY_FIXED_LEN: usize = 62;

/// Parsed working-directory index, entries keyed by path.
pub struct Index {
    version: u32,
    entries: BTreeMap<String, IndexEntry>,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("version", &self.version)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl Index {
    /// Read and parse an index file.
    pub fn open(path: &Path) -> IndexResult<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Parse an index from raw bytes, verifying the trailing checksum.
    pub fn from_bytes(data: &[u8]) -> IndexResult<Self> {
        if data.len() < HEADER_LEN + OBJECT_ID_LEN {
            return Err(IndexError::Corrupt("file too short".into()));
        }
        if &data[..4] != SIGNATURE {
            return Err(IndexError::BadSignature);
        }

        let version = read_u32(data, 4)?;
        if version != SUPPORTED_VERSION {
            return Err(IndexError::UnsupportedVersion(version));
        }

        let checksum_start = data.len() - OBJECT_ID_LEN;
        let mut hasher = Sha1::new();
        hasher.update(&data[..checksum_start]);
        let digest: [u8; OBJECT_ID_LEN] = hasher.finalize().into();
        if digest != data[checksum_start..] {
            return Err(IndexError::ChecksumMismatch);
        }

        let count = read_u32(data, 8)? as usize;
        let mut entries = BTreeMap::new();
        let mut pos = HEADER_LEN;
        for _ in 0..count {
            let (entry, next) = parse_entry(data, pos, checksum_start)?;
            entries.insert(entry.path.clone(), entry);
            pos = next;
        }
        // Anything between the entries and the checksum is extension data;
        // none of it is load-bearing for object access.

        Ok(Self { version, entries })
    }

    /// The index format version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index tracks nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry by path.
    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// Whether the index tracks a path.
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Iterate entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }
}

fn parse_entry(
    data: &[u8],
    start: usize,
    table_end: usize,
) -> IndexResult<(IndexEntry, usize)> {
    if start + ENTRY_FIXED_LEN > table_end {
        return Err(IndexError::Corrupt("truncated entry".into()));
    }

    let field = |i: usize| read_u32(data, start + i * 4);
    let ctime = IndexTime {
        seconds: field(0)?,
        nanoseconds: field(1)?,
    };
    let mtime = IndexTime {
        seconds: field(2)?,
        nanoseconds: field(3)?,
    };
    let dev = field(4)?;
    let ino = field(5)?;
    let mode = field(6)?;
    let uid = field(7)?;
    let gid = field(8)?;
    let size = field(9)?;

    let id_start = start + 40;
    let id = ObjectId::try_from_slice(&data[id_start..id_start + OBJECT_ID_LEN])
        .map_err(|e| IndexError::Corrupt(e.to_string()))?;

    let flags = u16::from_be_bytes([data[start + 60], data[start + 61]]);
    let assume_valid = flags & 0x8000 != 0;
    if flags & 0x4000 != 0 {
        return Err(IndexError::Corrupt("extended flags in a v2 index".into()));
    }
    let stage = ((flags >> 12) & 0x3) as u8;

    let path_start = start + ENTRY_FIXED_LEN;
    let nul = data[path_start..table_end]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| IndexError::Corrupt("unterminated path".into()))?;
    let path = std::str::from_utf8(&data[path_start..path_start + nul])
        .map_err(|_| IndexError::Corrupt("path is not UTF-8".into()))?
        .to_string();
    if path.is_empty() {
        return Err(IndexError::Corrupt("empty path".into()));
    }

    // Entries are NUL-padded so their total length is a multiple of 8.
    let entry_len = ENTRY_FIXED_LEN + nul;
    let padded = (entry_len / 8 + 1) * 8;
    let next = start + padded;
    if next > table_end {
        return Err(IndexError::Corrupt("entry padding past table end".into()));
    }

    Ok((
        IndexEntry {
            path,
            id,
            ctime,
            mtime,
            dev,
            ino,
            mode,
            uid,
            gid,
            size,
            stage,
            assume_valid,
        },
        next,
    ))
}

fn read_u32(data: &[u8], pos: usize) -> IndexResult<u32> {
    let slice = data
        .get(pos..pos + 4)
        .ok_or_else(|| IndexError::Corrupt("unexpected end of file".into()))?;
    Ok(u32::from_be_bytes(slice.try_into().expect("4 bytes")))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Serialize a minimal v2 index for fixtures.
    fn build_index(entries: &[(&str, [u8; 20], u32)]) -> Vec<u8> {
        let mut sorted: Vec<_> = entries.to_vec();
        sorted.sort_by_key(|(path, _, _)| path.to_string());

        let mut buf = Vec::new();
        buf.extend_from_slice(SIGNATURE);
        buf.extend_from_slice(&SUPPORTED_VERSION.to_be_bytes());
        buf.extend_from_slice(&(sorted.len() as u32).to_be_bytes());

        for (path, id, mode) in &sorted {
            let start = buf.len();
            for _ in 0..6 {
                buf.extend_from_slice(&0u32.to_be_bytes()); // ctime/mtime/dev/ino
            }
            buf.extend_from_slice(&mode.to_be_bytes());
            buf.extend_from_slice(&0u32.to_be_bytes()); // uid
            buf.extend_from_slice(&0u32.to_be_bytes()); // gid
            buf.extend_from_slice(&(path.len() as u32).to_be_bytes()); // size
            buf.extend_from_slice(id);
            let flags = (path.len() as u16).min(0xfff);
            buf.extend_from_slice(&flags.to_be_bytes());
            buf.extend_from_slice(path.as_bytes());
            let entry_len = buf.len() - start;
            let padded = (entry_len / 8 + 1) * 8;
            buf.resize(start + padded, 0);
        }

        let mut hasher = Sha1::new();
        hasher.update(&buf);
        let digest: [u8; OBJECT_ID_LEN] = hasher.finalize().into();
        buf.extend_from_slice(&digest);
        buf
    }

    #[test]
    fn parses_entries_in_path_order() {
        let bytes = build_index(&[
            ("src/lib.rs", [2; 20], 0o100644),
            ("README", [1; 20], 0o100644),
            ("run.sh", [3; 20], 0o100755),
        ]);
        let index = Index::from_bytes(&bytes).unwrap();

        assert_eq!(index.version(), 2);
        assert_eq!(index.len(), 3);
        let paths: Vec<_> = index.entries().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["README", "run.sh", "src/lib.rs"]);

        let entry = index.get("run.sh").unwrap();
        assert_eq!(entry.id, ObjectId::from_raw([3; 20]));
        assert!(entry.is_executable());
        assert_eq!(entry.stage, 0);
        assert!(!entry.assume_valid);
    }

    #[test]
    fn empty_index_parses() {
        let bytes = build_index(&[]);
        let index = Index::from_bytes(&bytes).unwrap();
        assert!(index.is_empty());
        assert!(!index.contains("anything"));
    }

    #[test]
    fn bad_signature_rejected() {
        let mut bytes = build_index(&[("a", [0; 20], 0o100644)]);
        bytes[0] = b'X';
        assert!(matches!(
            Index::from_bytes(&bytes),
            Err(IndexError::BadSignature)
        ));
    }

    #[test]
    fn flipped_byte_fails_checksum() {
        let mut bytes = build_index(&[("a", [0; 20], 0o100644)]);
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xff;
        assert!(matches!(
            Index::from_bytes(&bytes),
            Err(IndexError::ChecksumMismatch)
        ));
    }

    #[test]
    fn unsupported_version_rejected() {
        let mut bytes = build_index(&[]);
        bytes[7] = 9; // version field, big-endian low byte
        assert!(matches!(
            Index::from_bytes(&bytes),
            Err(IndexError::UnsupportedVersion(9))
        ));
    }

    #[test]
    fn truncation_rejected() {
        let bytes = build_index(&[("file", [5; 20], 0o100644)]);
        assert!(Index::from_bytes(&bytes[..bytes.len() - 25]).is_err());
        assert!(Index::from_bytes(&bytes[..8]).is_err());
    }

    #[test]
    fn open_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index");
        std::fs::write(&path, build_index(&[("disk.txt", [7; 20], 0o100644)])).unwrap();

        let index = Index::open(&path).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.contains("disk.txt"));
    }
}
