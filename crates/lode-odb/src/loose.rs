//! Loose object storage: one zlib-compressed file per object.
//!
//! A loose object lives at `<objects>/aa/bb…` (the id's path rendering)
//! and contains `"<kind> <len>\0"` followed by the payload, compressed as
//! a single zlib stream. The header is re-validated on every read.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lode_pack::inflate_prefix;
use lode_types::{ObjectHeader, ObjectId, ObjectKind, RawObject};

use crate::backend::Backend;
use crate::error::{OdbError, OdbResult};

/// Loose object headers fit well under this bound; anything longer is
/// malformed.
const MAX_HEADER_LEN: usize = 64;

/// Backend for individually stored, zlib-compressed objects.
pub struct LooseBackend {
    objects_dir: PathBuf,
}

impl LooseBackend {
    /// Open the loose backend over an object directory.
    ///
    /// Declines (`None`) when the directory does not exist, so the database
    /// can compose its default stack without it.
    pub fn open(objects_dir: &Path) -> Option<Self> {
        if !objects_dir.is_dir() {
            return None;
        }
        Some(Self {
            objects_dir: objects_dir.to_path_buf(),
        })
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        self.objects_dir.join(id.path_format())
    }
}

impl Backend for LooseBackend {
    fn read(&self, id: &ObjectId) -> OdbResult<RawObject> {
        let path = self.object_path(id);
        if !path.is_file() {
            return Err(OdbError::NotFound(*id));
        }
        let compressed = std::fs::read(&path)?;

        let mut decoder = ZlibDecoder::new(compressed.as_slice());
        let mut content = Vec::new();
        decoder.read_to_end(&mut content).map_err(|e| OdbError::CorruptObject {
            id: *id,
            reason: format!("inflate failed: {e}"),
        })?;

        let header = parse_loose_header(*id, &content)?;
        let payload = &content[header_end(&content)..];
        if payload.len() != header.len {
            return Err(OdbError::CorruptObject {
                id: *id,
                reason: format!(
                    "declared length {} but {} payload bytes",
                    header.len,
                    payload.len()
                ),
            });
        }
        Ok(RawObject::new(header.kind, payload.to_vec()))
    }

    fn exists(&self, id: &ObjectId) -> bool {
        self.object_path(id).is_file()
    }

    fn read_header(&self, id: &ObjectId) -> OdbResult<ObjectHeader> {
        let path = self.object_path(id);
        if !path.is_file() {
            return Err(OdbError::NotFound(*id));
        }
        let compressed = std::fs::read(&path)?;
        let prefix =
            inflate_prefix(&compressed, MAX_HEADER_LEN).map_err(|e| OdbError::CorruptObject {
                id: *id,
                reason: format!("inflate failed: {e}"),
            })?;
        parse_loose_header(*id, &prefix)
    }

    fn write(&self, obj: &RawObject) -> OdbResult<ObjectId> {
        let id = obj.id()?;
        let path = self.object_path(&id);
        if path.is_file() {
            // Content addressing: an existing file already holds these bytes.
            return Ok(id);
        }

        let dir = path.parent().expect("object path has a fan-out directory");
        std::fs::create_dir_all(dir)?;

        let header = obj.header_bytes()?;
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&header)?;
        encoder.write_all(&obj.data)?;
        let compressed = encoder.finish()?;

        // Stage then rename; readers never observe a partial file.
        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, &compressed)?;
        std::fs::rename(&tmp_path, &path)?;

        tracing::debug!(id = %id, len = obj.len(), "stored loose object");
        Ok(id)
    }
}

/// Parse `"<kind> <len>\0"` from the start of inflated content.
fn parse_loose_header(id: ObjectId, content: &[u8]) -> OdbResult<ObjectHeader> {
    let corrupt = |reason: String| OdbError::CorruptObject { id, reason };

    let bound = content.len().min(MAX_HEADER_LEN);
    let nul = content[..bound]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| corrupt("missing header terminator".into()))?;
    let header = std::str::from_utf8(&content[..nul])
        .map_err(|_| corrupt("header is not ASCII".into()))?;

    let (name, len) = header
        .split_once(' ')
        .ok_or_else(|| corrupt("malformed header".into()))?;
    let kind = ObjectKind::parse_name(name);
    if !kind.is_loose() {
        return Err(corrupt(format!("unknown object kind {name:?}")));
    }
    let len: usize = len
        .parse()
        .map_err(|_| corrupt(format!("bad length {len:?}")))?;

    Ok(ObjectHeader { kind, len })
}

/// Offset of the first payload byte (one past the header NUL).
fn header_end(content: &[u8]) -> usize {
    content
        .iter()
        .position(|&b| b == 0)
        .map(|nul| nul + 1)
        .unwrap_or(content.len())
}
