//! Index entry types for tracked working-directory files.

use serde::{Deserialize, Serialize};
use lode_types::ObjectId;

/// A second/nanosecond timestamp as the index stores it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexTime {
    pub seconds: u32,
    pub nanoseconds: u32,
}

/// An entry in the index, representing one tracked file.
///
/// The stat fields mirror the on-disk record; they exist so a status walk
/// can cheaply decide whether a file changed without re-hashing it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Relative path from the workdir root, with `/` separators.
    pub path: String,
    /// Content-addressed id of the file's blob.
    pub id: ObjectId,
    /// Last change of the file's metadata.
    pub ctime: IndexTime,
    /// Last modification of the file's data.
    pub mtime: IndexTime,
    /// Device number of the file at stat time.
    pub dev: u32,
    /// Inode number of the file at stat time.
    pub ino: u32,
    /// File mode bits (object type and permissions).
    pub mode: u32,
    /// Owner uid at stat time.
    pub uid: u32,
    /// Owner gid at stat time.
    pub gid: u32,
    /// On-disk size in bytes (truncated to 32 bits).
    pub size: u32,
    /// Merge stage (0 for a normally tracked file).
    pub stage: u8,
    /// The assume-unchanged bit.
    pub assume_valid: bool,
}

impl IndexEntry {
    /// Whether the entry records an executable file mode.
    pub fn is_executable(&self) -> bool {
        self.mode & 0o111 != 0
    }
}
