//! Directory listing objects.
//!
//! The canonical form is a run of `"<octal mode> <name>\0"` followed by the
//! entry's raw 20-byte id, one run per entry, entries sorted by name.

use std::fmt;

use lode_types::{ObjectId, ObjectKind, OBJECT_ID_LEN};

use crate::error::{RepoError, RepoResult};
use crate::source::WriteBuffer;

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryMode {
    /// Normal file (100644).
    Regular,
    /// Executable file (100755).
    Executable,
    /// Symbolic link (120000).
    Symlink,
    /// Subtree (40000).
    Directory,
    /// Nested repository reference (160000).
    Submodule,
}

impl EntryMode {
    /// Octal mode value.
    pub fn mode_bits(self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
            Self::Submodule => 0o160000,
        }
    }

    /// Parse from an octal mode value.
    pub fn from_mode_bits(bits: u32) -> Option<Self> {
        match bits {
            0o100644 => Some(Self::Regular),
            0o100755 => Some(Self::Executable),
            0o120000 => Some(Self::Symlink),
            0o040000 => Some(Self::Directory),
            0o160000 => Some(Self::Submodule),
            _ => None,
        }
    }
}

impl fmt::Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Canonical rendering has no leading zero.
        write!(f, "{:o}", self.mode_bits())
    }
}

/// A single entry in a tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    /// Entry mode.
    pub mode: EntryMode,
    /// Entry name (no separators).
    pub name: String,
    /// Id of the referenced object.
    pub id: ObjectId,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(mode: EntryMode, name: impl Into<String>, id: ObjectId) -> Self {
        Self {
            mode,
            name: name.into(),
            id,
        }
    }
}

/// Directory listing, entries kept name-sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a tree from entries, sorting them by name.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    /// Add an entry, keeping the listing sorted. An entry with the same
    /// name is replaced.
    pub fn add_entry(&mut self, entry: TreeEntry) {
        match self
            .entries
            .binary_search_by(|probe| probe.name.cmp(&entry.name))
        {
            Ok(i) => self.entries[i] = entry,
            Err(i) => self.entries.insert(i, entry),
        }
    }

    /// Remove an entry by name.
    pub fn remove_entry(&mut self, name: &str) -> Option<TreeEntry> {
        let i = self
            .entries
            .binary_search_by(|probe| probe.name.as_str().cmp(name))
            .ok()?;
        Some(self.entries.remove(i))
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|probe| probe.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// The sorted entries.
    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` for an empty tree.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn parse(data: &[u8]) -> RepoResult<Self> {
        let parse_err = |reason: String| RepoError::Parse {
            kind: ObjectKind::Tree,
            reason,
        };

        let mut entries = Vec::new();
        let mut pos = 0;
        while pos < data.len() {
            let space = data[pos..]
                .iter()
                .position(|&b| b == b' ')
                .map(|i| pos + i)
                .ok_or_else(|| parse_err("entry missing mode terminator".into()))?;
            let mode_str = std::str::from_utf8(&data[pos..space])
                .map_err(|_| parse_err("mode is not ASCII".into()))?;
            let bits = u32::from_str_radix(mode_str, 8)
                .map_err(|_| parse_err(format!("bad mode {mode_str:?}")))?;
            let mode = EntryMode::from_mode_bits(bits)
                .ok_or_else(|| parse_err(format!("unknown mode {mode_str}")))?;

            let nul = data[space + 1..]
                .iter()
                .position(|&b| b == 0)
                .map(|i| space + 1 + i)
                .ok_or_else(|| parse_err("entry missing name terminator".into()))?;
            let name = std::str::from_utf8(&data[space + 1..nul])
                .map_err(|_| parse_err("name is not UTF-8".into()))?
                .to_string();
            if name.is_empty() {
                return Err(parse_err("empty entry name".into()));
            }

            let id_end = nul + 1 + OBJECT_ID_LEN;
            if id_end > data.len() {
                return Err(parse_err("truncated entry id".into()));
            }
            let id = ObjectId::try_from_slice(&data[nul + 1..id_end])
                .expect("slice is 20 bytes");

            entries.push(TreeEntry { mode, name, id });
            pos = id_end;
        }

        // Trusted producers write sorted trees; re-sorting here keeps the
        // invariant without rejecting historical oddities.
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self { entries })
    }

    pub(crate) fn serialize(&self, buf: &mut WriteBuffer) -> RepoResult<()> {
        for entry in &self.entries {
            write!(buf, "{} {}\0", entry.mode, entry.name);
            buf.write(entry.id.as_bytes());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(byte: u8) -> ObjectId {
        ObjectId::from_raw([byte; 20])
    }

    #[test]
    fn mode_bits_roundtrip() {
        for mode in [
            EntryMode::Regular,
            EntryMode::Executable,
            EntryMode::Symlink,
            EntryMode::Directory,
            EntryMode::Submodule,
        ] {
            assert_eq!(EntryMode::from_mode_bits(mode.mode_bits()), Some(mode));
        }
        assert!(EntryMode::from_mode_bits(0o777).is_none());
    }

    #[test]
    fn mode_renders_without_leading_zero() {
        assert_eq!(EntryMode::Directory.to_string(), "40000");
        assert_eq!(EntryMode::Regular.to_string(), "100644");
    }

    #[test]
    fn serialize_parse_roundtrip() {
        let tree = Tree::new(vec![
            TreeEntry::new(EntryMode::Regular, "readme.md", id(1)),
            TreeEntry::new(EntryMode::Directory, "src", id(2)),
            TreeEntry::new(EntryMode::Executable, "build.sh", id(3)),
        ]);

        let mut buf = WriteBuffer::new();
        tree.serialize(&mut buf).unwrap();
        let parsed = Tree::parse(buf.as_slice()).unwrap();
        assert_eq!(parsed, tree);
    }

    #[test]
    fn entries_are_name_sorted() {
        let mut tree = Tree::default();
        tree.add_entry(TreeEntry::new(EntryMode::Regular, "zebra", id(1)));
        tree.add_entry(TreeEntry::new(EntryMode::Regular, "alpha", id(2)));
        tree.add_entry(TreeEntry::new(EntryMode::Directory, "middle", id(3)));

        let names: Vec<_> = tree.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "middle", "zebra"]);
    }

    #[test]
    fn add_entry_replaces_same_name() {
        let mut tree = Tree::default();
        tree.add_entry(TreeEntry::new(EntryMode::Regular, "file", id(1)));
        tree.add_entry(TreeEntry::new(EntryMode::Executable, "file", id(2)));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get("file").unwrap().id, id(2));
    }

    #[test]
    fn remove_entry() {
        let mut tree = Tree::new(vec![TreeEntry::new(EntryMode::Regular, "gone", id(1))]);
        assert!(tree.remove_entry("gone").is_some());
        assert!(tree.remove_entry("gone").is_none());
        assert!(tree.is_empty());
    }

    #[test]
    fn parse_wire_format() {
        let mut data = Vec::new();
        data.extend_from_slice(b"100644 a.txt\0");
        data.extend_from_slice(&[1; 20]);
        data.extend_from_slice(b"40000 dir\0");
        data.extend_from_slice(&[2; 20]);

        let tree = Tree::parse(&data).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get("a.txt").unwrap().mode, EntryMode::Regular);
        assert_eq!(tree.get("dir").unwrap().mode, EntryMode::Directory);
    }

    #[test]
    fn malformed_trees_rejected() {
        assert!(Tree::parse(b"100644 name-without-nul").is_err());
        assert!(Tree::parse(b"999999 x\0aaaaaaaaaaaaaaaaaaaa").is_err());
        let mut truncated = Vec::new();
        truncated.extend_from_slice(b"100644 f\0");
        truncated.extend_from_slice(&[0; 10]); // id cut short
        assert!(Tree::parse(&truncated).is_err());
    }

    #[test]
    fn empty_tree_parses_and_serializes() {
        let tree = Tree::parse(b"").unwrap();
        assert!(tree.is_empty());
        let mut buf = WriteBuffer::new();
        tree.serialize(&mut buf).unwrap();
        assert!(buf.as_slice().is_empty());
    }
}
