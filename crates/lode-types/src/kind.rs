use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of a stored object.
///
/// The numeric encodings are fixed by the on-disk formats: they appear in
/// packfile entry headers and must round-trip unchanged. Only the four
/// loose-representable kinds (commit, tree, blob, tag) may be hashed and
/// stored as standalone objects; the delta kinds exist solely inside packs
/// and never cross the cache boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Reserved (raw value 0).
    Ext1,
    /// A commit object.
    Commit,
    /// A directory listing.
    Tree,
    /// Raw file contents.
    Blob,
    /// An annotated tag.
    Tag,
    /// Reserved (raw value 5).
    Ext2,
    /// Pack-only: delta against an object at an earlier pack offset.
    OfsDelta,
    /// Pack-only: delta against an object named by id.
    RefDelta,
    /// Invalid sentinel, produced when parsing unrecognized input.
    Bad,
}

impl ObjectKind {
    /// The kind's name as it appears in loose object headers.
    ///
    /// Reserved and invalid kinds render as the empty string.
    pub fn name(self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Tree => "tree",
            Self::Blob => "blob",
            Self::Tag => "tag",
            Self::OfsDelta => "OFS_DELTA",
            Self::RefDelta => "REF_DELTA",
            Self::Ext1 | Self::Ext2 | Self::Bad => "",
        }
    }

    /// Parse a kind from its header name. Unknown or empty names yield
    /// [`ObjectKind::Bad`].
    pub fn parse_name(name: &str) -> Self {
        match name {
            "commit" => Self::Commit,
            "tree" => Self::Tree,
            "blob" => Self::Blob,
            "tag" => Self::Tag,
            "OFS_DELTA" => Self::OfsDelta,
            "REF_DELTA" => Self::RefDelta,
            _ => Self::Bad,
        }
    }

    /// Whether objects of this kind may be stored standalone (and hashed).
    pub fn is_loose(self) -> bool {
        matches!(self, Self::Commit | Self::Tree | Self::Blob | Self::Tag)
    }

    /// Decode from the numeric encoding used in pack entry headers.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Ext1),
            1 => Some(Self::Commit),
            2 => Some(Self::Tree),
            3 => Some(Self::Blob),
            4 => Some(Self::Tag),
            5 => Some(Self::Ext2),
            6 => Some(Self::OfsDelta),
            7 => Some(Self::RefDelta),
            _ => None,
        }
    }

    /// The numeric encoding used in pack entry headers, if this kind has
    /// one ([`ObjectKind::Bad`] does not).
    pub fn as_raw(self) -> Option<u8> {
        match self {
            Self::Ext1 => Some(0),
            Self::Commit => Some(1),
            Self::Tree => Some(2),
            Self::Blob => Some(3),
            Self::Tag => Some(4),
            Self::Ext2 => Some(5),
            Self::OfsDelta => Some(6),
            Self::RefDelta => Some(7),
            Self::Bad => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
