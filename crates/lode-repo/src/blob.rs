//! Raw content objects.

use crate::error::RepoResult;
use crate::source::WriteBuffer;

/// Raw file contents. The payload is the canonical serialization; parsing
/// and serializing are both the identity on the bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Blob {
    content: Vec<u8>,
}

impl Blob {
    /// Create a blob from raw bytes.
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// The blob's bytes.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Replace the blob's bytes.
    pub fn set_content(&mut self, content: impl Into<Vec<u8>>) {
        self.content = content.into();
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns `true` for an empty blob.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub(crate) fn parse(data: &[u8]) -> RepoResult<Self> {
        Ok(Self {
            content: data.to_vec(),
        })
    }

    pub(crate) fn serialize(&self, buf: &mut WriteBuffer) -> RepoResult<()> {
        buf.write(&self.content);
        Ok(())
    }
}
