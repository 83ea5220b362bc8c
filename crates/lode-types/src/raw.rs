use sha1::{Digest, Sha1};

use crate::error::{TypeError, TypeResult};
use crate::kind::ObjectKind;
use crate::object_id::ObjectId;

/// An unparsed object as it crosses the storage boundary: a kind tag plus
/// the payload bytes.
///
/// This is the unit the object database reads and writes. Identity is
/// derived from it: hashing the canonical header followed by the payload
/// yields the object's [`ObjectId`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawObject {
    /// The kind of this object.
    pub kind: ObjectKind,
    /// The payload bytes. May be empty.
    pub data: Vec<u8>,
}

/// An object's kind and payload length, without the payload itself.
///
/// Returned by header-only reads, where a backend can answer "what is this
/// object" without materializing its bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectHeader {
    pub kind: ObjectKind,
    pub len: usize,
}

impl RawObject {
    /// Create a raw object from a kind and payload.
    pub fn new(kind: ObjectKind, data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            data: data.into(),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The kind and length of this object.
    pub fn header(&self) -> ObjectHeader {
        ObjectHeader {
            kind: self.kind,
            len: self.data.len(),
        }
    }

    /// The canonical hashing pre-image header: the lowercase kind name, one
    /// space, the decimal payload length, one trailing NUL.
    ///
    /// Fails with [`TypeError::NotLoose`] for kinds that cannot be stored
    /// standalone.
    pub fn header_bytes(&self) -> TypeResult<Vec<u8>> {
        if !self.kind.is_loose() {
            return Err(TypeError::NotLoose(self.kind));
        }
        Ok(format!("{} {}\0", self.kind.name(), self.data.len()).into_bytes())
    }

    /// Compute this object's content-addressed id.
    ///
    /// The digest input is exactly `"<kind> <len>\0"` followed by the
    /// payload, with no separator. The NUL is part of the input.
    pub fn id(&self) -> TypeResult<ObjectId> {
        let header = self.header_bytes()?;
        let mut hasher = Sha1::new();
        hasher.update(&header);
        hasher.update(&self.data);
        Ok(ObjectId::from_raw(hasher.finalize().into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_hash_vector() {
        // SHA1("blob 5\0hello")
        let obj = RawObject::new(ObjectKind::Blob, b"hello".to_vec());
        assert_eq!(
            obj.id().unwrap().to_hex(),
            "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0"
        );
    }

    #[test]
    fn header_includes_nul() {
        let obj = RawObject::new(ObjectKind::Blob, b"hello".to_vec());
        assert_eq!(obj.header_bytes().unwrap(), b"blob 5\0");
    }

    #[test]
    fn zero_length_object_hashes() {
        let obj = RawObject::new(ObjectKind::Blob, Vec::new());
        assert!(obj.is_empty());
        assert!(obj.id().is_ok());
    }

    #[test]
    fn delta_kinds_do_not_hash() {
        for kind in [
            ObjectKind::OfsDelta,
            ObjectKind::RefDelta,
            ObjectKind::Ext1,
            ObjectKind::Ext2,
            ObjectKind::Bad,
        ] {
            let obj = RawObject::new(kind, b"x".to_vec());
            assert!(matches!(obj.id(), Err(TypeError::NotLoose(_))));
        }
    }

    #[test]
    fn same_payload_different_kind_differs() {
        let blob = RawObject::new(ObjectKind::Blob, b"data".to_vec());
        let tag = RawObject::new(ObjectKind::Tag, b"data".to_vec());
        assert_ne!(blob.id().unwrap(), tag.id().unwrap());
    }

    #[test]
    fn header_reports_kind_and_len() {
        let obj = RawObject::new(ObjectKind::Tree, vec![0u8; 42]);
        let header = obj.header();
        assert_eq!(header.kind, ObjectKind::Tree);
        assert_eq!(header.len, 42);
    }
}
