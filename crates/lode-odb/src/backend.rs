use lode_types::{ObjectHeader, ObjectId, RawObject};

use crate::error::{OdbError, OdbResult};

/// A storage provider the object database dispatches to.
///
/// `read` is the one mandatory capability. The others are optional: the
/// default `exists` answers `false` (a backend without the hook simply
/// never confirms), and the default `read_header` and `write` decline with
/// [`OdbError::Unsupported`], which the database treats as "try the next
/// backend". Backends never parse, validate, hash beyond what their own
/// format requires, or cache.
///
/// Backends are immutable once constructed; every capability takes `&self`.
pub trait Backend {
    /// Probe priority. Higher-priority backends are consulted first; ties
    /// are broken by insertion order.
    fn priority(&self) -> i32 {
        0
    }

    /// Read a whole object. Must fail with [`OdbError::NotFound`] when the
    /// backend does not contain the id.
    fn read(&self, id: &ObjectId) -> OdbResult<RawObject>;

    /// Cheap containment check. Backends without one never confirm.
    fn exists(&self, _id: &ObjectId) -> bool {
        false
    }

    /// Read an object's kind and size without materializing its payload.
    fn read_header(&self, _id: &ObjectId) -> OdbResult<ObjectHeader> {
        Err(OdbError::Unsupported)
    }

    /// Store an object, returning its content-derived id.
    fn write(&self, _obj: &RawObject) -> OdbResult<ObjectId> {
        Err(OdbError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lode_types::ObjectKind;

    struct ReadOnly;

    impl Backend for ReadOnly {
        fn read(&self, id: &ObjectId) -> OdbResult<RawObject> {
            Err(OdbError::NotFound(*id))
        }
    }

    #[test]
    fn defaults_decline_optional_capabilities() {
        let backend = ReadOnly;
        let id = ObjectId::null();
        assert_eq!(backend.priority(), 0);
        assert!(!backend.exists(&id));
        assert!(matches!(
            backend.read_header(&id),
            Err(OdbError::Unsupported)
        ));
        let obj = RawObject::new(ObjectKind::Blob, b"x".to_vec());
        assert!(matches!(backend.write(&obj), Err(OdbError::Unsupported)));
    }
}
