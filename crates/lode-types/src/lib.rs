//! Core value types for the lode object store.
//!
//! Everything in a lode repository is an immutable object identified by the
//! SHA-1 digest of its canonical serialization. This crate holds the types
//! that identity is built from:
//!
//! - [`ObjectId`] -- the 20-byte content-derived identifier
//! - [`ObjectKind`] -- the fixed kind table (commit, tree, blob, tag plus
//!   the pack-only delta encodings)
//! - [`RawObject`] -- an unparsed object as it crosses the storage boundary,
//!   and the canonical `"<kind> <len>\0"` hashing pre-image
//!
//! Higher layers (the object database, packfile access, the repository
//! facade) all speak in these types; none of them re-derive identity on
//! their own.

pub mod error;
pub mod kind;
pub mod object_id;
pub mod raw;

pub use error::{TypeError, TypeResult};
pub use kind::ObjectKind;
pub use object_id::{ObjectId, OBJECT_ID_LEN};
pub use raw::{ObjectHeader, RawObject};
