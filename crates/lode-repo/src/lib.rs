//! Repository core for the lode object store.
//!
//! This crate ties the storage layers together into the typed view callers
//! actually use: a [`Repository`] discovered from (or explicitly given) an
//! on-disk layout, a digest-keyed [`ObjectCache`] guaranteeing one live
//! instance per object, and the lookup / write-back pipelines that move
//! objects between their parsed form and the object database.
//!
//! # Object lifecycle
//!
//! - [`Repository::lookup`] reads raw bytes through the database, parses
//!   them into a typed [`Object`], and caches the instance. Repeated
//!   lookups of one digest return the same handle.
//! - [`Repository::new_object`] creates an in-memory object with no digest;
//!   it stays outside the cache until written.
//! - [`Repository::write_object`] serializes a modified object into its
//!   source slot, stores it, and rebinds the cache under the new digest.
//!
//! A repository handle is single-threaded; open one handle per thread when
//! the same directory must be used concurrently.

pub mod blob;
pub mod cache;
pub mod commit;
pub mod error;
pub mod object;
pub mod repository;
pub mod signature;
pub mod source;
pub mod tag;
pub mod tree;

pub use blob::Blob;
pub use cache::ObjectCache;
pub use commit::Commit;
pub use error::{RepoError, RepoResult};
pub use object::{Object, ObjectHandle};
pub use repository::{Repository, RepositoryLayout};
pub use signature::Signature;
pub use source::WriteBuffer;
pub use tag::Tag;
pub use tree::{EntryMode, Tree, TreeEntry};

// Re-export the identity types so embedders rarely need lode-types
// directly.
pub use lode_types::{ObjectId, ObjectKind, RawObject};
