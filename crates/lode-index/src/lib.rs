//! Working-directory index reader for the lode object store.
//!
//! The index is the binary file mapping tracked paths to blob ids plus the
//! stat data used for cheap change detection. This crate parses it into an
//! ordered, path-keyed table; mutating and writing the index back is the
//! responsibility of higher tooling.

pub mod entry;
pub mod error;
pub mod index;

pub use entry::{IndexEntry, IndexTime};
pub use error::{IndexError, IndexResult};
pub use index::Index;
