//! Packfile substrate for the lode object store.
//!
//! A pack concatenates many objects into one zlib-entry file with an
//! external index for O(log n) random access. This crate provides the
//! read path the object database's packed backend is built on, plus a
//! minimal writer for producing packs of complete objects.
//!
//! # Architecture
//!
//! - **Pack file** (`.pack`): framed, SHA-1-sealed entry stream; entries
//!   are complete objects or deltas (offset- or id-addressed)
//! - **Pack index** (`.idx`): fan-out table + sorted ids, versions 1 and 2
//! - **[`PackReader`]**: random access with delta-chain resolution and
//!   CRC verification
//! - **[`PackWriter`]**: builds packs of complete (non-delta) objects
//! - **[`PackManager`]**: probes every pack under an object directory

pub mod delta;
pub mod entry;
pub mod error;
pub mod index;
pub mod inflate;
pub mod manager;
pub mod reader;
pub mod writer;

pub use delta::apply_delta;
pub use entry::{PackEntryHeader, PackEntryKind};
pub use error::{PackError, PackResult};
pub use index::{PackIndex, PackIndexEntry};
pub use inflate::{inflate_exact, inflate_prefix};
pub use manager::PackManager;
pub use reader::PackReader;
pub use writer::{PackFile, PackWriter};
