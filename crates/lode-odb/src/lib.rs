//! Object database for the lode object store.
//!
//! The database is a priority-ordered stack of storage backends that
//! collectively answer four questions about content-addressed objects:
//! does it exist, what is it, what are its bytes, and where do new bytes
//! go. Dispatch is the whole job -- parsing, caching and typed access live
//! a layer up, in the repository.
//!
//! # Backends
//!
//! All backends implement the [`Backend`] trait:
//!
//! - [`LooseBackend`] -- one zlib-compressed file per object
//! - [`PackBackend`] -- read-only access to packfiles via `lode-pack`
//!
//! [`Odb::open`] composes both over an object directory; either silently
//! declines when its substrate is absent. Custom backends slot into the
//! same stack through [`Odb::add_backend`].

pub mod backend;
pub mod error;
pub mod loose;
pub mod odb;
pub mod pack_backend;

pub use backend::Backend;
pub use error::{OdbError, OdbResult};
pub use loose::LooseBackend;
pub use odb::Odb;
pub use pack_backend::PackBackend;
