//! Object storage boundary for tickerpulse.
//!
//! Both pipeline stages talk to storage only through [`ObjectStore`]. A
//! missing object is a [`Fetch::NotFound`] value rather than an error, and
//! deletes are conditional on the content the caller last read.

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;

pub use error::StorageError;
pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;
pub use object::{content_etag, DeleteOutcome, Fetch, ObjectStore, StoredObject};
