//! Blob storage adapters
//!
//! - [`InMemoryBlobStore`] - process-local store for tests and dry runs
//! - [`FileSystemBlobStore`] - directory-backed store

pub mod filesystem;
pub mod memory;
pub mod traits;

pub use filesystem::FileSystemBlobStore;
pub use memory::InMemoryBlobStore;
pub use traits::BlobStore;
