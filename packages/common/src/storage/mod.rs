mod error;
mod object_id;
mod traits;

pub mod filesystem;
pub mod memory;

pub use error::StorageError;
pub use filesystem::FilesystemBlobStore;
pub use memory::MemoryBlobStore;
pub use object_id::ObjectId;
pub use traits::{BlobStore, BoxReader, StoredObject};
