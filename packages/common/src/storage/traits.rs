use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::object_id::ObjectId;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Receipt for a freshly stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub id: ObjectId,
    /// Number of bytes written.
    pub size: u64,
    /// Lowercase hex SHA-256 of the content.
    pub checksum: String,
}

/// Object storage keyed by opaque, store-assigned identifiers.
///
/// Every `put` creates a new object, even for identical content, so each
/// object has exactly one owner and can be deleted independently.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and return the receipt.
    async fn put(&self, data: &[u8]) -> Result<StoredObject, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(reader).await
    }

    /// Store data from an async reader and return the receipt.
    async fn put_stream(&self, reader: BoxReader) -> Result<StoredObject, StorageError>;

    /// Retrieve all bytes of an object.
    async fn get(&self, id: &ObjectId) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(id).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve an object as a streaming async reader.
    async fn get_stream(&self, id: &ObjectId) -> Result<BoxReader, StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, id: &ObjectId) -> Result<bool, StorageError>;

    /// Delete an object.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, id: &ObjectId) -> Result<bool, StorageError>;

}
