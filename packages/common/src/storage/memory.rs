use std::io::Cursor;

use async_trait::async_trait;
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use super::error::StorageError;
use super::object_id::ObjectId;
use super::traits::{BlobStore, BoxReader, StoredObject};

/// In-process object store for tests and throwaway deployments.
pub struct MemoryBlobStore {
    objects: DashMap<ObjectId, Vec<u8>>,
    max_size: u64,
}

impl MemoryBlobStore {
    pub fn new(max_size: u64) -> Self {
        Self {
            objects: DashMap::new(),
            max_size,
        }
    }

    /// Number of objects currently held.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new(u64::MAX)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_stream(&self, mut reader: BoxReader) -> Result<StoredObject, StorageError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;

        let size = data.len() as u64;
        if size > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: size,
                limit: self.max_size,
            });
        }

        let id = ObjectId::generate();
        let checksum = hex::encode(Sha256::digest(&data));
        self.objects.insert(id, data);

        Ok(StoredObject { id, size, checksum })
    }

    async fn get_stream(&self, id: &ObjectId) -> Result<BoxReader, StorageError> {
        let data = self
            .objects
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::NotFound(id.to_hex()))?;
        Ok(Box::new(Cursor::new(data)))
    }

    async fn exists(&self, id: &ObjectId) -> Result<bool, StorageError> {
        Ok(self.objects.contains_key(id))
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, StorageError> {
        Ok(self.objects.remove(id).is_some())
    }
}
