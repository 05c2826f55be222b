use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::object_id::ObjectId;
use super::traits::{BlobStore, BoxReader, StoredObject};

/// Filesystem-backed object store.
///
/// Objects live in a sharded directory layout:
/// `{base_path}/{last 2 hex chars}/{32 hex chars}`.
/// Writes go to `{base_path}/.tmp` first and are renamed into place, so a
/// reader never observes a partially written object.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        self.base_path.join(id.shard_prefix()).join(id.to_hex())
    }

    fn temp_path(&self, id: &ObjectId) -> PathBuf {
        self.base_path.join(".tmp").join(id.to_hex())
    }
}

/// A file under `.tmp` that is deleted on drop unless it was moved into place.
struct TempObject {
    path: PathBuf,
    persisted: bool,
}

impl TempObject {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            persisted: false,
        }
    }

    async fn persist(mut self, dest: &Path) -> Result<(), StorageError> {
        fs::rename(&self.path, dest).await?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for TempObject {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put_stream(&self, mut reader: BoxReader) -> Result<StoredObject, StorageError> {
        let id = ObjectId::generate();
        // Every early return below drops `temp`, which removes the file.
        let temp = TempObject::new(self.temp_path(&id));
        let mut hasher = Sha256::new();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024];
        let mut temp_file = fs::File::create(&temp.path).await?;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            hasher.update(&buf[..n]);
            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        drop(temp_file);

        let object_path = self.object_path(&id);
        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        temp.persist(&object_path).await?;

        Ok(StoredObject {
            id,
            size: total_bytes,
            checksum: hex::encode(hasher.finalize()),
        })
    }

    async fn get_stream(&self, id: &ObjectId) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.object_path(id)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(id.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, id: &ObjectId) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.object_path(id)).await?)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, StorageError> {
        match fs::remove_file(self.object_path(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
