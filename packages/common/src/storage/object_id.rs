use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use super::error::StorageError;

/// Opaque identifier of an object in a [`BlobStore`](super::BlobStore).
///
/// Backed by a UUIDv7 and rendered as 32 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Generate a fresh, time-ordered identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse a 32-character hex identifier.
    pub fn from_hex(s: &str) -> Result<Self, StorageError> {
        if s.len() != 32 {
            return Err(StorageError::InvalidId(format!(
                "expected 32 hex characters, got {}",
                s.len()
            )));
        }

        let bytes =
            hex::decode(s).map_err(|e| StorageError::InvalidId(format!("invalid hex: {e}")))?;

        let arr: [u8; 16] = bytes
            .try_into()
            .map_err(|_| StorageError::InvalidId("decoded to wrong length".into()))?;

        Ok(Self(Uuid::from_bytes(arr)))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    /// Shard directory for the filesystem layout.
    ///
    /// Taken from the last byte: the leading bytes of a UUIDv7 are a
    /// timestamp and would put every recent upload in the same shard.
    pub fn shard_prefix(&self) -> String {
        hex::encode(&self.0.as_bytes()[15..])
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
