use crate::listing::BlockListing;
use crate::reader::BlockReader;
use async_trait::async_trait;
use blobkeep_core::Result;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PutOptions {
    /// Keep an existing block. What happens on a collision is documented per backend,
    /// but resubmitting identical content is always safe.
    #[default]
    Default,
    /// Replace whatever is stored under the id.
    Overwrite,
}

/// Contract every block storage backend honours.
///
/// * After a successful `put_block`, `block_exists` is true and `get_block`
///   returns the exact bytes written until `delete_block`.
/// * `delete_block` of a missing id succeeds.
/// * A failed `put_block` leaves the block either absent or fully written.
/// * Once `close` has been called every other operation fails with
///   [`Error::Closed`](blobkeep_core::Error::Closed).
/// * Operations on different ids never block or corrupt each other.
#[async_trait]
pub trait BlockStore: Send + Sync {
    async fn put_block(&self, id: &str, data: Box<dyn BlockReader>, options: PutOptions) -> Result<()>;

    async fn delete_block(&self, id: &str) -> Result<()>;

    async fn flush(&self) -> Result<()>;

    /// Cheap existence check; never transfers block content.
    async fn block_exists(&self, id: &str) -> Result<bool>;

    async fn get_block(&self, id: &str) -> Result<Bytes>;

    /// Lazily enumerates blocks whose id starts with `prefix`, in no particular order.
    /// Failures for individual blocks are reported as `Err` items.
    ///
    /// Must be awaited inside a tokio runtime: implementations may feed the
    /// listing from a spawned task (see [`BlockListing::spawn`]).
    async fn list_blocks(&self, prefix: &str) -> BlockListing;

    /// Backend identification, answered without I/O.
    fn configuration(&self) -> StorageConfiguration;

    async fn close(&self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMetadata {
    pub block_id: String,
    pub length: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfiguration {
    #[serde(rename = "type")]
    pub kind: String,
    pub config: serde_json::Value,
}
