use crate::listing::{BlockListing, ListingItem};
use crate::reader::{BlockReader, read_declared};
use crate::store::{BlockMetadata, BlockStore, PutOptions, StorageConfiguration};
use async_trait::async_trait;
use blobkeep_core::{Error, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredBlock {
    data: Bytes,
    written: DateTime<Utc>,
}

/// Block store held entirely in memory.
///
/// With [`PutOptions::Default`], resubmitting identical content is a no-op and
/// writing different content under an existing id fails with
/// [`Error::AlreadyExists`].
pub struct MemoryStore {
    name: String,
    blocks: RwLock<HashMap<String, StoredBlock>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// The name only shows up in [`BlockStore::configuration`].
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        Ok(())
    }

    pub async fn block_count(&self) -> usize {
        self.blocks.read().await.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockStore for MemoryStore {
    async fn put_block(&self, id: &str, data: Box<dyn BlockReader>, options: PutOptions) -> Result<()> {
        self.ensure_open()?;
        let data = read_declared(data).await?;

        let mut blocks = self.blocks.write().await;
        // close() may have run while the payload was being read.
        self.ensure_open()?;
        if options == PutOptions::Default {
            if let Some(existing) = blocks.get(id) {
                if existing.data == data {
                    debug!(block_id = id, "Block already stored with identical content");
                    return Ok(());
                }
                return Err(Error::AlreadyExists { id: id.to_string() });
            }
        }

        blocks.insert(
            id.to_string(),
            StoredBlock {
                data,
                written: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete_block(&self, id: &str) -> Result<()> {
        self.ensure_open()?;
        self.blocks.write().await.remove(id);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.ensure_open()
    }

    async fn block_exists(&self, id: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.blocks.read().await.contains_key(id))
    }

    async fn get_block(&self, id: &str) -> Result<Bytes> {
        self.ensure_open()?;
        self.blocks
            .read()
            .await
            .get(id)
            .map(|block| block.data.clone())
            .ok_or_else(|| Error::BlockNotFound { id: id.to_string() })
    }

    async fn list_blocks(&self, prefix: &str) -> BlockListing {
        if let Err(e) = self.ensure_open() {
            return BlockListing::failed(e);
        }

        let matching: Vec<ListingItem> = self
            .blocks
            .read()
            .await
            .iter()
            .filter(|(id, _)| id.starts_with(prefix))
            .map(|(id, block)| {
                Ok(BlockMetadata {
                    block_id: id.clone(),
                    length: block.data.len() as u64,
                    timestamp: block.written,
                })
            })
            .collect();

        BlockListing::spawn(matching)
    }

    fn configuration(&self) -> StorageConfiguration {
        StorageConfiguration {
            kind: "memory".to_string(),
            config: serde_json::json!({ "name": self.name }),
        }
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.blocks.write().await.clear();
            debug!(store = %self.name, "Memory store closed");
        }
        Ok(())
    }
}
