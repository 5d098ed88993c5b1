use crate::listing::BlockListing;
use crate::reader::BlockReader;
use crate::store::{BlockStore, PutOptions, StorageConfiguration};
use async_trait::async_trait;
use blobkeep_core::Result;
use bytes::Bytes;
use std::time::Instant;
use tracing::{debug, warn};

/// Traces every call made to the wrapped store.
pub struct LoggingStore<S> {
    inner: S,
    label: String,
}

impl<S: BlockStore> LoggingStore<S> {
    pub fn new(inner: S, label: impl Into<String>) -> Self {
        Self {
            inner,
            label: label.into(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn record<T>(&self, operation: &str, id: &str, started: Instant, result: &Result<T>) {
        let elapsed_us = started.elapsed().as_micros() as u64;
        match result {
            Ok(_) => debug!(
                store = %self.label,
                operation,
                block_id = id,
                elapsed_us,
                "Block store call succeeded"
            ),
            Err(e) => warn!(
                store = %self.label,
                operation,
                block_id = id,
                elapsed_us,
                error = %e,
                "Block store call failed"
            ),
        }
    }
}

#[async_trait]
impl<S: BlockStore> BlockStore for LoggingStore<S> {
    async fn put_block(&self, id: &str, data: Box<dyn BlockReader>, options: PutOptions) -> Result<()> {
        let started = Instant::now();
        debug!(store = %self.label, block_id = id, length = data.len(), ?options, "put_block");
        let result = self.inner.put_block(id, data, options).await;
        self.record("put_block", id, started, &result);
        result
    }

    async fn delete_block(&self, id: &str) -> Result<()> {
        let started = Instant::now();
        let result = self.inner.delete_block(id).await;
        self.record("delete_block", id, started, &result);
        result
    }

    async fn flush(&self) -> Result<()> {
        let started = Instant::now();
        let result = self.inner.flush().await;
        self.record("flush", "", started, &result);
        result
    }

    async fn block_exists(&self, id: &str) -> Result<bool> {
        let started = Instant::now();
        let result = self.inner.block_exists(id).await;
        self.record("block_exists", id, started, &result);
        result
    }

    async fn get_block(&self, id: &str) -> Result<Bytes> {
        let started = Instant::now();
        let result = self.inner.get_block(id).await;
        self.record("get_block", id, started, &result);
        result
    }

    async fn list_blocks(&self, prefix: &str) -> BlockListing {
        debug!(store = %self.label, prefix, "list_blocks");
        self.inner.list_blocks(prefix).await
    }

    fn configuration(&self) -> StorageConfiguration {
        self.inner.configuration()
    }

    async fn close(&self) -> Result<()> {
        let started = Instant::now();
        let result = self.inner.close().await;
        self.record("close", "", started, &result);
        result
    }
}
