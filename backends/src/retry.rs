use crate::listing::BlockListing;
use crate::reader::BlockReader;
use crate::store::{BlockStore, PutOptions, StorageConfiguration};
use async_trait::async_trait;
use blobkeep_core::{Error, Result};
use bytes::Bytes;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// How transient store failures are retried. Loadable from a config file;
/// missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts in total, counting the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay_ms: u64,
    /// Upper bound for any single delay, jitter excluded.
    pub max_delay_ms: u64,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 250,
            max_delay_ms: 20_000,
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// For lookups a caller is waiting on, such as the dedup existence check.
    pub fn interactive() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 25,
            max_delay_ms: 1_000,
            ..Self::default()
        }
    }

    /// For background work like flushes that should outlast a backend restart.
    pub fn patient() -> Self {
        Self {
            max_attempts: 12,
            base_delay_ms: 500,
            max_delay_ms: 120_000,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (zero-based).
    fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let grown = self.base_delay_ms as f64 * self.multiplier.powi(exponent);
        let capped_ms = grown.min(self.max_delay_ms as f64) as u64;

        let jitter_ms = if self.jitter && capped_ms >= 4 {
            rand::thread_rng().gen_range(0..=capped_ms / 4)
        } else {
            0
        };

        Duration::from_millis(capped_ms + jitter_ms)
    }
}

/// Whether an error is worth another attempt
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for Error {
    fn is_retryable(&self) -> bool {
        // Anything else (missing or conflicting blocks, closed stores, bad
        // payloads) fails the same way on every attempt.
        matches!(self, Error::BackendUnavailable(_) | Error::Io(_))
    }
}

/// Retry a future operation with exponential backoff
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let error = match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(error) => error,
        };

        if !error.is_retryable() {
            debug!(
                operation = operation_name,
                error = %error,
                "Error is not retryable, failing immediately"
            );
            return Err(error);
        }

        attempt += 1;
        if attempt >= max_attempts {
            warn!(
                operation = operation_name,
                max_attempts,
                error = %error,
                "Operation failed after all retry attempts"
            );
            return Err(error);
        }

        let backoff = config.delay_for(attempt - 1);
        warn!(
            operation = operation_name,
            attempt,
            max_attempts,
            backoff_ms = backoff.as_millis() as u64,
            error = %error,
            "Operation failed, retrying after backoff"
        );
        sleep(backoff).await;
    }
}

/// Retries idempotent operations of the wrapped store on transient failures.
///
/// `put_block` is attempted once: its reader is consumed by the first attempt.
pub struct RetryingStore<S> {
    inner: S,
    config: RetryConfig,
}

impl<S: BlockStore> RetryingStore<S> {
    pub fn new(inner: S, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: BlockStore> BlockStore for RetryingStore<S> {
    async fn put_block(&self, id: &str, data: Box<dyn BlockReader>, options: PutOptions) -> Result<()> {
        self.inner.put_block(id, data, options).await
    }

    async fn delete_block(&self, id: &str) -> Result<()> {
        retry_with_backoff(&self.config, "delete_block", || self.inner.delete_block(id)).await
    }

    async fn flush(&self) -> Result<()> {
        retry_with_backoff(&self.config, "flush", || self.inner.flush()).await
    }

    async fn block_exists(&self, id: &str) -> Result<bool> {
        retry_with_backoff(&self.config, "block_exists", || self.inner.block_exists(id)).await
    }

    async fn get_block(&self, id: &str) -> Result<Bytes> {
        retry_with_backoff(&self.config, "get_block", || self.inner.get_block(id)).await
    }

    async fn list_blocks(&self, prefix: &str) -> BlockListing {
        self.inner.list_blocks(prefix).await
    }

    fn configuration(&self) -> StorageConfiguration {
        self.inner.configuration()
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}
