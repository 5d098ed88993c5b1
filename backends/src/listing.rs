use crate::store::BlockMetadata;
use blobkeep_core::{Error, Result};
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

const LISTING_BUFFER: usize = 64;

pub type ListingItem = Result<BlockMetadata>;

/// Lazy, single-pass enumeration of blocks fed by a producer task.
///
/// Dropping the listing before it is exhausted is fine: the producer notices
/// the closed channel on its next send and stops.
pub struct BlockListing {
    rx: mpsc::Receiver<ListingItem>,
}

impl BlockListing {
    pub fn from_receiver(rx: mpsc::Receiver<ListingItem>) -> Self {
        Self { rx }
    }

    /// A bounded channel for backends that drive their own producer.
    pub fn channel() -> (mpsc::Sender<ListingItem>, Self) {
        let (tx, rx) = mpsc::channel(LISTING_BUFFER);
        (tx, Self::from_receiver(rx))
    }

    /// Streams `items` from a spawned task. Must be called inside a tokio runtime.
    pub fn spawn<I>(items: I) -> Self
    where
        I: IntoIterator<Item = ListingItem> + Send + 'static,
        I::IntoIter: Send,
    {
        let (tx, listing) = Self::channel();
        tokio::spawn(async move {
            let mut sent = 0usize;
            for item in items {
                if tx.send(item).await.is_err() {
                    debug!(sent, "Block listing abandoned by consumer");
                    return;
                }
                sent += 1;
            }
        });
        listing
    }

    /// A listing that yields `error` once and ends.
    pub fn failed(error: Error) -> Self {
        let (tx, rx) = mpsc::channel(1);
        // Fresh channel with capacity 1, so this cannot be full.
        let _ = tx.try_send(Err(error));
        Self::from_receiver(rx)
    }

    pub async fn next_item(&mut self) -> Option<ListingItem> {
        self.rx.recv().await
    }
}

impl Stream for BlockListing {
    type Item = ListingItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
