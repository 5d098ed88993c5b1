use crate::reader::BytesReader;
use crate::store::{BlockStore, PutOptions};
use blobkeep_core::{Result, content_id};
use bytes::Bytes;
use tracing::debug;

/// Stores `data` under its content address, skipping the upload when the
/// block is already present. Returns the id and whether bytes were uploaded.
pub async fn store_content<S>(store: &S, data: Bytes) -> Result<(String, bool)>
where
    S: BlockStore + ?Sized,
{
    let id = content_id(&data);
    if store.block_exists(&id).await? {
        debug!(block_id = %id, length = data.len(), "Block already present, skipping upload");
        return Ok((id, false));
    }

    store
        .put_block(&id, BytesReader::boxed(data), PutOptions::Default)
        .await?;
    Ok((id, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn test_second_store_of_same_content_is_skipped() {
        let store = MemoryStore::new();

        let (first, uploaded) = store_content(&store, Bytes::from_static(b"chunk")).await.unwrap();
        assert!(uploaded);

        let (second, uploaded) = store_content(&store, Bytes::from_static(b"chunk")).await.unwrap();
        assert!(!uploaded);
        assert_eq!(first, second);
        assert_eq!(store.block_count().await, 1);
        assert_eq!(&store.get_block(&first).await.unwrap()[..], b"chunk");
    }

    #[tokio::test]
    async fn test_different_content_gets_different_ids() {
        let store = MemoryStore::new();

        let (a, _) = store_content(&store, Bytes::from_static(b"a")).await.unwrap();
        let (b, _) = store_content(&store, Bytes::from_static(b"b")).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(store.block_count().await, 2);
    }
}
