pub mod dedup;
pub mod listing;
pub mod logging;
pub mod memory;
pub mod reader;
pub mod retry;
pub mod store;

pub use dedup::store_content;
pub use listing::{BlockListing, ListingItem};
pub use logging::LoggingStore;
pub use memory::MemoryStore;
pub use reader::{BlockReader, BytesReader, FileReader, read_declared};
pub use retry::{RetryConfig, Retryable, RetryingStore, retry_with_backoff};
pub use store::{BlockMetadata, BlockStore, PutOptions, StorageConfiguration};
