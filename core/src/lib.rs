pub mod error;
pub mod history;
pub mod ordering;
pub mod types;
pub mod units;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{Error, Result};
pub use history::{BackupHistory, ManifestCatalog, ResolvedBackups, find_backups, load_history};
pub use ordering::{HistoryEntry, HistoryGroup, HistoryOptions, order_history, sort_manifests};
pub use types::*;
