use crate::ordering::{HistoryGroup, HistoryOptions, order_history};
use crate::{Error, Manifest, ManifestId, Result, SourceInfo};
use async_trait::async_trait;
use tracing::{debug, info};

/// Where snapshot manifests come from. Implemented by the repository layer.
#[async_trait]
pub trait ManifestCatalog: Send + Sync {
    /// Ids of manifests recorded for `source` (all sources when `None`), up to `limit`.
    async fn list_snapshot_manifests(
        &self,
        source: Option<&SourceInfo>,
        limit: Option<usize>,
    ) -> Result<Vec<ManifestId>>;

    /// Loads manifests in the same order as `ids`.
    async fn load_snapshots(&self, ids: &[ManifestId]) -> Result<Vec<Manifest>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedBackups {
    pub manifest_ids: Vec<ManifestId>,
    /// Path of the query relative to the directory whose history was found.
    /// Empty when the query itself has history or nothing was found.
    pub relative_path: String,
}

/// Finds the nearest directory at or above `source` that has been backed up.
pub async fn find_backups<C>(catalog: &C, source: &SourceInfo) -> Result<ResolvedBackups>
where
    C: ManifestCatalog + ?Sized,
{
    let mut current = source.clone();
    let mut relative_path = String::new();

    loop {
        let manifest_ids = catalog.list_snapshot_manifests(Some(&current), None).await?;
        if !manifest_ids.is_empty() {
            debug!(
                source = %current,
                count = manifest_ids.len(),
                relative_path = %relative_path,
                "Found backups"
            );
            return Ok(ResolvedBackups {
                manifest_ids,
                relative_path,
            });
        }

        info!("No backups of {}", current);

        let Some(parent) = current.parent() else {
            break;
        };
        if let Some(name) = current.base_name() {
            relative_path = if relative_path.is_empty() {
                name
            } else {
                format!("{}/{}", name, relative_path)
            };
        }
        current = parent;
    }

    Ok(ResolvedBackups::default())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackupHistory {
    pub relative_path: String,
    pub groups: Vec<HistoryGroup>,
}

impl BackupHistory {
    /// Suffix to append to a root object id so it points at the queried path.
    pub fn path_suffix(&self) -> String {
        if self.relative_path.is_empty() {
            String::new()
        } else {
            format!("/{}", self.relative_path)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Loads and orders backup history for `query`, or for every source when `None`.
pub async fn load_history<C>(
    catalog: &C,
    query: Option<&SourceInfo>,
    options: &HistoryOptions,
) -> Result<BackupHistory>
where
    C: ManifestCatalog + ?Sized,
{
    let (manifest_ids, relative_path) = match query {
        Some(source) => {
            let resolved = find_backups(catalog, source).await?;
            (resolved.manifest_ids, resolved.relative_path)
        }
        None => (catalog.list_snapshot_manifests(None, None).await?, String::new()),
    };

    if manifest_ids.is_empty() {
        return Ok(BackupHistory {
            relative_path,
            groups: Vec::new(),
        });
    }

    let manifests = catalog.load_snapshots(&manifest_ids).await?;
    if manifests.len() != manifest_ids.len() {
        return Err(Error::Catalog(format!(
            "requested {} manifests, loaded {}",
            manifest_ids.len(),
            manifests.len()
        )));
    }

    let groups = order_history(manifest_ids.into_iter().zip(manifests).collect(), options);

    Ok(BackupHistory {
        relative_path,
        groups,
    })
}
