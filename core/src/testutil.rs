use crate::history::ManifestCatalog;
use crate::{Error, Manifest, ManifestId, Result, SourceInfo};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory manifest catalog for tests, with optional failure injection.
#[derive(Default)]
pub struct MemoryCatalog {
    manifests: Vec<(ManifestId, Manifest)>,
    fail_list_at: Option<String>,
    fail_load: bool,
    list_calls: AtomicUsize,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, manifest: Manifest) -> Self {
        self.manifests.push((id.to_string(), manifest));
        self
    }

    pub fn failing_list_at(mut self, path: &str) -> Self {
        self.fail_list_at = Some(path.to_string());
        self
    }

    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManifestCatalog for MemoryCatalog {
    async fn list_snapshot_manifests(
        &self,
        source: Option<&SourceInfo>,
        limit: Option<usize>,
    ) -> Result<Vec<ManifestId>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        if let (Some(source), Some(path)) = (source, &self.fail_list_at) {
            if &source.path == path {
                return Err(Error::Catalog(format!("listing {} failed", source)));
            }
        }

        Ok(self
            .manifests
            .iter()
            .filter(|(_, m)| source.is_none_or(|s| &m.source == s))
            .map(|(id, _)| id.clone())
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn load_snapshots(&self, ids: &[ManifestId]) -> Result<Vec<Manifest>> {
        if self.fail_load {
            return Err(Error::Catalog("loading manifests failed".to_string()));
        }

        ids.iter()
            .map(|id| {
                self.manifests
                    .iter()
                    .find(|(candidate, _)| candidate == id)
                    .map(|(_, m)| m.clone())
                    .ok_or_else(|| Error::ManifestNotFound { id: id.clone() })
            })
            .collect()
    }
}
