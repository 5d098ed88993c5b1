use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

pub type ManifestId = String;

/// Derives the content address of a block payload: the lowercase hex BLAKE3 digest.
pub fn content_id(data: &[u8]) -> String {
    hex::encode(blake3::hash(data).as_bytes())
}

/// A logical backup source: what was backed up, and by whom on which machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceInfo {
    pub host: String,
    pub user_name: String,
    pub path: String,
}

impl SourceInfo {
    pub fn new(
        host: impl Into<String>,
        user_name: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user_name: user_name.into(),
            path: path.into(),
        }
    }

    /// Parses either `user@host:/path` or a plain filesystem path.
    ///
    /// Plain paths are made absolute against the current directory and
    /// normalised; they take `default_host` and `default_user`.
    pub fn parse(text: &str, default_host: &str, default_user: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidSource {
            source_text: text.to_string(),
            reason: reason.to_string(),
        };

        if text.is_empty() {
            return Err(invalid("empty path"));
        }

        if let Some((user_host, path)) = text.split_once(':') {
            if let Some((user, host)) = user_host.split_once('@') {
                if user.is_empty() || host.is_empty() {
                    return Err(invalid("expected user@host:path"));
                }
                if path.is_empty() {
                    return Err(invalid("empty path"));
                }
                return Ok(Self::new(host, user, normalize(Path::new(path))));
            }
        }

        let path = Path::new(text);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        Ok(Self::new(default_host, default_user, normalize(&absolute)))
    }

    /// The source one directory up, or `None` once the path is a root.
    pub fn parent(&self) -> Option<SourceInfo> {
        let parent = Path::new(&self.path).parent()?;
        let parent = parent.to_string_lossy();
        if parent.is_empty() || parent == self.path {
            return None;
        }
        Some(Self::new(&self.host, &self.user_name, parent.into_owned()))
    }

    /// Last component of the path, if the path has one.
    pub fn base_name(&self) -> Option<String> {
        Path::new(&self.path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user_name, self.host, self.path)
    }
}

fn normalize(path: &Path) -> String {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        return path.to_string_lossy().into_owned();
    }
    out.to_string_lossy().into_owned()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotStats {
    pub total_file_size: u64,
    #[serde(default)]
    pub file_count: u64,
    #[serde(default)]
    pub dir_count: u64,
}

/// Record of one backup run of a source. Produced by the backup side and only read here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub source: SourceInfo,
    pub root_object_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incomplete_reason: Option<String>,
    pub stats: SnapshotStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_cache_id: Option<String>,
}

impl Manifest {
    pub fn new(source: SourceInfo, root_object_id: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            source,
            root_object_id: root_object_id.into(),
            start_time,
            end_time: start_time,
            incomplete_reason: None,
            stats: SnapshotStats::default(),
            hash_cache_id: None,
        }
    }

    pub fn with_total_file_size(mut self, size: u64) -> Self {
        self.stats.total_file_size = size;
        self
    }

    pub fn with_incomplete_reason(mut self, reason: impl Into<String>) -> Self {
        self.incomplete_reason = Some(reason.into());
        self
    }

    pub fn with_hash_cache_id(mut self, id: impl Into<String>) -> Self {
        self.hash_cache_id = Some(id.into());
        self
    }

    /// An empty reason counts as complete.
    pub fn is_incomplete(&self) -> bool {
        self.incomplete_reason
            .as_deref()
            .is_some_and(|reason| !reason.is_empty())
    }

    pub fn total_file_size(&self) -> u64 {
        self.stats.total_file_size
    }
}
