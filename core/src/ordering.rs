use crate::{Manifest, ManifestId, SourceInfo};
use serde::{Deserialize, Serialize};

fn default_max_results() -> usize {
    100
}

/// Controls which snapshots a history listing shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryOptions {
    /// Show runs that did not finish, marked with their reason.
    #[serde(default)]
    pub include_incomplete: bool,
    /// Maximum number of entries displayed per source.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            include_incomplete: false,
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: ManifestId,
    pub manifest: Manifest,
    /// Growth in total file size against the last complete snapshot of the same source.
    pub delta: Option<u64>,
    /// Over the per-source display cap.
    pub suppressed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryGroup {
    pub source: SourceInfo,
    pub entries: Vec<HistoryEntry>,
}

impl HistoryGroup {
    pub fn displayed(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().filter(|entry| !entry.suppressed)
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }
}

/// Sorts by the canonical source string, then by start time.
pub fn sort_manifests(manifests: &mut [(ManifestId, Manifest)]) {
    manifests.sort_by_cached_key(|(_, m)| (m.source.to_string(), m.start_time));
}

/// Orders manifests into per-source groups and annotates size deltas.
///
/// Excluded incomplete runs are dropped before they can start a group or move
/// the delta baseline. Included incomplete runs are shown but never become the
/// baseline for the next delta.
pub fn order_history(
    mut manifests: Vec<(ManifestId, Manifest)>,
    options: &HistoryOptions,
) -> Vec<HistoryGroup> {
    sort_manifests(&mut manifests);

    let mut groups: Vec<HistoryGroup> = Vec::new();
    let mut last_total_file_size = 0u64;
    let mut count = 0usize;

    for (id, manifest) in manifests {
        let incomplete = manifest.is_incomplete();
        if incomplete && !options.include_incomplete {
            continue;
        }

        let size = manifest.total_file_size();
        let new_group = groups
            .last()
            .is_none_or(|group| group.source != manifest.source);
        if new_group {
            groups.push(HistoryGroup {
                source: manifest.source.clone(),
                entries: Vec::new(),
            });
            count = 0;
            last_total_file_size = size;
        }

        let delta = size
            .checked_sub(last_total_file_size)
            .filter(|growth| *growth > 0);
        let suppressed = count >= options.max_results;
        count += 1;

        if !incomplete {
            last_total_file_size = size;
        }

        if let Some(group) = groups.last_mut() {
            group.entries.push(HistoryEntry {
                id,
                manifest,
                delta,
                suppressed,
            });
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn manifest(path: &str, secs: i64, size: u64) -> Manifest {
        Manifest::new(SourceInfo::new("host", "user", path), format!("k{secs}"), at(secs))
            .with_total_file_size(size)
    }

    fn ids(manifests: Vec<Manifest>) -> Vec<(ManifestId, Manifest)> {
        manifests
            .into_iter()
            .enumerate()
            .map(|(i, m)| (format!("m{i}"), m))
            .collect()
    }

    fn deltas(group: &HistoryGroup) -> Vec<Option<u64>> {
        group.entries.iter().map(|e| e.delta).collect()
    }

    #[test]
    fn test_sources_are_contiguous_and_chronological() {
        let input = ids(vec![
            manifest("/b", 3, 1),
            manifest("/a", 5, 1),
            manifest("/b", 1, 1),
            manifest("/a", 2, 1),
            manifest("/b", 2, 1),
            manifest("/a", 9, 1),
        ]);

        let groups = order_history(input, &HistoryOptions::default());

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].source.path, "/a");
        assert_eq!(groups[1].source.path, "/b");
        for group in &groups {
            assert!(group.entries.iter().all(|e| e.manifest.source == group.source));
            let times: Vec<_> = group.entries.iter().map(|e| e.manifest.start_time).collect();
            assert!(times.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_sort_uses_canonical_string_not_path_alone() {
        let mut input = ids(vec![
            Manifest::new(SourceInfo::new("h", "zed", "/a"), "k", at(0)),
            Manifest::new(SourceInfo::new("h", "amy", "/z"), "k", at(1)),
        ]);
        sort_manifests(&mut input);
        assert_eq!(input[0].1.source.user_name, "amy");
    }

    #[test]
    fn test_only_growth_is_reported() {
        let input = ids(vec![
            manifest("/a", 1, 100),
            manifest("/a", 2, 150),
            manifest("/a", 3, 120),
        ]);

        let groups = order_history(input, &HistoryOptions::default());

        assert_eq!(deltas(&groups[0]), vec![None, Some(50), None]);
    }

    #[test]
    fn test_skipped_incomplete_does_not_move_baseline() {
        let input = ids(vec![
            manifest("/a", 1, 100),
            manifest("/a", 2, 130).with_incomplete_reason("canceled"),
            manifest("/a", 3, 150),
        ]);

        let groups = order_history(input, &HistoryOptions::default());

        assert_eq!(groups[0].total(), 2);
        assert_eq!(deltas(&groups[0]), vec![None, Some(50)]);
    }

    #[test]
    fn test_included_incomplete_is_shown_but_not_a_baseline() {
        let input = ids(vec![
            manifest("/a", 1, 100),
            manifest("/a", 2, 130).with_incomplete_reason("canceled"),
            manifest("/a", 3, 150),
        ]);
        let options = HistoryOptions {
            include_incomplete: true,
            ..Default::default()
        };

        let groups = order_history(input, &options);

        assert_eq!(groups[0].total(), 3);
        assert!(groups[0].entries[1].manifest.is_incomplete());
        assert_eq!(deltas(&groups[0]), vec![None, Some(30), Some(50)]);
    }

    #[test]
    fn test_group_of_only_incomplete_runs_disappears_when_excluded() {
        let input = ids(vec![
            manifest("/a", 1, 100).with_incomplete_reason("killed"),
            manifest("/b", 1, 100),
        ]);

        let groups = order_history(input, &HistoryOptions::default());

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].source.path, "/b");
    }

    #[test]
    fn test_display_cap_suppresses_but_keeps_processing() {
        let input = ids((0..5).map(|i| manifest("/a", i, 100 + 10 * i as u64)).collect());
        let options = HistoryOptions {
            max_results: 2,
            ..Default::default()
        };

        let groups = order_history(input, &options);

        assert_eq!(groups[0].total(), 5);
        assert_eq!(groups[0].displayed().count(), 2);
        assert_eq!(
            deltas(&groups[0]),
            vec![None, Some(10), Some(10), Some(10), Some(10)]
        );
    }

    #[test]
    fn test_cap_resets_per_source() {
        let input = ids(vec![
            manifest("/a", 1, 1),
            manifest("/a", 2, 1),
            manifest("/b", 1, 1),
            manifest("/b", 2, 1),
        ]);
        let options = HistoryOptions {
            max_results: 1,
            ..Default::default()
        };

        let groups = order_history(input, &options);

        assert_eq!(groups[0].displayed().count(), 1);
        assert_eq!(groups[1].displayed().count(), 1);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: HistoryOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, HistoryOptions::default());
        assert_eq!(options.max_results, 100);
    }
}
