//! Selecting and loading the records that take part in a run.

use crate::asin::Asin;
use crate::record::Record;
use crate::url::extract_asin;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Allow-list of record file names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetFilter {
    /// Inclusive range of numeric stems, e.g. `22..=40` for `22.json`..`40.json`.
    pub range: Option<RangeInclusive<u32>>,
    /// Accept `a.json`..`z.json`.
    pub letters: bool,
    /// File extension without the dot.
    pub extension: String,
}

impl Default for TargetFilter {
    fn default() -> Self {
        Self {
            range: Some(22..=40),
            letters: true,
            extension: "json".to_string(),
        }
    }
}

impl TargetFilter {
    /// Check whether a file name is in scope.
    pub fn matches(&self, file_name: &str) -> bool {
        let Some(stem) = file_name
            .strip_suffix(self.extension.as_str())
            .and_then(|s| s.strip_suffix('.'))
        else {
            return false;
        };

        if self.letters && stem.len() == 1 && stem.chars().all(|c| c.is_ascii_lowercase()) {
            return true;
        }

        match &self.range {
            // Reject leading zeros and signs: the stem must be the canonical rendering.
            Some(range) => stem
                .parse::<u32>()
                .is_ok_and(|n| range.contains(&n) && n.to_string() == stem),
            None => false,
        }
    }
}

/// A record in scope together with the identifier it currently carries.
#[derive(Debug, Clone)]
pub struct Target {
    pub record: Record,
    pub original: Asin,
}

/// A file that matched the allow-list but could not take part.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    pub path: PathBuf,
    pub reason: String,
}

/// Ordered records in scope, plus the ones that were skipped.
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    pub targets: Vec<Target>,
    pub skipped: Vec<SkippedRecord>,
}

impl TargetSet {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Original identifiers in iteration order.
    pub fn originals(&self) -> Vec<Asin> {
        self.targets.iter().map(|t| t.original.clone()).collect()
    }
}

/// List the file names in `dir` that pass the filter, sorted by name.
pub fn matching_files(dir: &Path, filter: &TargetFilter) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if filter.matches(name) && path.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Load every in-scope record of `dir` and attach its current identifier.
///
/// Unreadable records and records without an `asin=` parameter in
/// `url_field` are skipped with a warning; they never fail the load.
pub fn load_targets(dir: &Path, filter: &TargetFilter, url_field: &str) -> Result<TargetSet> {
    let mut set = TargetSet::default();

    for path in matching_files(dir, filter)? {
        let record = match Record::load(&path) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping {}: {:#}", path.display(), e);
                set.skipped.push(SkippedRecord {
                    path,
                    reason: format!("{:#}", e),
                });
                continue;
            }
        };

        match extract_asin(record.url(url_field)) {
            Some(original) => {
                log::debug!("{}: current ASIN {}", record.name(), original);
                set.targets.push(Target { record, original });
            }
            None => {
                log::warn!("Skipping {}: no asin found in {}", path.display(), url_field);
                set.skipped.push(SkippedRecord {
                    path,
                    reason: format!("no asin found in {}", url_field),
                });
            }
        }
    }

    log::info!(
        "Loaded {} target record(s) from {} ({} skipped)",
        set.len(),
        dir.display(),
        set.skipped.len()
    );
    Ok(set)
}
