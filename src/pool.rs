//! Loading the candidate identifier pool.

use crate::asin::Asin;
use eyre::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Fatal pool loading failures.
#[derive(Debug)]
pub enum PoolError {
    /// The identifier source does not exist.
    Missing(PathBuf),
    /// No valid identifier survived filtering.
    Empty(String),
}

impl std::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolError::Missing(path) => write!(f, "identifier source not found: {}", path.display()),
            PoolError::Empty(source) => write!(f, "no valid ASIN in {} after filtering", source),
        }
    }
}

impl std::error::Error for PoolError {}

/// A source line that failed the ASIN shape check.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidLine {
    /// 1-based position among non-blank lines.
    pub line: usize,
    pub value: String,
}

/// Ordered set of unique identifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AsinPool {
    asins: Vec<Asin>,
}

impl AsinPool {
    /// Build a pool from already-validated identifiers, dropping repeats.
    pub fn from_asins(asins: impl IntoIterator<Item = Asin>) -> Self {
        let mut seen = HashSet::new();
        let asins = asins.into_iter().filter(|a| seen.insert(a.clone())).collect();
        Self { asins }
    }

    pub fn len(&self) -> usize {
        self.asins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asins.is_empty()
    }

    pub fn as_slice(&self) -> &[Asin] {
        &self.asins
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Asin> {
        self.asins.iter()
    }
}

/// Result of parsing a raw identifier source.
#[derive(Debug, Clone, Default)]
pub struct PoolLoad {
    pub pool: AsinPool,
    pub invalid: Vec<InvalidLine>,
}

/// Normalize, validate and deduplicate raw candidate lines.
///
/// Blank lines are ignored and do not advance the line counter.
pub fn parse_lines<I, S>(lines: I) -> PoolLoad
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut valid = Vec::new();
    let mut invalid = Vec::new();

    let non_blank = lines
        .into_iter()
        .map(|l| l.as_ref().trim().to_string())
        .filter(|l| !l.is_empty());

    for (idx, raw) in non_blank.enumerate() {
        match Asin::parse(&raw) {
            Ok(asin) => valid.push(asin),
            Err(e) => {
                log::warn!("Ignoring invalid ASIN on line {}: '{}' ({})", idx + 1, raw, e);
                invalid.push(InvalidLine {
                    line: idx + 1,
                    value: raw.to_ascii_uppercase(),
                });
            }
        }
    }

    PoolLoad {
        pool: AsinPool::from_asins(valid),
        invalid,
    }
}

/// Fail with [`PoolError::Empty`] if nothing usable was loaded.
pub fn require_non_empty(load: PoolLoad, source: &str) -> Result<PoolLoad> {
    if load.pool.is_empty() {
        return Err(eyre::eyre!(PoolError::Empty(source.to_string())));
    }
    Ok(load)
}

/// Load a newline-delimited identifier file.
pub fn load_text_file(path: &Path) -> Result<PoolLoad> {
    if !path.is_file() {
        return Err(eyre::eyre!(PoolError::Missing(path.to_path_buf())));
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let load = require_non_empty(parse_lines(content.lines()), &path.display().to_string())?;
    log::info!("Loaded {} unique ASINs from {}", load.pool.len(), path.display());
    Ok(load)
}
