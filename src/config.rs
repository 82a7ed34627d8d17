//! Run configuration: presets, an optional YAML file, and CLI overrides.
//!
//! Layers apply in order preset < file < command line. The file is either
//! given explicitly or picked up as `asin-shuffle.yml` in the working
//! directory.

use crate::assign::DEFAULT_SHUFFLE_ATTEMPTS;
use crate::plan::PlanPolicy;
use crate::record::DEFAULT_URL_FIELD;
use crate::sheet::{DEFAULT_COLUMN, DEFAULT_SHEET, DEFAULT_WORKBOOK};
use crate::target::TargetFilter;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "asin-shuffle.yml";

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    UnknownPreset(String),
    InvalidCap(String),
    InvalidRange(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnknownPreset(p) => {
                write!(f, "unknown preset '{}' (expected observed, text, sheet or text-41-100)", p)
            }
            ConfigError::InvalidCap(c) => write!(f, "invalid cap '{}': expected a positive integer or 'none'", c),
            ConfigError::InvalidRange(r) => write!(f, "invalid range '{}': expected START-END or 'none'", r),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Ready-made setups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preset {
    /// Reshuffle the identifiers the records already carry.
    #[serde(rename = "observed")]
    Observed,
    /// `asins.txt`, records 22-40 and a-z, every ASIN at least once.
    #[serde(rename = "text")]
    Text,
    /// `asins.xlsx`, records 22-40 and a-z, every ASIN at least once.
    #[serde(rename = "sheet")]
    Sheet,
    /// `asins_41_100.txt`, records 41-100, at most two uses per ASIN.
    #[serde(rename = "text-41-100")]
    Text41To100,
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "observed" => Ok(Preset::Observed),
            "text" => Ok(Preset::Text),
            "sheet" => Ok(Preset::Sheet),
            "text-41-100" => Ok(Preset::Text41To100),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

/// Where candidate identifiers come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// Newline-delimited text file.
    Text { path: PathBuf },
    /// Workbook column; generated from the records when absent.
    Sheet {
        path: PathBuf,
        #[serde(default = "default_sheet")]
        sheet: String,
        #[serde(default = "default_column")]
        column: String,
    },
    /// The identifiers the target records carry now.
    Observed,
}

fn default_sheet() -> String {
    DEFAULT_SHEET.to_string()
}

fn default_column() -> String {
    DEFAULT_COLUMN.to_string()
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub dir: PathBuf,
    pub source: SourceConfig,
    pub filter: TargetFilter,
    pub url_field: String,
    pub policy: PlanPolicy,
    pub avoid_fixed_points: bool,
    pub shuffle_attempts: usize,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

/// One partial layer of settings; unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    pub preset: Option<String>,
    pub source: Option<SourceConfig>,
    /// `START-END` or `none`.
    pub range: Option<String>,
    pub letters: Option<bool>,
    pub extension: Option<String>,
    pub url_field: Option<String>,
    pub cap: Option<CapValue>,
    pub coverage: Option<bool>,
    pub avoid_fixed_points: Option<bool>,
    pub shuffle_attempts: Option<usize>,
    pub dry_run: Option<bool>,
    pub seed: Option<String>,
}

/// A reuse cap as written in a config layer: a number or `none`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CapValue {
    Limit(usize),
    Text(String),
}

impl CapValue {
    pub fn parse(&self) -> Result<Option<usize>, ConfigError> {
        match self {
            CapValue::Limit(0) => Err(ConfigError::InvalidCap("0".to_string())),
            CapValue::Limit(cap) => Ok(Some(*cap)),
            CapValue::Text(s) => parse_cap(s),
        }
    }
}

/// Parse `2`, `3`, ... or `none`.
pub fn parse_cap(s: &str) -> Result<Option<usize>, ConfigError> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match s.parse::<usize>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidCap(s.to_string())),
        Ok(cap) => Ok(Some(cap)),
    }
}

/// Parse `22-40` or `none`.
pub fn parse_range(s: &str) -> Result<Option<RangeInclusive<u32>>, ConfigError> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let invalid = || ConfigError::InvalidRange(s.to_string());
    let (start, end) = s.split_once('-').ok_or_else(invalid)?;
    let start: u32 = start.trim().parse().map_err(|_| invalid())?;
    let end: u32 = end.trim().parse().map_err(|_| invalid())?;
    if start > end {
        return Err(invalid());
    }
    Ok(Some(start..=end))
}

impl Config {
    /// Settings of a preset rooted at `dir`.
    pub fn from_preset(preset: Preset, dir: impl Into<PathBuf>) -> Self {
        let mut config = Self {
            dir: dir.into(),
            source: SourceConfig::Text {
                path: PathBuf::from("asins.txt"),
            },
            filter: TargetFilter::default(),
            url_field: DEFAULT_URL_FIELD.to_string(),
            policy: PlanPolicy {
                cap: None,
                coverage: true,
            },
            avoid_fixed_points: true,
            shuffle_attempts: DEFAULT_SHUFFLE_ATTEMPTS,
            dry_run: false,
            seed: None,
        };

        match preset {
            Preset::Observed => {
                config.source = SourceConfig::Observed;
            }
            Preset::Text => {
                config.shuffle_attempts = 500;
            }
            Preset::Sheet => {
                config.source = SourceConfig::Sheet {
                    path: PathBuf::from(DEFAULT_WORKBOOK),
                    sheet: default_sheet(),
                    column: default_column(),
                };
                config.shuffle_attempts = 800;
            }
            Preset::Text41To100 => {
                config.source = SourceConfig::Text {
                    path: PathBuf::from("asins_41_100.txt"),
                };
                config.filter.range = Some(41..=100);
                config.filter.letters = false;
                config.policy.cap = Some(2);
            }
        }

        config
    }

    /// Apply the set fields of `layer` on top of this config.
    pub fn apply(&mut self, layer: &ConfigLayer) -> Result<(), ConfigError> {
        if let Some(source) = &layer.source {
            self.source = source.clone();
        }
        if let Some(range) = &layer.range {
            self.filter.range = parse_range(range)?;
        }
        if let Some(letters) = layer.letters {
            self.filter.letters = letters;
        }
        if let Some(ext) = &layer.extension {
            self.filter.extension = ext.trim_start_matches('.').to_string();
        }
        if let Some(field) = &layer.url_field {
            self.url_field = field.clone();
        }
        if let Some(cap) = &layer.cap {
            self.policy.cap = cap.parse()?;
        }
        if let Some(coverage) = layer.coverage {
            self.policy.coverage = coverage;
        }
        if let Some(avoid) = layer.avoid_fixed_points {
            self.avoid_fixed_points = avoid;
        }
        if let Some(attempts) = layer.shuffle_attempts {
            self.shuffle_attempts = attempts;
        }
        if let Some(dry_run) = layer.dry_run {
            self.dry_run = dry_run;
        }
        if let Some(seed) = &layer.seed {
            self.seed = Some(seed.clone());
        }
        Ok(())
    }

    /// Resolve preset, config file and command-line layer for `dir`.
    pub fn resolve(dir: &Path, config_file: Option<&Path>, cli: &ConfigLayer) -> Result<Self> {
        let file_layer = match config_file {
            Some(path) => Some(load_layer(path)?),
            None => {
                let default = dir.join(CONFIG_FILE);
                if default.is_file() {
                    Some(load_layer(&default)?)
                } else {
                    None
                }
            }
        };

        let preset_name = cli
            .preset
            .as_deref()
            .or_else(|| file_layer.as_ref().and_then(|l| l.preset.as_deref()));
        let preset = match preset_name {
            Some(name) => Preset::from_str(name).map_err(|e| eyre::eyre!(e))?,
            None => Preset::Text,
        };

        let mut config = Self::from_preset(preset, dir);
        if let Some(layer) = &file_layer {
            config.apply(layer).map_err(|e| eyre::eyre!(e))?;
        }
        config.apply(cli).map_err(|e| eyre::eyre!(e))?;

        log::debug!("Resolved config: {:?}", config);
        Ok(config)
    }

    /// Resolve a source path against the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        self.dir.join(path)
    }

    /// Whether the identifier pool can only be built from the target records.
    pub fn source_depends_on_targets(&self) -> bool {
        match &self.source {
            SourceConfig::Observed => true,
            SourceConfig::Sheet { path, .. } => !self.resolve_path(path).exists(),
            SourceConfig::Text { .. } => false,
        }
    }
}

/// Read one YAML config layer.
pub fn load_layer(path: &Path) -> Result<ConfigLayer> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(ConfigLayer::default());
    }
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config {}", path.display()))
}
