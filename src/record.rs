//! JSON product records and where they get written.

use eyre::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Default name of the URL field carrying the `asin=` parameter.
pub const DEFAULT_URL_FIELD: &str = "QuickDownloadURL";

/// A JSON document backed by a file.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    path: PathBuf,
    document: Value,
}

impl Record {
    pub fn new(path: impl Into<PathBuf>, document: Value) -> Self {
        Self {
            path: path.into(),
            document,
        }
    }

    /// Read and parse a record from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let document: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Self::new(path, document))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used in reports.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Value of a string field; missing or non-string fields read as empty.
    pub fn url(&self, field: &str) -> &str {
        self.document.get(field).and_then(Value::as_str).unwrap_or("")
    }

    /// Replace the URL field. No-op when the document is not a JSON object.
    pub fn set_url(&mut self, field: &str, url: impl Into<String>) {
        if let Some(obj) = self.document.as_object_mut() {
            obj.insert(field.to_string(), Value::String(url.into()));
        }
    }

    /// Pretty JSON with a trailing newline, as written back to disk.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(&self.document).context("Failed to serialize record")?;
        out.push('\n');
        Ok(out)
    }
}

/// Destination for updated records.
pub trait RecordSink {
    /// Persist one updated record.
    fn save(&mut self, record: &Record) -> Result<()>;
}

/// Writes records back to their own file.
#[derive(Debug, Default)]
pub struct FsSink;

impl RecordSink for FsSink {
    fn save(&mut self, record: &Record) -> Result<()> {
        let json = record.to_pretty_json()?;
        fs::write(record.path(), json).with_context(|| format!("Failed to write {}", record.path().display()))?;
        log::debug!("Wrote {}", record.path().display());
        Ok(())
    }
}

/// Collects the records that would have been written.
#[derive(Debug, Default)]
pub struct DryRunSink {
    pub saved: Vec<PathBuf>,
}

impl RecordSink for DryRunSink {
    fn save(&mut self, record: &Record) -> Result<()> {
        log::debug!("Dry run, not writing {}", record.path().display());
        self.saved.push(record.path().to_path_buf());
        Ok(())
    }
}
