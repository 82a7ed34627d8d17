//! Shared test infrastructure for asin-shuffle integration tests.
//!
//! Provides TestEnv helper for consistent test setup/teardown.

#![allow(dead_code)]

use asin_shuffle::{Asin, Config, FsSink, Preset, RunReport, extract_asin, make_rng, run};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A records directory with automatic cleanup.
pub struct TestEnv {
    pub temp_dir: TempDir,
}

impl TestEnv {
    /// Create an empty records directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self { temp_dir }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Write a record whose URL carries `asin`.
    pub fn add_record(&self, name: &str, asin: &str) {
        self.add_record_with_url(name, &format!("https://shop.example/dl?ref=abc&asin={}", asin));
    }

    /// Write a record with an arbitrary URL.
    pub fn add_record_with_url(&self, name: &str, url: &str) {
        let doc = serde_json::json!({
            "Title": format!("Record {}", name),
            "QuickDownloadURL": url,
            "Price": 9.99,
        });
        fs::write(self.path(name), serde_json::to_string(&doc).unwrap()).expect("Failed to write record");
    }

    /// Write a raw file.
    pub fn add_file(&self, name: &str, content: &str) {
        fs::write(self.path(name), content).expect("Failed to write file");
    }

    /// Write an identifier text file.
    pub fn add_asin_list(&self, name: &str, asins: &[&str]) {
        self.add_file(name, &(asins.join("\n") + "\n"));
    }

    /// Preset config rooted at this directory.
    pub fn config(&self, preset: Preset) -> Config {
        Config::from_preset(preset, self.temp_dir.path())
    }

    /// Run with a fixed seed, writing records to disk.
    pub fn run(&self, config: &Config, seed: u64) -> eyre::Result<RunReport> {
        let mut rng = StdRng::seed_from_u64(seed);
        run(config, &mut FsSink, &mut rng)
    }

    /// Run with a string seed, the way the CLI does.
    pub fn run_with_seed_str(&self, config: &Config, seed: &str) -> eyre::Result<RunReport> {
        let mut rng = make_rng(Some(seed));
        run(config, &mut FsSink, &mut rng)
    }

    /// Raw file content.
    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).expect("Failed to read file")
    }

    /// The ASIN currently stored in a record.
    pub fn current_asin(&self, name: &str) -> Option<Asin> {
        let doc: serde_json::Value = serde_json::from_str(&self.read(name)).expect("Record is not JSON");
        doc.get("QuickDownloadURL")
            .and_then(|v| v.as_str())
            .and_then(extract_asin)
    }

    /// Assert that no record in the report kept its original ASIN.
    pub fn assert_no_fixed_points(&self, report: &RunReport) {
        for outcome in &report.outcomes {
            assert_ne!(
                outcome.old, outcome.new,
                "Expected {} to get a new ASIN, but it kept {}",
                outcome.name, outcome.old
            );
        }
        assert!(report.fixed_points.is_empty());
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Ten-character test ASIN from a single repeated character.
pub fn asin(c: char) -> String {
    std::iter::repeat_n(c, 10).collect()
}
