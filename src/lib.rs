//! asin-shuffle: reassign ASIN identifiers across JSON product records.
//!
//! Each target record carries a URL with an `asin=` parameter. A run loads
//! a pool of candidate ASINs, plans how many times each may be used, pairs
//! the plan with the records so that no record keeps its own ASIN when that
//! can be avoided, and rewrites the URLs.
//!
//! # Example
//!
//! ```no_run
//! use asin_shuffle::{Config, FsSink, Preset, make_rng, run};
//! use std::path::Path;
//!
//! let config = Config::from_preset(Preset::Text41To100, Path::new("."));
//! let mut rng = make_rng(Some("42"));
//! let report = run(&config, &mut FsSink, &mut rng).unwrap();
//!
//! println!("{} record(s) changed", report.changed_count());
//! for name in &report.fixed_points {
//!     println!("{} kept its ASIN", name);
//! }
//! ```

mod asin;
mod seed;

pub mod assign;
pub mod config;
pub mod plan;
pub mod pool;
pub mod record;
pub mod run;
pub mod sheet;
pub mod target;
pub mod url;

// Re-export public API
pub use asin::{ASIN_LEN, Asin, AsinError};
pub use assign::{Assignment, avoid_fixed_points, fixed_points, repair_fixed_points};
pub use config::{CONFIG_FILE, CapValue, Config, ConfigError, ConfigLayer, Preset, SourceConfig};
pub use plan::{CapWarning, CountPlan, PlanError, PlanPolicy, Regime, plan_counts};
pub use pool::{AsinPool, InvalidLine, PoolError, PoolLoad, load_text_file, parse_lines};
pub use record::{DEFAULT_URL_FIELD, DryRunSink, FsSink, Record, RecordSink};
pub use run::{RecordOutcome, RunReport, run};
pub use seed::{SEED_ENV, make_rng};
pub use sheet::{SheetError, export_targets};
pub use target::{SkippedRecord, Target, TargetFilter, TargetSet, load_targets};
pub use url::{Rewrite, extract_asin, replace_asin};
