//! One shuffle run: load, plan, assign, rewrite, persist.

use crate::asin::Asin;
use crate::assign::{Assignment, avoid_fixed_points};
use crate::config::{Config, SourceConfig};
use crate::plan::{CapWarning, CountPlan, Regime, plan_counts};
use crate::pool::{AsinPool, InvalidLine, PoolLoad, load_text_file};
use crate::record::RecordSink;
use crate::sheet::{generate_sheet, load_sheet_pool};
use crate::target::{SkippedRecord, TargetSet, load_targets};
use crate::url::replace_asin;
use eyre::{Context, Result};
use rand::Rng;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// What happened to one target record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub name: String,
    pub path: PathBuf,
    pub old: Asin,
    pub new: Asin,
    pub changed: bool,
}

/// Summary of a run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// No target record was found; nothing was planned or written.
    pub nothing_to_do: bool,
    pub skipped: Vec<SkippedRecord>,
    pub invalid_lines: Vec<InvalidLine>,
    pub pool_size: usize,
    /// The identifier workbook was missing and got generated.
    pub sheet_generated: bool,
    pub regime: Option<Regime>,
    pub effective_cap: Option<usize>,
    pub cap_warning: Option<CapWarning>,
    pub outcomes: Vec<RecordOutcome>,
    /// Records that kept their original identifier.
    pub fixed_points: Vec<String>,
    pub shuffle_attempts: usize,
    pub repaired: bool,
}

impl RunReport {
    pub fn changed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.changed).count()
    }

    pub fn unchanged_count(&self) -> usize {
        self.outcomes.len() - self.changed_count()
    }

    /// Uses of each identifier in the final assignment.
    pub fn final_counts(&self) -> BTreeMap<Asin, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            *counts.entry(outcome.new.clone()).or_insert(0) += 1;
        }
        counts
    }
}

struct SourceLoad {
    load: PoolLoad,
    generated: bool,
}

fn load_source(config: &Config, targets: &TargetSet) -> Result<SourceLoad> {
    match &config.source {
        SourceConfig::Text { path } => Ok(SourceLoad {
            load: load_text_file(&config.resolve_path(path))?,
            generated: false,
        }),
        SourceConfig::Sheet { path, sheet, column } => {
            let path = config.resolve_path(path);
            let generated = !path.exists();
            if generated {
                generate_sheet(&path, sheet, column, &targets.originals())?;
            }
            Ok(SourceLoad {
                load: load_sheet_pool(&path, sheet, column)?,
                generated,
            })
        }
        SourceConfig::Observed => Ok(SourceLoad {
            load: PoolLoad {
                pool: AsinPool::from_asins(targets.originals()),
                invalid: Vec::new(),
            },
            generated: false,
        }),
    }
}

/// Run one shuffle over `config.dir`, saving changed records through `sink`.
///
/// Fatal: unreadable directory, missing or empty identifier source, sink
/// failures. Per-record problems and leftover fixed points only show up in
/// the report.
pub fn run<S, R>(config: &Config, sink: &mut S, rng: &mut R) -> Result<RunReport>
where
    S: RecordSink + ?Sized,
    R: Rng + ?Sized,
{
    let mut set = load_targets(&config.dir, &config.filter, &config.url_field)?;
    let mut report = RunReport {
        skipped: set.skipped.clone(),
        ..Default::default()
    };

    if set.is_empty() && config.source_depends_on_targets() {
        log::info!("No target records found in {}", config.dir.display());
        report.nothing_to_do = true;
        return Ok(report);
    }

    let source = load_source(config, &set)?;
    report.invalid_lines = source.load.invalid;
    report.sheet_generated = source.generated;
    report.pool_size = source.load.pool.len();

    if set.is_empty() {
        log::info!("No target records found in {}", config.dir.display());
        report.nothing_to_do = true;
        return Ok(report);
    }

    let originals = set.originals();
    let mut plan = match config.source {
        SourceConfig::Observed => CountPlan::permutation(&originals),
        _ => plan_counts(originals.len(), &source.load.pool, &config.policy, rng)?,
    };
    let candidates = plan.flatten_shuffled(rng);

    let mut assignment = if config.avoid_fixed_points {
        avoid_fixed_points(&originals, candidates, config.shuffle_attempts, rng)
    } else {
        Assignment::unchecked(&originals, candidates)
    };
    if config.avoid_fixed_points && !assignment.conflicts.is_empty() {
        assignment.conflicts = plan.substitute(&mut assignment.asins, &originals, &assignment.conflicts);
    }

    report.regime = Some(plan.regime());
    report.effective_cap = plan.effective_cap();
    report.cap_warning = plan.cap_warning().copied();
    report.shuffle_attempts = assignment.attempts;
    report.repaired = assignment.repaired;

    for (idx, (target, new)) in set.targets.iter_mut().zip(&assignment.asins).enumerate() {
        let rewrite = replace_asin(target.record.url(&config.url_field), new);
        if rewrite.changed {
            target.record.set_url(&config.url_field, rewrite.url);
            sink.save(&target.record)
                .with_context(|| format!("Failed to save {}", target.record.path().display()))?;
            log::info!("{}: {} -> {}", target.record.name(), target.original, new);
        } else {
            log::info!("{}: unchanged ({})", target.record.name(), new);
        }

        if assignment.conflicts.contains(&idx) {
            report.fixed_points.push(target.record.name());
        }
        report.outcomes.push(RecordOutcome {
            name: target.record.name(),
            path: target.record.path().to_path_buf(),
            old: target.original.clone(),
            new: new.clone(),
            changed: rewrite.changed,
        });
    }

    if !report.fixed_points.is_empty() {
        log::warn!(
            "{} record(s) kept their original ASIN, no conflict-free assignment found: {}",
            report.fixed_points.len(),
            report.fixed_points.join(", ")
        );
    }
    log::info!(
        "Run complete: {} changed, {} unchanged",
        report.changed_count(),
        report.unchanged_count()
    );

    Ok(report)
}
