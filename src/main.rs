//! asin-shuffle CLI - reassign ASINs across JSON product records.

use asin_shuffle::sheet::{DEFAULT_COLUMN, DEFAULT_SHEET};
use asin_shuffle::{
    CapValue, Config, ConfigLayer, DryRunSink, FsSink, RecordSink, RunReport, SourceConfig, export_targets,
    load_targets, make_rng, run,
};
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

mod cli;

use cli::{Cli, Command, ShuffleArgs, TargetArgs, flag_pair};

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("asin-shuffle")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("asin-shuffle.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn get_records_dir(cli: &Cli) -> PathBuf {
    cli.dir
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn target_layer(args: &TargetArgs) -> ConfigLayer {
    ConfigLayer {
        preset: args.preset.clone(),
        range: args.range.clone(),
        letters: flag_pair(args.letters, args.no_letters),
        extension: args.extension.clone(),
        url_field: args.url_field.clone(),
        ..Default::default()
    }
}

fn shuffle_layer(args: &ShuffleArgs, seed: Option<&str>) -> ConfigLayer {
    let source = if args.observed {
        Some(SourceConfig::Observed)
    } else if let Some(path) = &args.text {
        Some(SourceConfig::Text { path: path.clone() })
    } else {
        args.sheet.as_ref().map(|path| SourceConfig::Sheet {
            path: path.clone(),
            sheet: args.sheet_name.clone().unwrap_or_else(|| DEFAULT_SHEET.to_string()),
            column: args.column.clone().unwrap_or_else(|| DEFAULT_COLUMN.to_string()),
        })
    };

    ConfigLayer {
        source,
        cap: args.cap.clone().map(CapValue::Text),
        coverage: flag_pair(args.coverage, args.no_coverage),
        avoid_fixed_points: args.allow_fixed_points.then_some(false),
        shuffle_attempts: args.attempts,
        dry_run: args.dry_run.then_some(true),
        seed: seed.map(String::from),
        ..target_layer(&args.targets)
    }
}

fn print_report(report: &RunReport, dry_run: bool) {
    for line in &report.invalid_lines {
        println!(
            "{} Ignored invalid ASIN on line {}: '{}'",
            "⚠".yellow(),
            line.line,
            line.value
        );
    }
    for skipped in &report.skipped {
        println!("{} Skipped {}: {}", "⚠".yellow(), skipped.path.display(), skipped.reason);
    }

    if report.nothing_to_do {
        println!("{}", "No target records found, nothing to do".dimmed());
        return;
    }

    if report.sheet_generated {
        println!("{} Generated the ASIN workbook from the current records", "→".blue());
    }
    println!(
        "{} {} unique ASIN(s) for {} record(s)",
        "→".blue(),
        report.pool_size,
        report.outcomes.len()
    );
    if let Some(warning) = &report.cap_warning {
        println!("{} {}", "⚠".yellow(), warning);
    }

    for outcome in &report.outcomes {
        if outcome.changed {
            println!(
                "{} {}: {} -> {}",
                "✓".green(),
                outcome.name,
                outcome.old.to_string().dimmed(),
                outcome.new.to_string().cyan()
            );
        } else {
            println!("  {}: unchanged ({})", outcome.name, outcome.new.to_string().dimmed());
        }
    }

    for name in &report.fixed_points {
        println!("{} {} kept its original ASIN (no conflict-free assignment)", "⚠".yellow(), name);
    }

    let counts: Vec<String> = report
        .final_counts()
        .iter()
        .map(|(asin, count)| format!("{}={}", asin, count))
        .collect();
    println!("{} Final counts: {}", "→".blue(), counts.join(", ").dimmed());

    let verb = if dry_run { "would change" } else { "changed" };
    println!(
        "{} {} {}, {} unchanged",
        "✓".green(),
        report.changed_count(),
        verb,
        report.unchanged_count()
    );
}

fn run_shuffle(config: &Config) -> Result<()> {
    let mut rng = make_rng(config.seed.as_deref());

    let mut fs_sink = FsSink;
    let mut dry_sink = DryRunSink::default();
    let sink: &mut dyn RecordSink = if config.dry_run { &mut dry_sink } else { &mut fs_sink };

    let report = run(config, sink, &mut rng).context("Shuffle failed")?;
    print_report(&report, config.dry_run);
    Ok(())
}

fn run_export(dir: &Path, config: &Config, output: &Path, sheet: &str) -> Result<()> {
    let targets = load_targets(&config.dir, &config.filter, &config.url_field).context("Failed to load records")?;
    for skipped in &targets.skipped {
        println!("{} Skipped {}: {}", "⚠".yellow(), skipped.path.display(), skipped.reason);
    }

    let path = dir.join(output);
    let rows = export_targets(&path, sheet, &targets).context("Failed to export ASINs")?;
    println!("{} Exported {} row(s) to {}", "✓".green(), rows, path.display());
    Ok(())
}

fn run_cli(cli: Cli) -> Result<()> {
    let dir = get_records_dir(&cli);

    match &cli.command {
        Command::Shuffle(args) => {
            let layer = shuffle_layer(args, cli.seed.as_deref());
            let config = Config::resolve(&dir, cli.config.as_deref(), &layer).context("Invalid configuration")?;
            run_shuffle(&config)?;
        }

        Command::Config(args) => {
            let layer = shuffle_layer(args, cli.seed.as_deref());
            let config = Config::resolve(&dir, cli.config.as_deref(), &layer).context("Invalid configuration")?;
            let yaml = serde_yaml::to_string(&config).context("Failed to render configuration")?;
            print!("{}", yaml);
        }

        Command::Export {
            output,
            sheet,
            targets,
        } => {
            let config = Config::resolve(&dir, cli.config.as_deref(), &target_layer(targets))
                .context("Invalid configuration")?;
            run_export(&dir, &config, output, sheet)?;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    info!("Command: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run_cli(cli) {
        log::error!("{:#}", e);
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
