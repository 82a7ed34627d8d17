//! CLI argument parsing for asin-shuffle.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "asin-shuffle",
    about = "Reassign ASINs across JSON product records",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/asin-shuffle/logs/asin-shuffle.log"
)]
pub struct Cli {
    /// Directory holding the JSON records (default: current directory)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    /// YAML config file (default: asin-shuffle.yml in the records directory, if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Seed making the random draws reproducible
    #[arg(long, global = true, env = asin_shuffle::SEED_ENV)]
    pub seed: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reassign ASINs and rewrite the records
    Shuffle(ShuffleArgs),

    /// Show the resolved configuration without running
    Config(ShuffleArgs),

    /// Export the records' current ASINs to a workbook
    Export {
        /// Output workbook (relative to the records directory)
        #[arg(short, long, default_value = "asins.xlsx")]
        output: PathBuf,

        /// Sheet name
        #[arg(long, default_value = "ASINs")]
        sheet: String,

        #[command(flatten)]
        targets: TargetArgs,
    },
}

/// Which records take part.
#[derive(Args, Clone, Default)]
pub struct TargetArgs {
    /// Preset (observed, text, sheet, text-41-100)
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Numeric file names in scope, e.g. 22-40, or "none"
    #[arg(long)]
    pub range: Option<String>,

    /// Include a.json..z.json
    #[arg(long, overrides_with = "no_letters")]
    pub letters: bool,

    /// Exclude a.json..z.json
    #[arg(long, overrides_with = "letters")]
    pub no_letters: bool,

    /// Record file extension
    #[arg(long)]
    pub extension: Option<String>,

    /// JSON field holding the URL
    #[arg(long)]
    pub url_field: Option<String>,
}

#[derive(Args, Clone, Default)]
pub struct ShuffleArgs {
    #[command(flatten)]
    pub targets: TargetArgs,

    /// Read candidate ASINs from a text file, one per line
    #[arg(long, conflicts_with_all = ["sheet", "observed"])]
    pub text: Option<PathBuf>,

    /// Read candidate ASINs from a workbook
    #[arg(long, conflicts_with = "observed")]
    pub sheet: Option<PathBuf>,

    /// Sheet holding the ASIN column
    #[arg(long, requires = "sheet")]
    pub sheet_name: Option<String>,

    /// ASIN column header (case-insensitive)
    #[arg(long, requires = "sheet")]
    pub column: Option<String>,

    /// Reshuffle the ASINs the records already carry
    #[arg(long)]
    pub observed: bool,

    /// Maximum uses per ASIN, or "none"
    #[arg(long)]
    pub cap: Option<String>,

    /// Use every ASIN at least once when possible
    #[arg(long, overrides_with = "no_coverage")]
    pub coverage: bool,

    /// Draw ASINs independently instead
    #[arg(long, overrides_with = "coverage")]
    pub no_coverage: bool,

    /// Allow records to keep their own ASIN
    #[arg(long)]
    pub allow_fixed_points: bool,

    /// Reshuffles before falling back to swap repair
    #[arg(long)]
    pub attempts: Option<usize>,

    /// Plan and report without writing any record
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// `Some(true)` / `Some(false)` from a pair of on/off flags; the later flag
/// on the command line has already cleared the other.
pub fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shuffle_args(args: &[&str]) -> ShuffleArgs {
        let cli = Cli::try_parse_from(std::iter::once("asin-shuffle").chain(args.iter().copied())).unwrap();
        match cli.command {
            Command::Shuffle(args) => args,
            _ => panic!("Expected shuffle command"),
        }
    }

    #[test]
    fn test_last_letters_flag_wins() {
        let args = shuffle_args(&["shuffle", "--no-letters", "--letters"]);
        assert_eq!(flag_pair(args.targets.letters, args.targets.no_letters), Some(true));

        let args = shuffle_args(&["shuffle", "--letters", "--no-letters"]);
        assert_eq!(flag_pair(args.targets.letters, args.targets.no_letters), Some(false));
    }

    #[test]
    fn test_last_coverage_flag_wins() {
        let args = shuffle_args(&["shuffle", "--coverage", "--no-coverage"]);
        assert_eq!(flag_pair(args.coverage, args.no_coverage), Some(false));

        let args = shuffle_args(&["shuffle", "--no-coverage", "--coverage"]);
        assert_eq!(flag_pair(args.coverage, args.no_coverage), Some(true));
    }

    #[test]
    fn test_unset_flags_leave_config_alone() {
        let args = shuffle_args(&["shuffle"]);
        assert_eq!(flag_pair(args.coverage, args.no_coverage), None);
        assert_eq!(flag_pair(args.targets.letters, args.targets.no_letters), None);
    }
}
