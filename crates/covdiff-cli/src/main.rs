/// covdiff command-line tool: extract per-run coverage from fuzzer
/// bitmaps, then measure stability and compare fuzzers.
///
/// # Command overview
///
/// ```text
/// covdiff <COMMAND> [OPTIONS]
///
/// Commands:
///   extract    Build a coverage snapshot from one run's bitmaps
///   stability  Per-location stability of every fuzzer in a project
///   compare    Differential coverage of every fuzzer against a baseline
///   overlap    Set overlap of two single-run snapshots
///   unique     Locations one fuzzer reaches that others do not
///   summary    Mean or median of stability scores per fuzzer
///   help       Print help information
///
/// Global options:
///   -v, --verbose    More log output (repeat for debug/trace)
///   -q, --quiet      Only log errors
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// # Project layout
///
/// `stability` and `compare` read a directory with one subdirectory per
/// fuzzer, each holding that fuzzer's run snapshots (`*.json` or
/// `*.json.zst`). Runs are ordered by file name.
///
/// # Exit codes
///
/// | Code | Meaning                                         |
/// |------|-------------------------------------------------|
/// | 0    | Success                                         |
/// | 1    | Error (I/O failure, malformed input, mismatch)  |
///
/// Logs and errors go to stderr so stdout can be piped cleanly.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::LevelFilter;

mod cmd_compare;
mod cmd_extract;
mod cmd_overlap;
mod cmd_stability;
mod cmd_summary;
mod cmd_unique;
mod common;

// ── CLI root ──────────────────────────────────────────────────────────────────

/// Coverage stability and differential comparison for fuzzer campaigns.
#[derive(Parser)]
#[command(name = "covdiff", version, about = "Fuzzer coverage evaluation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Build a coverage snapshot from one run's bitmaps.
    Extract(ExtractArgs),
    /// Per-location stability of every fuzzer in a project.
    Stability(StabilityArgs),
    /// Differential coverage of every fuzzer against a baseline.
    Compare(CompareArgs),
    /// Set overlap of two single-run snapshots.
    Overlap(OverlapArgs),
    /// Locations one fuzzer reaches that others do not.
    Unique(UniqueArgs),
    /// Mean or median of stability scores per fuzzer.
    Summary(SummaryArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `covdiff extract`.
///
/// ```text
/// ┌───────────────┬────────────────────────────────────────────────────┐
/// │ Flag          │ Effect                                             │
/// ├───────────────┼────────────────────────────────────────────────────┤
/// │ --edges FILE  │ Also decode the byte-per-edge map                  │
/// │ --block-bytes │ Reject block bitmaps of any other length           │
/// │ --edge-bytes  │ Reject edge maps of any other length               │
/// │ --compress    │ Write the snapshot as a zstd frame                 │
/// └───────────────┴────────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Block-id to source-line table (`<id>=<label>[,<label>...]` per line).
    #[arg(short, long)]
    pub mapping: PathBuf,

    /// Bit-packed block coverage bitmap of the run.
    #[arg(short, long)]
    pub blocks: PathBuf,

    /// Byte-per-edge map of the run (0xFF = never executed).
    #[arg(short, long)]
    pub edges: Option<PathBuf>,

    /// Expected block bitmap length in bytes.
    #[arg(long)]
    pub block_bytes: Option<usize>,

    /// Expected edge map length in bytes.
    #[arg(long)]
    pub edge_bytes: Option<usize>,

    /// Output snapshot path.
    #[arg(short, long)]
    pub output: PathBuf,

    /// zstd-compress the snapshot.
    #[arg(long)]
    pub compress: bool,
}

/// Arguments for `covdiff stability`.
#[derive(clap::Args)]
pub struct StabilityArgs {
    /// Project directory (`<project>/<fuzzer>/<run>.json[.zst]`).
    pub project: PathBuf,

    /// Write the full stability record as JSON to this file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// zstd-compress the JSON record.
    #[arg(long, requires = "output")]
    pub compress: bool,

    /// Kinds to print histograms for: comma-separated `lines`, `bbs`, `edges`.
    #[arg(long, default_value = "lines,bbs,edges")]
    pub kinds: String,

    /// Minimum number of runs every fuzzer must provide.
    #[arg(long, default_value_t = 1)]
    pub min_runs: usize,
}

/// Arguments for `covdiff compare`.
///
/// ```text
/// ┌──────────────┬─────────────────────────────────────────────────────┐
/// │ Flag         │ Effect                                              │
/// ├──────────────┼─────────────────────────────────────────────────────┤
/// │ --cumulative │ Union all runs per side before diffing              │
/// │ --no-percent │ Omit values relative to the baseline size           │
/// │ --strict     │ Fail instead of truncating on unequal run counts    │
/// │ --kinds      │ Kinds to compare (default: all recorded everywhere) │
/// └──────────────┴─────────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct CompareArgs {
    /// Project directory (`<project>/<fuzzer>/<run>.json[.zst]`).
    pub project: PathBuf,

    /// Fuzzer every other fuzzer is compared against.
    #[arg(short, long)]
    pub baseline: String,

    /// Comma-separated kinds to compare.
    #[arg(long)]
    pub kinds: Option<String>,

    /// Compare unions of all runs instead of run-by-run.
    #[arg(long)]
    pub cumulative: bool,

    /// Omit percentages.
    #[arg(long)]
    pub no_percent: bool,

    /// Fail when fuzzers have different run counts.
    #[arg(long)]
    pub strict: bool,

    /// Minimum number of runs every fuzzer must provide.
    #[arg(long, default_value_t = 1)]
    pub min_runs: usize,

    /// Two-sided confidence level for per-run intervals.
    #[arg(long, default_value_t = 0.95)]
    pub confidence: f64,

    /// Also write the comparisons as JSON to this file.
    #[arg(long)]
    pub json: Option<PathBuf>,
}

/// Arguments for `covdiff overlap`.
#[derive(clap::Args)]
pub struct OverlapArgs {
    /// First snapshot.
    pub left: PathBuf,

    /// Second snapshot.
    pub right: PathBuf,

    /// Comma-separated kinds (default: all both snapshots recorded).
    #[arg(long)]
    pub kinds: Option<String>,
}

/// Arguments for `covdiff unique`.
///
/// Without `--best`, prints locations the fuzzer observed and no contender
/// did. With `--best`, prints locations whose stability score beats every
/// contender's by at least `--diff`.
#[derive(clap::Args)]
pub struct UniqueArgs {
    /// Stability record written by `covdiff stability -o`.
    pub stability: PathBuf,

    /// Fuzzer to query.
    #[arg(short, long)]
    pub fuzzer: String,

    /// Contenders to compare against (repeatable; default: every other fuzzer).
    #[arg(short, long)]
    pub contender: Vec<String>,

    /// Coverage kind: `lines`, `bbs` or `edges`.
    #[arg(long, default_value = "lines")]
    pub kind: String,

    /// Report locations the fuzzer covers more reliably, not only exclusively.
    #[arg(long)]
    pub best: bool,

    /// Minimum score margin for `--best`.
    #[arg(long, default_value_t = 0, requires = "best", allow_negative_numbers = true)]
    pub diff: i16,

    /// Write to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `covdiff summary`.
#[derive(clap::Args)]
pub struct SummaryArgs {
    /// Stability record written by `covdiff stability -o`.
    pub stability: PathBuf,

    /// Coverage kind: `lines`, `bbs` or `edges`.
    #[arg(long, default_value = "lines")]
    pub kind: String,

    /// `mean` (with confidence interval) or `median` (± deviation / 2).
    #[arg(long, default_value = "mean")]
    pub style: String,

    /// Two-sided confidence level for the mean style.
    #[arg(long, default_value_t = 0.95)]
    pub confidence: f64,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_logger(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env(
            env_logger::Env::default()
                .filter("COVDIFF_LOG")
                .write_style("COVDIFF_LOG_STYLE"),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Extract(args) => cmd_extract::run(&args),
        Commands::Stability(args) => cmd_stability::run(&args),
        Commands::Compare(args) => cmd_compare::run(&args),
        Commands::Overlap(args) => cmd_overlap::run(&args),
        Commands::Unique(args) => cmd_unique::run(&args),
        Commands::Summary(args) => cmd_summary::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
