use beamfold::core::energy::model::DangleMode;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "beamfold - linear-time RNA secondary structure prediction with beam-pruned dynamic programming.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// More log output: -v INFO, -vv DEBUG (per-phase state counts), -vvv TRACE (beam thresholds)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// No logs and no progress bars; record errors are still printed
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write logs, including span timings, to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Worker threads for folding many records at once (default: all logical cores)
    #[arg(short = 'j', long = "threads", global = true, value_name = "N")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Predict minimum-free-energy structures for one or more sequences.
    Fold(FoldArgs),
    /// Compute the free energy of given structures.
    Eval(EvalArgs),
}

/// Energy model options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Dangle treatment: 0 (none), 1 (single) or 2 (double).
    #[arg(short = 'd', long, value_name = "MODE")]
    pub dangles: Option<DangleMode>,

    /// Allow hairpin loops shorter than three nucleotides.
    #[arg(long)]
    pub sharp_turn: bool,

    /// Energy parameter file in TOML format. Defaults to the bundled Turner 2004 set.
    #[arg(long, value_name = "PATH")]
    pub params: Option<PathBuf>,

    /// Configuration file in TOML format supplying defaults for any option.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S search.beam-size=200
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

/// Arguments for the `fold` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct FoldArgs {
    /// FASTA or one-sequence-per-line input. Reads standard input when omitted or '-'.
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,

    // --- Search Overrides ---
    /// Candidates kept per state type and position. 0 or less disables pruning.
    #[arg(short, long, value_name = "INT", allow_negative_numbers = true)]
    pub beam_size: Option<i64>,

    /// Also report suboptimal structures within an energy window of the optimum.
    #[arg(long)]
    pub zuker: bool,

    /// Width of the suboptimal window in kcal/mol (used with --zuker).
    #[arg(long, value_name = "FLOAT", allow_negative_numbers = true)]
    pub delta: Option<f64>,

    /// Report at most this many structures per sequence (used with --zuker).
    #[arg(long, value_name = "INT")]
    pub max_structures: Option<usize>,

    // --- Experimental Data ---
    /// SHAPE reactivities: 1-based position and reactivity (or NA) per line.
    /// Only valid with a single input sequence.
    #[arg(long, value_name = "PATH")]
    pub shape: Option<PathBuf>,

    /// Log per-sequence beam statistics (retained and discarded states).
    #[arg(long)]
    pub stats: bool,
}

/// Arguments for the `eval` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct EvalArgs {
    /// Sequence and structure lines, optionally preceded by a '>' name line.
    /// Reads standard input when omitted or '-'.
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Print the energy of each loop type alongside the total.
    #[arg(long)]
    pub breakdown: bool,
}
