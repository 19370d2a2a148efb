// unionlist - retraction union list builder
// Batch stages: build -> not-indexed -> (external lookup) -> coverage-signal -> annotate

mod exit_codes;
mod logging;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use unionlist_recon::{ErrorClass, ReconError, Source};

use exit_codes::{exit_code_for, EXIT_ERROR, EXIT_SUCCESS};
use logging::LogFormat;

#[derive(Parser)]
#[command(name = "unionlist")]
#[command(about = "Build a union list of retracted papers from PubMed and Retraction Watch")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load both sources, deduplicate, and write partitions, overview and union list
    #[command(after_help = "\
Examples:
  unionlist build unionlist.toml
  unionlist build unionlist.toml --date 2025-04-13
  unionlist build unionlist.toml --out-dir /tmp/run --json
  unionlist build unionlist.toml --output summary.json")]
    Build {
        /// Path to the pipeline .toml config
        config: PathBuf,

        /// Date stamped on every artifact (default: today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,

        /// Artifact directory (default: out_dir from the config)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON run summary to a file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Write the union-list rows a source does not index (coverage lookup input)
    #[command(after_help = "\
Examples:
  unionlist not-indexed out/2025-04-13_unionlist.csv
  unionlist not-indexed out/2025-04-13_unionlist.csv --source pubmed --date 2025-04-13")]
    NotIndexed {
        /// Union list written by `build`
        union_list: PathBuf,

        /// Source whose gaps are selected
        #[arg(long, default_value = "pubmed")]
        source: Source,

        /// Artifact directory (default: the union list's directory)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },

    /// Turn a list of covered PubMed IDs into a coverage-signal table
    #[command(after_help = "\
Examples:
  unionlist coverage-signal out/2025-04-13_unionlist.csv --covered pmids.txt")]
    CoverageSignal {
        /// Union list written by `build`
        union_list: PathBuf,

        /// PubMed IDs found covered, one per line (# comments allowed)
        #[arg(long)]
        covered: PathBuf,

        #[arg(long)]
        out_dir: Option<PathBuf>,

        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },

    /// Fold a coverage signal into the union list and tally per-source results
    #[command(after_help = "\
Examples:
  unionlist annotate out/2025-04-13_unionlist.csv out/pubmed_coverednotindexed_2025-04-13.csv
  unionlist annotate union.csv signal.csv --json
  unionlist annotate union.csv signal.csv --output coverage.json

Exit code 7 means some signal rows matched no union-list row. The annotated
list and results table are still written.")]
    Annotate {
        union_list: PathBuf,

        /// Coverage-signal table (DOI, PubMedID, Covered_In)
        signal: PathBuf,

        #[arg(long)]
        out_dir: Option<PathBuf>,

        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,

        /// Print the coverage summary as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON coverage summary to a file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a pipeline config without running
    #[command(after_help = "\
Examples:
  unionlist validate unionlist.toml")]
    Validate {
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("UNIONLIST_GIT_HASH"),
        ")",
        "\nengine:  unionlist-recon ",
        env!("CARGO_PKG_VERSION"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.log_format);

    let result = match cli.command {
        Commands::Build { config, date, out_dir, json, output } => {
            recon::cmd_build(config, date, out_dir, json, output)
        }
        Commands::NotIndexed { union_list, source, out_dir, date } => {
            recon::cmd_not_indexed(union_list, source, out_dir, date)
        }
        Commands::CoverageSignal { union_list, covered, out_dir, date } => {
            recon::cmd_coverage_signal(union_list, covered, out_dir, date)
        }
        Commands::Annotate { union_list, signal, out_dir, date, json, output } => {
            recon::cmd_annotate(union_list, signal, out_dir, date, json, output)
        }
        Commands::Validate { config } => recon::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from an engine or IO error with its class's exit code.
    pub fn from_recon(err: ReconError) -> Self {
        let class = err.class();
        let hint = match (&err, class) {
            (ReconError::MissingColumn { .. }, _) => {
                Some("the export format may have changed; map the column under [<source>.columns]".to_string())
            }
            (ReconError::UnknownEncoding(_), _) => {
                Some("use a WHATWG label such as utf-8, latin1 or windows-1252".to_string())
            }
            (_, ErrorClass::Integrity) => {
                Some("no artifacts past the failing stage were written".to_string())
            }
            _ => None,
        };
        Self { code: exit_code_for(class), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        Self::from_recon(err)
    }
}
