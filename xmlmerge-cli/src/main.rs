//! XML patch merge command-line tool.
//!
//! Applies a diff document to a baseline XML file and writes the merged
//! document to a third file.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use xml_merge::{MergeOptions, XmlMerge, XmlPrinterOptions};

const USAGE: &str = "Usage: xmlmerge <xml-file1> <diff-file> <xml-file2>";

/// Apply an XML patch document (add, remove, replace) to a baseline file
#[derive(Parser, Debug)]
#[command(name = "xmlmerge")]
#[command(version)]
#[command(about = "Apply an XML patch document to a baseline XML file", long_about = None)]
struct Cli {
    /// Baseline XML file
    baseline: Option<PathBuf>,
    /// Diff document holding the operations
    diff: Option<PathBuf>,
    /// Output file for the merged document
    output: Option<PathBuf>,

    /// Write the merged document without indentation
    #[arg(long)]
    compact: bool,

    /// Spaces per indentation level
    #[arg(long, default_value_t = 2)]
    indent: usize,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn merge_options(&self) -> MergeOptions {
        let printer = if self.compact {
            XmlPrinterOptions::compact()
        } else {
            XmlPrinterOptions {
                pretty_print: true,
                indent: self.indent,
            }
        };
        MergeOptions { printer }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (Some(baseline), Some(diff), Some(output)) = (&cli.baseline, &cli.diff, &cli.output)
    else {
        println!("{}", USAGE);
        println!();
        // Nothing useful to do if stdout is gone
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    };

    match run_merge(baseline, diff, output, cli.merge_options()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Merges `diff_path` into `baseline_path` and writes `output_path`.
///
/// The output file is only created after the merge has succeeded.
fn run_merge(
    baseline_path: &Path,
    diff_path: &Path,
    output_path: &Path,
    options: MergeOptions,
) -> anyhow::Result<()> {
    let baseline = File::open(baseline_path)
        .with_context(|| format!("cannot open baseline {}", baseline_path.display()))?;
    let diff = File::open(diff_path)
        .with_context(|| format!("cannot open diff {}", diff_path.display()))?;

    info!(baseline = %baseline_path.display(), diff = %diff_path.display(), "merging");
    let mut merged = Vec::new();
    let report = XmlMerge::with_options(options)
        .merge(baseline, diff, &mut merged)
        .with_context(|| {
            format!(
                "failed to merge {} into {}",
                diff_path.display(),
                baseline_path.display()
            )
        })?;

    fs::write(output_path, &merged)
        .with_context(|| format!("cannot write {}", output_path.display()))?;
    info!(
        output = %output_path.display(),
        applied = report.applied,
        skipped = report.skipped,
        "merged document written"
    );
    Ok(())
}
