//! CLI for the abi-check library
//!
//! Without arguments, compiles the contracts and writes their ABIs into the
//! ABI directory. With one argument, recompiles and checks the freshly
//! generated ABIs against the committed ones.

use abi_check::{
    CheckConfig, CommandCompiler, ComparisonStatus, ExtractError, Mode, RunError, RunReport,
    Runner,
};
use clap::{error::ErrorKind, Parser};
use eyre::Result;
use serde::Serialize;
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::Level;

const USAGE: &str = "\
Incorrect command
Use : abi-check [OPTION]
OPTION :
 - no option : Generate ABIs
 - something : Compare ABIs";

/// Contract ABI snapshot generator and checker
#[derive(Parser, Debug)]
#[command(name = "abi-check")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Any single value selects compare mode; omit to generate
    #[arg(value_name = "CHECK")]
    check: Vec<String>,

    /// Configuration file (defaults to abi-check.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report every differing ABI instead of stopping at the first
    #[arg(long)]
    all: bool,

    /// Output JSON to stdout
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all logging except errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status")]
enum Output {
    #[serde(rename = "success")]
    Success {
        #[serde(flatten)]
        report: RunReport,
    },

    #[serde(rename = "error")]
    Error { error_type: String, message: String },
}

/// What the command line asks for
#[derive(Debug)]
enum Invocation {
    Run(Cli, Mode),
    /// Malformed invocation; print [`USAGE`] and exit 1
    Usage,
}

/// Parses the command line; only help and version requests are left to clap
fn parse_invocation<I, T>(args: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(match Mode::from_arg_count(cli.check.len()) {
            Some(mode) => Invocation::Run(cli, mode),
            None => Invocation::Usage,
        }),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => Err(e),
        Err(_) => Ok(Invocation::Usage),
    }
}

fn main() {
    let (cli, mode) = match parse_invocation(std::env::args_os()) {
        Ok(Invocation::Run(cli, mode)) => (cli, mode),
        Ok(Invocation::Usage) => {
            println!("{USAGE}");
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    let log_level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli, mode) {
        output_error(&e, cli.json);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, mode: Mode) -> Result<()> {
    let mut config = CheckConfig::discover(cli.config.as_deref())?;
    if cli.all {
        config.fail_fast = false;
    }

    match mode {
        Mode::Generate => tracing::info!("Selected Generate ABIs..."),
        Mode::Check => tracing::info!("Selected Compare ABIs..."),
    }

    let compiler = CommandCompiler::from(&config.compiler);
    let runner = Runner::new(&config, compiler)?;
    let report = runner.run(mode)?;

    if cli.json {
        println!("{}", serde_json::to_string(&Output::Success { report })?);
        return Ok(());
    }

    match report {
        RunReport::Generate(report) => {
            println!(
                "✅ Generated {} ABIs in {}",
                report.extraction.written.len(),
                report.abi_dir.display()
            );
            if !report.extraction.skipped.is_empty() {
                println!(
                    "   Skipped (no ABI): {}",
                    report.extraction.skipped.join(", ")
                );
            }
        }
        RunReport::Check(report) => {
            println!(
                "✅ ABIs match ({} files checked against {})",
                report.comparison.files_compared,
                report.abi_dir.display()
            );
        }
    }

    Ok(())
}

fn error_type(error: &eyre::Report) -> &'static str {
    if let Some(run_error) = error.downcast_ref::<RunError>() {
        return match run_error {
            RunError::MissingBaseline(_) => "missing_baseline",
            RunError::CompilerFailed { .. } => "compilation_failed",
            RunError::AbiMismatch(ComparisonStatus::FileSetMismatch { .. }) => "file_set_mismatch",
            RunError::AbiMismatch(_) => "content_mismatch",
        };
    }

    if error.downcast_ref::<ExtractError>().is_some() {
        "malformed_artifact"
    } else if error.downcast_ref::<std::io::Error>().is_some() {
        "io_error"
    } else {
        "unknown_error"
    }
}

fn output_error(error: &eyre::Report, json: bool) {
    if !json {
        println!("❌ {error:#}");
        return;
    }

    let output = Output::Error {
        error_type: error_type(error).to_string(),
        message: format!("{error:#}"),
    };

    match serde_json::to_string(&output) {
        Ok(line) => println!("{line}"),
        Err(_) => println!("❌ {error:#}"),
    }
}
