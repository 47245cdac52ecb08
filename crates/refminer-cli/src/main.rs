use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use refminer_config::{init_tracing, json_schema, RefminerConfig};
use refminer_diff::{ClassDiff, ClassDiffInput, ClassDiffReport, DetectionContext, DiffError};
use serde::Serialize;

/// Detection was cut short by the timeout.
const EXIT_TIMEOUT: i32 = 2;
const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "refminer", version, about = "Refactoring inference over aligned class versions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect refactorings in a class-diff document
    Detect(DetectArgs),
    /// Print the JSON schema of `refminer.toml`
    Schema,
}

#[derive(Args)]
struct DetectArgs {
    /// JSON class-diff document: both class versions, their body mappers and
    /// the precomputed alignments
    input: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Abort detection after this many milliseconds (overrides the config)
    #[arg(long)]
    timeout_ms: Option<u64>,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            EXIT_FAILURE
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Detect(args) => {
            let mut config = match &args.config {
                Some(path) => RefminerConfig::load_from_path(path)
                    .with_context(|| format!("failed to load config from {}", path.display()))?,
                None => RefminerConfig::default(),
            };
            if args.timeout_ms.is_some() {
                config.detection.timeout_ms = args.timeout_ms;
            }
            init_tracing(&config.logging);

            match detect(&args, &config) {
                Ok(code) => Ok(code),
                Err(err) if config.logging.include_backtrace => {
                    eprintln!("{err:?}");
                    Ok(EXIT_FAILURE)
                }
                Err(err) => Err(err),
            }
        }
        Command::Schema => {
            print_json(&json_schema())?;
            Ok(0)
        }
    }
}

fn detect(args: &DetectArgs, config: &RefminerConfig) -> Result<i32> {
    let input = read_input(&args.input)?;
    let ctx = DetectionContext::default().with_optional_timeout(config.detection.timeout());
    let diff = ClassDiff::new(&input)
        .with_context(|| format!("invalid class-diff document {}", args.input.display()))?;

    match diff.detect(&config.detection, &ctx) {
        Ok(report) => {
            tracing::info!(
                target: "refminer.cli",
                input = %args.input.display(),
                refactorings = report.refactorings.len(),
                "detection finished"
            );
            if args.json {
                print_json(&report)?;
            } else {
                print_report(&report);
            }
            Ok(0)
        }
        Err(err @ (DiffError::Timeout { .. } | DiffError::Cancelled { .. })) => {
            eprintln!("{}: {err}", args.input.display());
            Ok(EXIT_TIMEOUT)
        }
        Err(err) => Err(err.into()),
    }
}

fn read_input(path: &Path) -> Result<ClassDiffInput> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse class-diff document {}", path.display()))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

fn print_report(report: &ClassDiffReport) {
    println!("{} -> {}", report.original_class, report.next_class);
    if report.refactorings.is_empty() {
        println!("  no refactorings");
    }
    for refactoring in &report.refactorings {
        println!("  {refactoring}");
    }
    if !report.added_operations.is_empty() {
        let added: Vec<String> = report.added_operations.iter().map(ToString::to_string).collect();
        println!("  added operations: {}", added.join(", "));
    }
    if !report.removed_operations.is_empty() {
        let removed: Vec<String> = report.removed_operations.iter().map(ToString::to_string).collect();
        println!("  removed operations: {}", removed.join(", "));
    }
    if !report.unresolved.is_empty() {
        println!(
            "  unresolved candidates: {} renames, {} merges, {} splits",
            report.unresolved.renames.len(),
            report.unresolved.merges.len(),
            report.unresolved.splits.len()
        );
    }
}
