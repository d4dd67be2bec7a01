//! Nexus Guard CLI
//!
//! Commands: generate, validate, migrate, check
//! Reports go to stdout (human or `--json`), logs to stderr.
//! Returns non-zero on any failure, drift, unmapped (strict) or violation.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nexus_guard::{
    ComplianceReport, DriftReport, GenerateOutcome, GuardPipeline, MigrateOptions,
    MigrationReport, PipelineError, SectionStatus,
};

#[derive(Parser)]
#[command(name = "nexus-guard")]
#[command(version, about = "Nexus Guard - Design Token Generator, Validator and Migration Engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root; every configured path is relative to it
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Config file (defaults to <root>/nexus-guard.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `nexus_guard=trace`
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate every token section in the artifact
    Generate,

    /// Compare artifact hashes against the manifest
    Validate,

    /// Rewrite legacy class names, raw values and imports
    Migrate {
        /// Report only, never write
        #[arg(long)]
        dry_run: bool,

        /// Print every processed file
        #[arg(long)]
        verbose: bool,

        /// Fail when unmapped legacy patterns remain
        #[arg(long)]
        strict: bool,
    },

    /// Scan sources for forbidden patterns
    Check,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "fatal");
            if cli.json {
                let output = serde_json::json!({ "success": false, "error": e.to_string() });
                println!("{}", output);
            } else {
                eprintln!("✗ {}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, PipelineError> {
    let pipeline = GuardPipeline::open(&cli.root, cli.config.as_deref())?;

    match &cli.command {
        Commands::Generate => {
            let (manifest, outcome) = pipeline.generate()?;
            if cli.json {
                print_json(&outcome);
            } else {
                print_generate(&manifest.version.to_string(), &outcome, &pipeline);
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate => {
            let report = pipeline.validate()?;
            if cli.json {
                print_json(&report);
            } else {
                print_validate(&report);
            }
            Ok(if report.is_clean() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }

        Commands::Migrate { dry_run, verbose, strict } => {
            let options = MigrateOptions {
                dry_run: *dry_run,
                strict: *strict,
            };
            let report = pipeline.migrate(options)?;
            let outcome = report.outcome();
            if cli.json {
                print_json(&serde_json::json!({
                    "outcome": outcome,
                    "report": report,
                }));
            } else {
                print_migrate(&report, *verbose);
                println!("{}", outcome.message());
            }
            Ok(ExitCode::from(outcome.exit_code()))
        }

        Commands::Check => {
            let report = pipeline.check()?;
            if cli.json {
                print_json(&report);
            } else {
                print_check(&report);
            }
            Ok(if report.is_clean() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("✗ failed to serialize report: {}", e),
    }
}

fn print_generate(version: &str, outcome: &GenerateOutcome, pipeline: &GuardPipeline) {
    println!("Manifest v{}", version);
    for s in &outcome.sections {
        println!("  ✓ {:<18} {:>4} tokens  {}", s.name, s.tokens, s.hash);
    }
    let total: usize = outcome.sections.iter().map(|s| s.tokens).sum();
    if outcome.changed {
        println!(
            "Wrote {} ({} sections, {} tokens)",
            pipeline.artifact_path().display(),
            outcome.sections.len(),
            total
        );
    } else {
        println!("Up to date ({} sections, {} tokens)", outcome.sections.len(), total);
    }
}

fn print_validate(report: &DriftReport) {
    println!("Manifest v{}", report.manifest_version);
    for check in &report.sections {
        match &check.status {
            SectionStatus::Ok { .. } => println!("  ✓ {}: ok", check.section),
            SectionStatus::Drift { expected, actual } => {
                println!("  ✗ {}: drift", check.section);
                println!("      expected {}", expected);
                println!("      actual   {}", actual);
            }
            SectionStatus::Missing { reason } => {
                println!("  ✗ {}: missing ({})", check.section, reason);
            }
        }
    }

    if report.is_clean() {
        println!("All {} sections in sync", report.sections.len());
    } else {
        println!(
            "{} of {} sections out of sync",
            report.drift_count(),
            report.sections.len()
        );
        if let Some(hint) = report.sections.iter().find_map(|c| c.remediation()) {
            println!("Fix: {}", hint);
        }
    }
}

fn print_migrate(report: &MigrationReport, verbose: bool) {
    if report.dry_run {
        println!("Dry run: no files written");
    }

    for file in &report.files {
        let touched = file.replacements > 0 || !file.unmapped.is_empty() || !file.errors.is_empty();
        if !verbose && !touched {
            continue;
        }
        println!("  {} ({} replacements)", file.file.display(), file.replacements);
        if verbose {
            for token in &file.unmapped {
                println!("      unmapped: {}", token);
            }
        }
        for e in &file.errors {
            println!("      error: {}", e);
        }
    }

    println!("Files scanned:      {}", report.files_scanned);
    println!("Total replacements: {}", report.total_replacements);
    println!("Files with unmapped patterns: {}", report.files_with_unmapped.len());

    if !report.unmapped.is_empty() {
        println!("Unmapped patterns:");
        for token in &report.unmapped {
            println!("  - {}", token);
        }
    }
    if !report.errors.is_empty() {
        println!("Errors:");
        for e in &report.errors {
            println!("  - {}", e);
        }
    }
}

fn print_check(report: &ComplianceReport) {
    for (file, violations) in report.by_file() {
        println!("{}", file.display());
        for v in violations {
            println!("  L{}: [{}] {}", v.line, v.pattern, v.excerpt);
        }
    }
    for e in &report.errors {
        println!("error: {}", e);
    }

    println!(
        "Scanned {} files against {} patterns: {} violations, {} errors",
        report.files_scanned,
        report.patterns,
        report.violations.len(),
        report.errors.len()
    );
    if report.is_clean() {
        println!("✓ Compliant");
    }
}
