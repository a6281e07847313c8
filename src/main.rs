//! closure-indent CLI

use clap::{Parser, ValueEnum};
use closure_indent::{
    collect_files,
    config::{self, Overrides, Settings},
    lint_files_parallel,
    logging::{RunLogEntry, RunLogger},
    models::{CorrectionStatus, Severity},
    report::{self, Summary},
    rules,
    structure::{SourceKitProvider, StructureProvider, SwiftSyntax},
    Mode,
};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "closure-indent")]
#[command(
    version,
    about = "Checks that closing closure braces line up with the line their call started on"
)]
struct Args {
    /// Files or directories to lint
    #[arg(default_value = ".")]
    paths: Vec<String>,

    /// Rewrite files in place
    #[arg(long)]
    fix: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Severity of reported violations (error, warning, info)
    #[arg(long)]
    severity: Option<Severity>,

    /// Exclude paths matching patterns
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Command printing structure JSON for a file, e.g. "sourcekitten structure --file".
    /// Without one the tree-sitter Swift grammar is used.
    #[arg(long)]
    structure_command: Option<String>,

    /// Maximum detect-correct passes per file
    #[arg(long)]
    max_passes: Option<usize>,

    /// Config file to use instead of searching for .closure-indent.toml
    #[arg(long, conflicts_with = "no_config")]
    config: Option<PathBuf>,

    /// Ignore configuration files
    #[arg(long)]
    no_config: bool,

    /// Append a JSON Lines record of this run to a file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init()
        .ok();

    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            return ExitCode::from(2);
        }
    };
    log::debug!("settings: {:?}", settings);

    let provider: Box<dyn StructureProvider> = match &settings.structure_command {
        Some(command) => match SourceKitProvider::new(command.clone()) {
            Ok(provider) => Box::new(provider),
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                return ExitCode::from(2);
            }
        },
        None => Box::new(SwiftSyntax),
    };

    let all_rules = rules::get_all_rules(settings.severity);

    // Collect files
    let files = collect_files(&args.paths, &settings.extensions, &settings.exclude);
    log::debug!("found {} file(s)", files.len());

    if files.is_empty() {
        eprintln!("No files found");
        return ExitCode::SUCCESS;
    }

    let mode = if args.fix {
        Mode::Fix {
            max_passes: settings.max_passes,
        }
    } else {
        Mode::Check
    };
    let results = lint_files_parallel(&files, &all_rules, provider.as_ref(), mode);

    // Output results
    match args.format {
        OutputFormat::Json => {
            let output = report::render_json(&results);
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
        }
        OutputFormat::Text => {
            print!("{}", report::render_text(&results));
            for result in &results {
                match &result.status {
                    CorrectionStatus::PassLimit => eprintln!(
                        "{}: corrections did not converge after {} passes",
                        result.file_path.yellow(),
                        settings.max_passes
                    ),
                    CorrectionStatus::Stalled => eprintln!(
                        "{}: some violations could not be corrected",
                        result.file_path.yellow()
                    ),
                    _ => {}
                }
            }
        }
    }

    if let Some(log_file) = &settings.log_file {
        let run_mode = if args.fix { "fix" } else { "check" };
        let logged = RunLogger::new(log_file)
            .and_then(|mut logger| logger.log(&RunLogEntry::from_results(&results, run_mode)));
        if let Err(e) = logged {
            log::warn!("failed to write run log {}: {}", log_file.display(), e);
        }
    }

    // Print summary
    let summary = Summary::from_results(&results);
    if summary.corrections > 0 {
        eprintln!("\nCorrected {} closing brace(s)", summary.corrections);
    }
    if summary.total() > 0 {
        eprintln!(
            "\nFound {} issue(s): {} error(s), {} warning(s), {} info",
            summary.total(),
            summary.errors,
            summary.warnings,
            summary.infos
        );
    } else if args.verbose {
        eprintln!("\nNo issues found.");
    }

    // Return exit code
    if summary.errors > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn load_settings(args: &Args) -> Result<Settings, Box<dyn std::error::Error>> {
    let config = if args.no_config {
        None
    } else {
        let cwd = std::env::current_dir()?;
        config::load_config(args.config.as_deref(), &cwd)?
    };

    let overrides = Overrides {
        severity: args.severity,
        exclude: args.exclude.clone(),
        max_passes: args.max_passes,
        structure_command: args
            .structure_command
            .as_ref()
            .map(|c| c.split_whitespace().map(str::to_string).collect()),
        log_file: args.log_file.clone(),
    };

    Ok(config::merge_config(config.as_ref(), &overrides)?)
}
