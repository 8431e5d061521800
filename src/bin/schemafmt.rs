//! schemafmt: PostgreSQL schema dump formatter
//!
//! # Usage
//!
//! ```bash
//! # Print the formatted dump
//! schemafmt db/structure.sql
//!
//! # Rewrite in place
//! schemafmt -w db/structure.sql
//!
//! # Fail CI when a dump is not formatted
//! schemafmt --check db/structure.sql
//! ```

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use schemafmt::config::Config;
use schemafmt::error::{FormatError, line_col};
use schemafmt::formatter::Formatter;
use schemafmt::transforms::{self, TransformKind};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemafmt")]
#[command(version)]
#[command(about = "Deterministic formatter for PostgreSQL schema dumps", long_about = None)]
#[command(after_help = "EXAMPLES:
    schemafmt db/structure.sql
    pg_dump --schema-only mydb | schemafmt
    schemafmt --check db/structure.sql
    schemafmt --transforms inline_primary_keys,sort_table_columns -w db/structure.sql")]
struct Cli {
    /// Dump files to format. Reads stdin when none are given.
    files: Vec<PathBuf>,

    /// Rewrite files in place
    #[arg(short, long, conflicts_with = "check")]
    write: bool,

    /// Exit with status 1 when a file is not formatted
    #[arg(long)]
    check: bool,

    /// Configuration file
    #[arg(long, env = "SCHEMAFMT_CONFIG")]
    config: Option<PathBuf>,

    /// Comma-separated transforms to run instead of the configured ones
    #[arg(long)]
    transforms: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available transforms
    Transforms,
    /// Print the parsed statements of a dump as JSON
    Dump {
        /// The dump file
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode> {
    match &cli.command {
        Some(Commands::Transforms) => {
            list_transforms();
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Dump { file }) => {
            dump(file)?;
            Ok(ExitCode::SUCCESS)
        }
        None => format_inputs(cli),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(list) = &cli.transforms {
        config.transforms = transforms::parse_list(list)?;
    }
    debug!(transforms = ?config.transforms, "configured pipeline");
    Ok(config)
}

fn format_inputs(cli: &Cli) -> Result<ExitCode> {
    let formatter = Formatter::new(&load_config(cli)?);

    if cli.files.is_empty() {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("failed to read stdin")?;
        let formatted = format_source(&formatter, &source, "<stdin>")?;
        if cli.check {
            if formatted != source {
                println!("{}", "<stdin>".yellow());
                return Ok(ExitCode::from(1));
            }
        } else {
            print!("{}", formatted);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut unformatted = Vec::new();
    for path in &cli.files {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let formatted = format_source(&formatter, &source, &path.display().to_string())?;

        if cli.check {
            if formatted != source {
                unformatted.push(path);
            }
        } else if cli.write {
            if formatted != source {
                fs::write(path, &formatted)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                eprintln!("{} {}", "✓ Formatted".green(), path.display());
            }
        } else {
            print!("{}", formatted);
        }
    }

    if unformatted.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }
    eprintln!(
        "{} {} file(s) would be reformatted:",
        "✗".red(),
        unformatted.len()
    );
    for path in unformatted {
        println!("{}", path.display().to_string().yellow());
    }
    Ok(ExitCode::from(1))
}

/// Format one input, pointing parse errors at their line and column.
fn format_source(formatter: &Formatter, source: &str, name: &str) -> Result<String> {
    formatter.format(source).map_err(|e| {
        if let FormatError::Parse { position, message } = &e {
            let (line, col) = line_col(source, *position);
            return anyhow::anyhow!("{}:{}:{}: {}", name, line, col, message);
        }
        anyhow::Error::new(e).context(format!("failed to format {}", name))
    })
}

fn list_transforms() {
    println!("{}", "Transforms (in recommended order):".cyan().bold());
    println!();
    for kind in TransformKind::ALL {
        let marker = if kind.is_default() {
            "default".green()
        } else {
            "opt-in".dimmed()
        };
        println!("  {:<35} {}", kind.as_str().yellow(), marker);
    }
}

fn dump(file: &Path) -> Result<()> {
    let source =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let statements = schemafmt::parser::parse(&source)
        .map_err(|e| match e.position() {
            Some(position) => {
                let (line, col) = line_col(&source, position);
                anyhow::anyhow!("{}:{}:{}: {}", file.display(), line, col, e)
            }
            None => e.into(),
        })?;
    println!("{}", serde_json::to_string_pretty(&statements)?);
    Ok(())
}
