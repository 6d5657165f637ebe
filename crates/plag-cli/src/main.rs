mod commands;
mod formatters;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::check::{check_command, CheckOptions, OutputFormat};
use plag_core::parser::Language;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "codeplag", version, about = "Structural feature extraction for code similarity analysis")]
struct Cli {
    /// Log filter used when RUST_LOG is not set, e.g. "debug" or "plag_core=trace"
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract features of files or a directory, writing them through the feature cache
    Check {
        /// Files to analyze
        #[arg()]
        files: Vec<PathBuf>,

        /// Directory to scan for sources
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Source language: py or cpp
        #[arg(long)]
        language: Option<Language>,

        /// Regex of paths to skip during directory scans
        #[arg(long)]
        exclude: Option<String>,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of the document store; enables the feature cache
        #[arg(long)]
        db_root: Option<PathBuf>,

        /// Database name inside the document store
        #[arg(long)]
        db_name: Option<String>,

        /// Ignore any configured backend
        #[arg(long)]
        no_cache: bool,

        /// Output format: terminal or json
        #[arg(long, default_value = "terminal")]
        format: String,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Check {
            files,
            dir,
            language,
            exclude,
            config,
            db_root,
            db_name,
            no_cache,
            format,
        } => {
            let format = match format.as_str() {
                "json" => OutputFormat::Json,
                _ => OutputFormat::Terminal,
            };

            let result = check_command(CheckOptions {
                files,
                dir,
                language,
                exclude,
                config,
                db_root,
                db_name,
                no_cache,
                format,
            });
            if let Err(err) = result {
                eprintln!("{} {err:#}", "error:".red().bold());
                process::exit(1);
            }
        }
    }
}
