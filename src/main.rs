//! pkg-importer CLI
//!
//! Usage:
//!   pkg-importer import <SPEC>... [--config FILE] [--concurrency N] [--force]

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use pkg_importer::utils::init_logging_from_config;
use pkg_importer::{BatchReport, ImportOptions, Importer, ImporterConfig, LoadedModule};

#[derive(Parser, Debug)]
#[command(name = "pkg-importer")]
#[command(about = "Import npm, Yarn and GitHub packages into a virtual module registry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import packages and print the batch report
    Import {
        /// Package specifiers (e.g. lodash@^4.17.21, alias@yarn:pkg, github:owner/repo)
        #[arg(required = true)]
        specifiers: Vec<String>,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Maximum dependencies resolved concurrently
        #[arg(long)]
        concurrency: Option<usize>,

        /// Re-fetch packages even if already loaded
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Import {
            specifiers,
            config,
            concurrency,
            force,
        } => cmd_import(&specifiers, config, concurrency, force).await,
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(2);
        }
    }
}

/// Run one import batch; `Ok(false)` when any package failed
async fn cmd_import(
    specifiers: &[String],
    config_path: Option<PathBuf>,
    concurrency: Option<usize>,
    force: bool,
) -> anyhow::Result<bool> {
    let mut config = match &config_path {
        Some(path) => ImporterConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ImporterConfig::default(),
    };
    config.apply_env_overrides();
    if let Some(n) = concurrency {
        config.max_concurrency = n;
    }
    config.validate()?;

    init_logging_from_config(config.logging.as_ref());

    let importer = Importer::from_config(config)?;
    let options = ImportOptions {
        force_reload: force,
    };
    let report = importer.import_batch_with(specifiers, &options).await;

    print_report(&report);
    print_loaded(&importer.list_loaded());
    Ok(report.is_success())
}

fn print_report(report: &BatchReport) {
    for outcome in &report.succeeded {
        println!("ok      {}", outcome.name);
    }
    for outcome in &report.failed {
        println!(
            "failed  {}: {}",
            outcome.name,
            outcome.error_message.as_deref().unwrap_or("unknown error")
        );
    }
    for warning in &report.warnings {
        println!("warning {}", warning);
    }
    for skip in &report.concurrent_skips {
        println!("note    {}", skip);
    }
    println!(
        "{} succeeded, {} failed",
        report.succeeded.len(),
        report.failed.len()
    );
}

fn print_loaded(modules: &[LoadedModule]) {
    if modules.is_empty() {
        return;
    }
    println!();
    println!("{:<40} {:<7} PATH", "MODULE", "LOADED");
    for module in modules {
        println!(
            "{:<40} {:<7} {}",
            module.name,
            if module.is_loaded { "yes" } else { "no" },
            module.storage_path.display()
        );
    }
}
