//! Factory License CLI
//!
//! Drives the document form from the command line:
//! 1. `catalog` prints the form with every slot, icon and optional marker
//! 2. `validate` checks a saved record against the catalog
//! 3. `submit` pre-fills from a record, uploads files, validates and saves
//!
//! Usage:
//!   cargo run --bin factory_license -- catalog
//!   cargo run --bin factory_license -- validate draft.json
//!   cargo run --bin factory_license -- submit draft.json \
//!     --upload fixedAssets=./assets.pdf \
//!     --upload auditedBalanceSheet=./balance.pdf

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use factory_license::notify::{TracingNavigator, TracingNotifier};
use factory_license::submission::DirectorySubmissionSink;
use factory_license::upload::LocalUploadService;
use factory_license::{
    DocumentForm, FormConfig, FormError, FormRecord, FormView, UploadedFile, ValidationSchema,
};

/// Factory license document form
#[derive(Parser, Debug)]
#[command(name = "factory_license")]
#[command(about = "Validate and submit factory license documents")]
struct Args {
    /// Catalog YAML (defaults to the built-in factory license catalog)
    #[arg(long, global = true, env = "FACTORY_LICENSE_CATALOG")]
    catalog: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the rendered form
    Catalog,

    /// Validate a record file (JSON object of key -> file reference)
    Validate {
        record: PathBuf,
    },

    /// Upload files, validate and submit
    Submit {
        /// Record to pre-fill from
        record: Option<PathBuf>,

        /// Files to upload, as key=path (can be specified multiple times)
        #[arg(long, short = 'u', value_parser = parse_key_val)]
        upload: Vec<(String, PathBuf)>,
    },
}

/// Parse key=path pairs from command line
fn parse_key_val(s: &str) -> Result<(String, PathBuf), String> {
    let (key, path) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid key=path pair: {}", s))?;
    Ok((key.to_string(), PathBuf::from(path)))
}

fn read_record(path: &Path) -> Result<FormRecord> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    FormRecord::from_json(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_view(view: &FormView) {
    println!("{}", view.title.cyan().bold());
    if let Some(subtitle) = &view.subtitle {
        println!("{}", subtitle.dimmed());
    }

    for section in &view.sections {
        println!("\n{} {}", format!("[{}]", section.icon).blue(), section.heading.bold());
        for field in &section.fields {
            let marker = field
                .optional_marker()
                .map(|m| format!(" {}", m.dimmed()))
                .unwrap_or_default();
            let value = if field.value.is_empty() {
                "-".dimmed().to_string()
            } else {
                field.value.green().to_string()
            };
            println!(
                "  {} {}{}: {}",
                format!("[{}]", field.icon).blue(),
                field.label,
                marker,
                value
            );
            if let Some(error) = &field.error {
                println!("      {} {}", "!".red().bold(), error.red());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = FormConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if args.catalog.is_some() {
        config.catalog_path = args.catalog.clone();
    }

    let catalog = config
        .load_catalog()
        .context("Failed to load document catalog")?;

    match args.command {
        Command::Catalog => {
            let view = DocumentForm::new(catalog).render();
            if args.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print_view(&view);
            }
        }

        Command::Validate { record } => {
            let record = read_record(&record)?;
            let schema = ValidationSchema::from_catalog(&catalog);

            match schema.validate(&record) {
                Ok(valid) => {
                    if args.json {
                        println!("{}", serde_json::to_string_pretty(&valid)?);
                    } else {
                        println!(
                            "{} {} document(s) attached",
                            "VALID:".green().bold(),
                            valid.len()
                        );
                    }
                }
                Err(errors) => {
                    if args.json {
                        println!("{}", serde_json::to_string_pretty(&errors)?);
                    } else {
                        for error in &errors {
                            println!("{} {}", "ERROR:".red().bold(), error);
                        }
                    }
                    std::process::exit(1);
                }
            }
        }

        Command::Submit { record, upload } => {
            let mut form = DocumentForm::new(catalog).with_success_route(&config.success_route);
            if let Some(path) = &record {
                form = form.with_snapshot(&read_record(path)?);
            }

            let uploads = LocalUploadService::new(&config.upload_dir);
            for (key, path) in &upload {
                // Unreadable files and upload failures stay on the field;
                // keep going with the rest
                let result = match UploadedFile::from_path(path).await {
                    Ok(file) => form.upload(key, &file, &uploads).await,
                    Err(cause) => Err(form.reject_upload(key, cause)),
                };
                if let Err(e) = result {
                    eprintln!("{} {} ({})", "UPLOAD:".yellow().bold(), e, path.display());
                }
            }

            let sink = DirectorySubmissionSink::new(&config.submission_dir);
            match form.submit(&sink, &TracingNotifier, &TracingNavigator).await {
                Ok(receipt) => {
                    if args.json {
                        println!("{}", serde_json::to_string_pretty(&receipt)?);
                    } else {
                        println!(
                            "{} {} ({})",
                            "SUBMITTED:".green().bold(),
                            receipt.submission_id,
                            receipt.location.unwrap_or_default()
                        );
                    }
                }
                Err(FormError::Validation(_)) => {
                    if args.json {
                        println!("{}", serde_json::to_string_pretty(form.errors())?);
                    } else {
                        print_view(&form.render());
                    }
                    std::process::exit(1);
                }
                Err(e) => return Err(e).context("Submission failed"),
            }
        }
    }

    Ok(())
}
