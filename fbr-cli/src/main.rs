use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, warn};

use fbr_cli::config::CliConfig;
use fbr_cli::{app, logging, report};
use fbr_core::FilerStatus;
use fbr_core::db::DbConfig;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Pakistan (FBR) personal income tax calculator.
///
/// Loads slab tables and capital gains rates for the requested tax year from
/// the configured database and computes the tax position of a return.
#[derive(Debug, Parser)]
#[command(name = "fbr-tax", version)]
struct Cli {
    /// Configuration file (default: ./fbr-tax.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend to use.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string: a file path, `sqlite://` URL or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute the tax position of a return.
    Compute {
        /// JSON file with the return's forms.
        #[arg(long)]
        forms: PathBuf,

        /// Tax year, e.g. 2025-26.
        #[arg(long)]
        tax_year: Option<String>,

        /// `filer` or `non_filer`.
        #[arg(long, value_parser = parse_filer_status)]
        filer_status: Option<FilerStatus>,

        /// Store the headline figures for later reporting.
        #[arg(long)]
        save: bool,

        /// Label for the saved computation.
        #[arg(long, default_value = "")]
        label: String,

        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check a return for errors and warnings without computing.
    Validate {
        #[arg(long)]
        forms: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Show the slab table for a tax year.
    Slabs {
        #[arg(long)]
        tax_year: Option<String>,

        #[arg(long, value_parser = parse_filer_status)]
        filer_status: Option<FilerStatus>,
    },

    /// List saved computations, newest first.
    History {
        #[arg(long)]
        tax_year: Option<String>,

        /// Delete the saved computation with this id instead of listing.
        #[arg(long)]
        delete: Option<i64>,
    },
}

fn parse_filer_status(s: &str) -> Result<FilerStatus, String> {
    FilerStatus::parse(s).ok_or_else(|| format!("unknown filer status '{s}' (expected filer or non_filer)"))
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    logging::init_logging(&config.log_level);
    if let Some(path) = &config.log_file {
        if let Err(e) = logging::enable_file_logging(path) {
            warn!(error = %e, "file logging disabled");
        }
    }
    debug!(?config, "loaded configuration");

    let db_config = DbConfig {
        backend: cli.backend.unwrap_or_else(|| config.backend.clone()),
        connection_string: cli.db.unwrap_or_else(|| config.database_url.clone()),
    };

    match cli.command {
        Command::Validate { forms, json } => {
            let forms = app::read_forms(&forms)?;
            let report = app::validate(&forms);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report::render_validation(&report));
            }
            if !report.is_valid() {
                std::process::exit(1);
            }
        }
        Command::Compute {
            forms,
            tax_year,
            filer_status,
            save,
            label,
            json,
        } => {
            let forms = app::read_forms(&forms)?;
            let tax_year = tax_year.unwrap_or_else(|| config.default_tax_year.clone());
            let filer_status = filer_status.unwrap_or(config.default_filer_status);

            let repo = app::open_repository(&db_config).await?;
            let result = app::compute(&*repo, &forms, &tax_year, filer_status).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::render_result(&result));
            }

            if save {
                let saved = app::save(&*repo, &label, &result).await?;
                eprintln!("Saved computation {}.", saved.id);
            }
        }
        Command::Slabs {
            tax_year,
            filer_status,
        } => {
            let tax_year = tax_year.unwrap_or_else(|| config.default_tax_year.clone());
            let filer_status = filer_status.unwrap_or(config.default_filer_status);

            let repo = app::open_repository(&db_config).await?;
            let table = app::slab_table(&*repo, &tax_year, filer_status).await?;
            print!("{}", report::render_slabs(&table));
        }
        Command::History { tax_year, delete } => {
            let repo = app::open_repository(&db_config).await?;
            match delete {
                Some(id) => {
                    app::delete(&*repo, id).await?;
                    println!("Deleted computation {id}.");
                }
                None => {
                    let computations = app::history(&*repo, tax_year.as_deref()).await?;
                    print!("{}", report::render_history(&computations));
                }
            }
        }
    }

    Ok(())
}
