//! Loads rate tables from CSV into the SQLite store.
//!
//! Slab CSV columns: `tax_year,filer_status,min_income,max_income,fixed_amount,rate`
//! (empty `max_income` for the top bracket, rates as fractions).
//!
//! Capital gains CSV columns: `tax_year,bucket,rate`.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fbr_data::{CapitalGainRateLoader, SlabLoader};
use fbr_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fbr-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// CSV file of progressive tax slabs
    #[arg(short = 'f', long)]
    slabs: Option<PathBuf>,

    /// CSV file of capital gains rates
    #[arg(short = 'c', long)]
    capital_gains: Option<PathBuf>,

    /// SQLite database URL or path (created if missing)
    #[arg(short, long, default_value = "sqlite://fbr-tax.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    if let Some(path) = &args.slabs {
        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let records = SlabLoader::parse(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;
        println!("Parsed {} slab records from {}", records.len(), path.display());

        let inserted = SlabLoader::load(&repo, &records)
            .await
            .context("Failed to load tax slabs into database")?;
        println!("Loaded {} tax slabs.", inserted);
    }

    if let Some(path) = &args.capital_gains {
        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
        let records = CapitalGainRateLoader::parse(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;

        let written = CapitalGainRateLoader::load(&repo, &records)
            .await
            .context("Failed to load capital gains rates into database")?;
        println!("Loaded {} capital gains rates.", written);
    }

    if args.slabs.is_none() && args.capital_gains.is_none() && !args.migrate && args.seeds.is_none()
    {
        println!("Nothing to do; pass --slabs, --capital-gains, --migrate or --seeds.");
    }

    Ok(())
}
