use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

mod db;
mod models;
mod report;
mod stats;

use stats::StatsConfig;

#[derive(Parser)]
#[command(name = "gradebook-stats")]
#[command(about = "Weighted grade statistics over a gradebook record store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import score rows from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Compute pass-rate statistics, optionally scoped to one class
    Stats {
        #[arg(long)]
        class: Option<i32>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        class: Option<i32>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} score rows from {}.", csv.display());
        }
        Commands::Stats { class } => {
            let records = db::fetch_grades(&pool, class).await?;
            let config = StatsConfig::default();

            match stats::compute_stats(&records, &config) {
                None => println!("No grade data found for this scope."),
                Some(stats) => println!("{}", serde_json::to_string_pretty(&stats)?),
            }
        }
        Commands::Report { class, limit, out } => {
            let records = db::fetch_grades(&pool, class).await?;
            let config = StatsConfig::default();
            let report = report::build_report(class, &records, &config, limit);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
