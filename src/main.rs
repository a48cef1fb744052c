use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use practice_risk_engine::config::DEFAULT_LOG_FILTER;
use practice_risk_engine::{
    aggregate_risk, build_weekly_reports, classify, report, EngineConfig, Entry,
};

mod db;

#[derive(Parser)]
#[command(name = "practice-risk")]
#[command(about = "Patient risk monitoring and weekly progress reports for a practice", long_about = None)]
struct Cli {
    /// JSON file overriding the engine settings (risk phrases)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import journal entries from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Record a journal entry and print its risk flag
    Record {
        #[arg(long)]
        patient: Uuid,
        #[arg(long)]
        mood: i32,
        #[arg(long)]
        anxiety: Option<i32>,
        #[arg(long)]
        stress: Option<i32>,
        #[arg(long)]
        sleep: Option<f64>,
        #[arg(long)]
        text: Option<String>,
        /// Entry date, defaults to today (UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the at-risk patients and weekly summary for a practitioner
    Dashboard {
        #[arg(long)]
        practitioner: Uuid,
        #[arg(long)]
        json: bool,
    },
    /// Generate a weekly progress report for one patient
    Report {
        #[arg(long)]
        patient: Uuid,
        #[arg(long)]
        json: bool,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref()).context("failed to load config")?;
    let phrases = config.phrases();

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

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
            println!("Inserted {inserted} entries from {}.", csv.display());
        }
        Commands::Record {
            patient,
            mood,
            anxiety,
            stress,
            sleep,
            text,
            date,
        } => {
            let now = Utc::now();
            let entry = Entry {
                id: Uuid::new_v4(),
                patient_id: patient,
                date: date.unwrap_or_else(|| now.date_naive()),
                mood: Some(mood),
                anxiety,
                stress,
                sleep,
                text,
                created_at: now,
            };
            let stored = db::append_entry(&pool, &entry).await?;
            let flag = classify(&stored, &phrases);
            tracing::info!(entry_id = %stored.id, flag = flag.as_str(), "entry recorded");
            println!("Recorded entry {} for {} (risk flag: {}).", stored.id, stored.date, flag.as_str());
        }
        Commands::Dashboard { practitioner, json } => {
            let patients = db::list_patients_for_practitioner(&pool, practitioner).await?;
            let ids: Vec<Uuid> = patients.iter().map(|p| p.id).collect();
            let entries = db::list_entries_for_patients(&pool, &ids).await?;
            let dashboard = aggregate_risk(practitioner, &patients, &entries, &phrases, Utc::now());

            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                print!("{}", report::render_dashboard(&dashboard));
            }
        }
        Commands::Report { patient, json, out } => {
            let patient = db::find_patient(&pool, patient).await?;
            let entries = db::list_entries_for_patient(&pool, patient.id).await?;
            let reports = build_weekly_reports(&entries);

            let rendered = if json {
                serde_json::to_string_pretty(&reports)?
            } else {
                report::render_markdown(&patient.name, &reports)
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Report written to {}.", path.display());
                }
                None => println!("{rendered}"),
            }
        }
    }

    Ok(())
}
