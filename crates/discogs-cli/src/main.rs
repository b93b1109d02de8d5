use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "discogs-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the SQLite database (default: platform data dir / discogs-ingest / discogs.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Run the ingestion pipeline
    ///
    /// Verifies the four dump files for the target month are present under
    /// `--data-dir`, then executes every incomplete step of the fixed
    /// fourteen-step order in turn: entities first, then the genre/style
    /// collection and upsert passes, then the association passes, then
    /// cleanup. A run already `Completed` for that month is a no-op; a run
    /// left `Processing` or `Failed` resumes at its first incomplete step.
    ///
    /// Defaults to the current UTC year-month if `--year-month` is omitted.
    ///
    /// Ctrl-C stops the run cooperatively: the current step finishes its
    /// in-flight batch, the step is marked failed, and the run can be
    /// retried later with `discogs-cli resume`.
    Run {
        /// Root directory holding `{YYYY-MM}/{labels,artists,masters,releases}.xml.gz`
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Month to ingest, as `YYYY-MM` (default: current UTC month)
        #[arg(long)]
        year_month: Option<String>,
    },
    /// Show the status of a run
    ///
    /// Prints the run's overall status and, for each of the fourteen
    /// steps, whether it completed, how long it took, how many records it
    /// dropped, or the error it failed with.
    ///
    /// Defaults to the most recently started run if `--year-month` is
    /// omitted.
    Status {
        /// Month to inspect, as `YYYY-MM` (default: latest run)
        #[arg(long)]
        year_month: Option<String>,
    },
    /// Resume a failed run
    ///
    /// Reopens a run that is in the `Failed` state and re-executes the
    /// pipeline, which picks up at the first incomplete step (spec
    /// invariant: `is_step_completed` checks are data-driven, not
    /// position-driven). Refuses to touch a run that is `Completed` or
    /// already `Processing`.
    Resume {
        /// Month to resume, as `YYYY-MM`
        year_month: String,

        /// Root directory holding `{YYYY-MM}/{labels,artists,masters,releases}.xml.gz`
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("discogs-ingest")
        .join("discogs.db")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let db_path = cli.db.clone().unwrap_or_else(default_db_path);
    let config = match cli.db {
        Some(db) => discogs_ingest::Config::load_with_db_path(db)?,
        None => discogs_ingest::Config::load()?,
    };

    twyg::init(&config.logging).unwrap_or_else(|e| {
        eprintln!("warning: failed to initialize logging: {e}, continuing without it");
    });

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    match cli.command {
        Commands::Run { data_dir, year_month } => {
            commands::run_ingest(config, data_dir, year_month).await?;
        }
        Commands::Status { year_month } => {
            commands::show_status(&config, year_month)?;
        }
        Commands::Resume { year_month, data_dir } => {
            commands::run_resume(config, year_month, data_dir).await?;
        }
    }

    Ok(())
}
