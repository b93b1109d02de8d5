use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use discogs_core::schema::SqliteRepository;
use discogs_core::Repository;
use discogs_ingest::{Config, StepOrchestrator};
use tokio_util::sync::CancellationToken;

/// Wires `tokio::signal::ctrl_c()` to a `CancellationToken` and runs the
/// pipeline to completion (or until cancelled).
pub async fn run_ingest(mut config: Config, data_dir: Option<PathBuf>, year_month: Option<String>) -> Result<()> {
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }

    let repo: Arc<dyn Repository> =
        Arc::new(SqliteRepository::open(&config.database_path).context("failed to open database")?);
    let cancel = CancellationToken::new();

    let ctrlc_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("received Ctrl-C, stopping after the current step finishes");
            ctrlc_cancel.cancel();
        }
    });

    let orchestrator = StepOrchestrator::new(repo, config);

    let result = match year_month {
        Some(year_month) => orchestrator.process_year_month(&year_month, cancel).await,
        None => orchestrator.process_xml_files(cancel).await,
    };

    result.context("ingestion run failed")
}
