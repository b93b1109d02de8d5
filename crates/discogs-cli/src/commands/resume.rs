use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use discogs_core::model::RunStatus;
use discogs_core::schema::SqliteRepository;
use discogs_core::Repository;
use discogs_ingest::{Config, StepOrchestrator};
use tokio_util::sync::CancellationToken;

/// Reopens a `Failed` run and re-executes the pipeline from its first
/// incomplete step. Refuses to touch a `Completed` or already-`Processing`
/// run: those have no business being "resumed".
pub async fn run_resume(mut config: Config, year_month: String, data_dir: Option<PathBuf>) -> Result<()> {
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }

    let repo: Arc<dyn Repository> =
        Arc::new(SqliteRepository::open(&config.database_path).context("failed to open database")?);

    let mut run = repo
        .get_run(&year_month)?
        .with_context(|| format!("no run found for {year_month}"))?;

    match run.status {
        RunStatus::Failed => {}
        RunStatus::Completed => bail!("run for {year_month} already completed, nothing to resume"),
        RunStatus::Processing => bail!("run for {year_month} is already processing"),
        RunStatus::Ready => bail!("run for {year_month} has not started yet, use `run` instead"),
    }

    run.reopen();
    repo.upsert_run(&run)?;

    let cancel = CancellationToken::new();
    let ctrlc_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("received Ctrl-C, stopping after the current step finishes");
            ctrlc_cancel.cancel();
        }
    });

    let orchestrator = StepOrchestrator::new(repo, config);
    orchestrator
        .process_year_month(&year_month, cancel)
        .await
        .context("resumed run failed")
}
