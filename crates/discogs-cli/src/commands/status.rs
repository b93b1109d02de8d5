use anyhow::{Context, Result};
use discogs_core::model::{ProcessingRun, RunStatus, Step};
use discogs_core::schema::SqliteRepository;
use discogs_core::Repository;
use discogs_ingest::Config;

pub fn show_status(config: &Config, year_month: Option<String>) -> Result<()> {
    let repo = SqliteRepository::open(&config.database_path).context("failed to open database")?;

    let run = match year_month {
        Some(ref year_month) => repo.get_run(year_month)?,
        None => repo.get_latest_run()?,
    };

    let Some(run) = run else {
        println!("No runs found.");
        return Ok(());
    };

    print_run(&run);
    Ok(())
}

fn print_run(run: &ProcessingRun) {
    println!("\nRun {}\n", run.year_month);
    println!("  Status: {}", status_label(run.status));
    if let Some(started_at) = run.started_at {
        println!("  Started: {started_at}");
    }
    if let Some(completed_at) = run.completed_at {
        println!("  Completed: {completed_at}");
    }
    if let Some(error) = &run.error {
        println!("  Error: {error}");
    }

    println!("\n  Steps:");
    for step in Step::ALL {
        let Some(record) = run.step_record(step) else {
            println!("    {:<28} pending", step.as_str());
            continue;
        };
        if record.is_completed() {
            let duration = record.duration_secs.unwrap_or(0.0);
            println!(
                "    {:<28} done  ({duration:.2}s, {} dropped)",
                step.as_str(),
                record.records_dropped
            );
        } else if let Some(error) = &record.error {
            println!("    {:<28} failed: {error}", step.as_str());
        } else {
            println!("    {:<28} pending", step.as_str());
        }
    }
}

const fn status_label(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Ready => "ready",
        RunStatus::Processing => "processing",
        RunStatus::Completed => "completed",
        RunStatus::Failed => "failed",
    }
}
