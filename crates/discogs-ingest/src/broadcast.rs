//! Best-effort progress publication (spec §4.7).
//!
//! Grounded on `tessitura_cli::commands::process::run_process`'s
//! `workflow.subscribe()` loop: a broadcast channel that downstream
//! listeners (the CLI's progress bar, eventually a web admin panel) can
//! subscribe to without the ingestion pipeline ever blocking on them.

use std::time::{Duration, Instant};

use discogs_core::model::{Stage, Step};
use serde::Serialize;
use tokio::sync::broadcast;

/// One progress event, mirroring spec §6's admin payload shape.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub year_month: String,
    pub step: String,
    pub stage: StageTag,
    pub processed: u64,
    pub total: u64,
    pub percentage: f64,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageTag {
    InProgress,
    Completed,
    Failed,
}

impl From<Stage> for StageTag {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::InProgress => Self::InProgress,
            Stage::Completed => Self::Completed,
            Stage::Failed => Self::Failed,
        }
    }
}

/// Publishes [`ProgressEvent`]s over a `tokio::sync::broadcast` channel,
/// throttled to at most once per `interval` while in-progress; `start`
/// and `finish` calls always publish regardless of throttling.
pub struct ProgressBroadcaster {
    sender: broadcast::Sender<ProgressEvent>,
    interval: Duration,
    last_sent: Option<Instant>,
}

impl ProgressBroadcaster {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        let (sender, _rx) = broadcast::channel(256);
        Self {
            sender,
            interval,
            last_sent: None,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    fn publish(&self, event: ProgressEvent) {
        // Send failures mean nobody is subscribed right now; never let
        // that block or fail ingestion (spec §4.7).
        let _ = self.sender.send(event);
    }

    pub fn start(&mut self, year_month: &str, step: Step, total: u64) {
        self.last_sent = Some(Instant::now());
        self.publish(ProgressEvent {
            year_month: year_month.to_string(),
            step: step.as_str().to_string(),
            stage: StageTag::InProgress,
            processed: 0,
            total,
            percentage: 0.0,
            error_message: None,
        });
    }

    /// Throttled progress tick; no-op unless `interval` has elapsed since
    /// the last publish.
    pub fn tick(&mut self, year_month: &str, step: Step, processed: u64, total: u64) {
        let should_send = self
            .last_sent
            .is_none_or(|last| last.elapsed() >= self.interval);
        if !should_send {
            return;
        }
        self.last_sent = Some(Instant::now());
        self.publish(ProgressEvent {
            year_month: year_month.to_string(),
            step: step.as_str().to_string(),
            stage: StageTag::InProgress,
            processed,
            total,
            percentage: percentage(processed, total),
            error_message: None,
        });
    }

    pub fn finish(&mut self, year_month: &str, step: Step, processed: u64, total: u64) {
        self.publish(ProgressEvent {
            year_month: year_month.to_string(),
            step: step.as_str().to_string(),
            stage: StageTag::Completed,
            processed,
            total,
            percentage: 100.0,
            error_message: None,
        });
    }

    pub fn fail(&mut self, year_month: &str, step: Step, error: impl Into<String>) {
        self.publish(ProgressEvent {
            year_month: year_month.to_string(),
            step: step.as_str().to_string(),
            stage: StageTag::Failed,
            processed: 0,
            total: 0,
            percentage: 0.0,
            error_message: Some(error.into()),
        });
    }
}

fn percentage(processed: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (processed as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_always_publishes() {
        let mut b = ProgressBroadcaster::new(Duration::from_secs(10));
        let mut rx = b.subscribe();
        b.start("2024-01", Step::LabelsEntities, 100);
        let event = rx.try_recv().unwrap();
        assert!(matches!(event.stage, StageTag::InProgress));
        assert_eq!(event.total, 100);
    }

    #[test]
    fn test_tick_throttles_within_interval() {
        let mut b = ProgressBroadcaster::new(Duration::from_secs(3600));
        let mut rx = b.subscribe();
        b.start("2024-01", Step::LabelsEntities, 100);
        rx.try_recv().unwrap();

        b.tick("2024-01", Step::LabelsEntities, 10, 100);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_finish_always_publishes() {
        let mut b = ProgressBroadcaster::new(Duration::from_secs(3600));
        let mut rx = b.subscribe();
        b.start("2024-01", Step::LabelsEntities, 100);
        rx.try_recv().unwrap();

        b.finish("2024-01", Step::LabelsEntities, 100, 100);
        let event = rx.try_recv().unwrap();
        assert!(matches!(event.stage, StageTag::Completed));
        assert!((event.percentage - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentage_zero_total() {
        assert!((percentage(0, 0)).abs() < f64::EPSILON);
    }
}
