use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed, ordered list of steps a run executes (spec §4.6).
///
/// Order matters: [`Step::ALL`] is iterated by the orchestrator and
/// encodes the flush-ordering / FK-safety requirement directly — entity
/// steps precede the association steps that reference them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Step {
    LabelsEntities,
    ArtistsEntities,
    MastersEntities,
    ReleasesEntities,
    MasterGenresCollection,
    MasterGenresUpsert,
    MasterGenreAssociations,
    ReleaseGenresCollection,
    ReleaseGenresUpsert,
    ReleaseGenreAssociations,
    ReleaseLabelAssociations,
    MasterArtistAssociations,
    ReleaseArtistAssociations,
    Cleanup,
}

impl Step {
    /// All fourteen steps, in the fixed execution order.
    pub const ALL: [Self; 14] = [
        Self::LabelsEntities,
        Self::ArtistsEntities,
        Self::MastersEntities,
        Self::ReleasesEntities,
        Self::MasterGenresCollection,
        Self::MasterGenresUpsert,
        Self::MasterGenreAssociations,
        Self::ReleaseGenresCollection,
        Self::ReleaseGenresUpsert,
        Self::ReleaseGenreAssociations,
        Self::ReleaseLabelAssociations,
        Self::MasterArtistAssociations,
        Self::ReleaseArtistAssociations,
        Self::Cleanup,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LabelsEntities => "LabelsEntities",
            Self::ArtistsEntities => "ArtistsEntities",
            Self::MastersEntities => "MastersEntities",
            Self::ReleasesEntities => "ReleasesEntities",
            Self::MasterGenresCollection => "MasterGenresCollection",
            Self::MasterGenresUpsert => "MasterGenresUpsert",
            Self::MasterGenreAssociations => "MasterGenreAssociations",
            Self::ReleaseGenresCollection => "ReleaseGenresCollection",
            Self::ReleaseGenresUpsert => "ReleaseGenresUpsert",
            Self::ReleaseGenreAssociations => "ReleaseGenreAssociations",
            Self::ReleaseLabelAssociations => "ReleaseLabelAssociations",
            Self::MasterArtistAssociations => "MasterArtistAssociations",
            Self::ReleaseArtistAssociations => "ReleaseArtistAssociations",
            Self::Cleanup => "Cleanup",
        }
    }

    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.as_str() == s)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The reporting stage of a step, for progress broadcast purposes
/// (spec GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    InProgress,
    Completed,
    Failed,
}

/// The persisted outcome of one step of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<f64>,
    pub error: Option<String>,
    /// Records dropped by the converter while this step ran (§4.2),
    /// surfaced without needing to grep logs (SPEC_FULL.md, Supplemented
    /// Features).
    pub records_dropped: u64,
}

impl StepRecord {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// The state machine a [`ProcessingRun`] moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Ready,
    Processing,
    Completed,
    Failed,
}

/// One end-to-end ingestion of one monthly dump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingRun {
    pub year_month: String,
    pub status: RunStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub(crate) step_map: BTreeMap<String, StepRecord>,
}

impl ProcessingRun {
    #[must_use]
    pub fn new(year_month: impl Into<String>) -> Self {
        Self {
            year_month: year_month.into(),
            status: RunStatus::Ready,
            started_at: None,
            completed_at: None,
            error: None,
            step_map: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn step_record(&self, step: Step) -> Option<&StepRecord> {
        self.step_map.get(step.as_str())
    }

    #[must_use]
    pub fn is_step_completed(&self, step: Step) -> bool {
        self.step_record(step).is_some_and(StepRecord::is_completed)
    }

    /// Records a successful step completion. Monotonic per invariant 6:
    /// callers should not call this for a step that's already completed
    /// (the orchestrator skips completed steps before ever invoking the
    /// step function).
    pub fn mark_step_completed(&mut self, step: Step, duration_secs: f64, records_dropped: u64) {
        self.step_map.insert(
            step.as_str().to_string(),
            StepRecord {
                completed_at: Some(Utc::now()),
                duration_secs: Some(duration_secs),
                error: None,
                records_dropped,
            },
        );
    }

    /// Records a step failure. Does not change `completed_at`, so a step
    /// that failed is never mistaken for one that completed.
    pub fn mark_step_failed(&mut self, step: Step, error: impl Into<String>) {
        self.step_map.insert(
            step.as_str().to_string(),
            StepRecord {
                completed_at: None,
                duration_secs: None,
                error: Some(error.into()),
                records_dropped: 0,
            },
        );
    }

    pub fn start(&mut self) {
        self.status = RunStatus::Processing;
        self.started_at = Some(Utc::now());
        self.error = None;
    }

    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.error = Some(error.into());
    }

    /// Reopens a `failed` run so it can be retried. Per spec §4.6, only
    /// `failed -> processing` is a valid externally-triggered transition;
    /// callers (the `resume` CLI path) are expected to check
    /// `self.status == RunStatus::Failed` first.
    pub fn reopen(&mut self) {
        self.status = RunStatus::Processing;
        self.error = None;
    }

    #[must_use]
    pub fn steps(&self) -> &BTreeMap<String, StepRecord> {
        &self.step_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_all_is_ordered_fk_safe() {
        let idx = |s: Step| Step::ALL.iter().position(|x| *x == s).unwrap();
        assert!(idx(Step::LabelsEntities) < idx(Step::MasterArtistAssociations));
        assert!(idx(Step::ArtistsEntities) < idx(Step::MasterArtistAssociations));
        assert!(idx(Step::MastersEntities) < idx(Step::MasterGenreAssociations));
        assert!(idx(Step::ReleasesEntities) < idx(Step::ReleaseGenreAssociations));
        assert!(idx(Step::MasterGenresUpsert) < idx(Step::MasterGenreAssociations));
        assert!(idx(Step::MasterGenresCollection) < idx(Step::MasterGenresUpsert));
    }

    #[test]
    fn test_step_str_roundtrip() {
        for step in Step::ALL {
            assert_eq!(Step::from_str_opt(step.as_str()), Some(step));
        }
    }

    #[test]
    fn test_run_skips_completed_step() {
        let mut run = ProcessingRun::new("2024-01");
        assert!(!run.is_step_completed(Step::LabelsEntities));
        run.mark_step_completed(Step::LabelsEntities, 1.5, 3);
        assert!(run.is_step_completed(Step::LabelsEntities));
        assert_eq!(run.step_record(Step::LabelsEntities).unwrap().records_dropped, 3);
    }

    #[test]
    fn test_run_failed_step_not_completed() {
        let mut run = ProcessingRun::new("2024-01");
        run.mark_step_failed(Step::MastersEntities, "boom");
        assert!(!run.is_step_completed(Step::MastersEntities));
        assert_eq!(
            run.step_record(Step::MastersEntities).unwrap().error.as_deref(),
            Some("boom")
        );
    }

    #[test]
    fn test_run_reopen_requires_failed() {
        let mut run = ProcessingRun::new("2024-01");
        run.start();
        run.fail("disk full");
        assert_eq!(run.status, RunStatus::Failed);
        run.reopen();
        assert_eq!(run.status, RunStatus::Processing);
        assert!(run.error.is_none());
    }
}
