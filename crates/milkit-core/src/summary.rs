// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run summary — aggregate counters and failure diagnostics for one batch run.
//
// `SummaryBuilder` is owned by the single aggregating thread and folds each
// outcome in as it arrives. Folding is commutative, so arrival order never
// changes the finished `RunSummary`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{Outcome, OutcomeStatus, RunId, SkipReason};

/// A failed file and the reason it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub source: PathBuf,
    pub reason: String,
}

/// A skipped file and why it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipRecord {
    pub source: PathBuf,
    pub reason: SkipReason,
}

/// Finished, immutable result of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    run_id: RunId,
    output_root: PathBuf,
    total: usize,
    succeeded: usize,
    skipped: usize,
    failed: usize,
    failures: Vec<FailureRecord>,
    skips: Vec<SkipRecord>,
    /// Files written without a watermark because no text resolved.
    unwatermarked: Vec<PathBuf>,
    interrupted: bool,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Summary for a run that found nothing to do.
    pub fn empty(run_id: RunId, output_root: impl Into<PathBuf>) -> Self {
        SummaryBuilder::new(run_id, output_root).finish(false)
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn failures(&self) -> &[FailureRecord] {
        &self.failures
    }

    pub fn skips(&self) -> &[SkipRecord] {
        &self.skips
    }

    pub fn unwatermarked(&self) -> &[PathBuf] {
        &self.unwatermarked
    }

    /// True when Ctrl-C (or another cancel) stopped dispatch early.
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at).to_std().unwrap_or_default()
    }
}

/// Mutable accumulator for a run in progress.
#[derive(Debug)]
pub struct SummaryBuilder {
    run_id: RunId,
    output_root: PathBuf,
    succeeded: usize,
    skipped: usize,
    failed: usize,
    failures: Vec<FailureRecord>,
    skips: Vec<SkipRecord>,
    unwatermarked: Vec<PathBuf>,
    track_watermarks: bool,
    started_at: DateTime<Utc>,
}

impl SummaryBuilder {
    pub fn new(run_id: RunId, output_root: impl Into<PathBuf>) -> Self {
        Self {
            run_id,
            output_root: output_root.into(),
            succeeded: 0,
            skipped: 0,
            failed: 0,
            failures: Vec::new(),
            skips: Vec::new(),
            unwatermarked: Vec::new(),
            track_watermarks: false,
            started_at: Utc::now(),
        }
    }

    /// Fold one outcome into the counters.
    pub fn record(&mut self, outcome: &Outcome) {
        match &outcome.status {
            OutcomeStatus::Succeeded(completion) => {
                self.succeeded += 1;
                if self.track_watermarks && completion.watermark.is_none() {
                    self.unwatermarked.push(outcome.source.clone());
                }
            }
            OutcomeStatus::Skipped(reason) => {
                self.skipped += 1;
                self.skips.push(SkipRecord {
                    source: outcome.source.clone(),
                    reason: reason.clone(),
                });
            }
            OutcomeStatus::Failed(err) => {
                self.failed += 1;
                self.failures.push(FailureRecord {
                    source: outcome.source.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    /// Also list successful files that were written without a watermark.
    pub fn tracking_watermarks(mut self) -> Self {
        self.track_watermarks = true;
        self
    }

    /// Freeze the counters. Lists are sorted so the summary does not depend
    /// on completion order.
    pub fn finish(mut self, interrupted: bool) -> RunSummary {
        self.failures.sort_by(|a, b| a.source.cmp(&b.source));
        self.skips.sort_by(|a, b| a.source.cmp(&b.source));
        self.unwatermarked.sort();
        RunSummary {
            run_id: self.run_id,
            output_root: self.output_root,
            total: self.succeeded + self.skipped + self.failed,
            succeeded: self.succeeded,
            skipped: self.skipped,
            failed: self.failed,
            failures: self.failures,
            skips: self.skips,
            unwatermarked: self.unwatermarked,
            interrupted,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MilkitError;
    use crate::types::{Completion, TaskId};

    fn outcome(id: usize, status: OutcomeStatus) -> Outcome {
        Outcome {
            task: TaskId(id),
            source: PathBuf::from(format!("in/{id}.png")),
            status,
        }
    }

    fn done(watermark: Option<&str>) -> OutcomeStatus {
        OutcomeStatus::Succeeded(Completion {
            output: PathBuf::from("out/x.png"),
            width: 10,
            height: 10,
            watermark: watermark.map(str::to_owned),
        })
    }

    #[test]
    fn totals_add_up() {
        let mut builder = SummaryBuilder::new(RunId::new(), "out");
        builder.record(&outcome(0, done(Some("A"))));
        builder.record(&outcome(1, OutcomeStatus::Skipped(SkipReason::OutputExists)));
        builder.record(&outcome(2, OutcomeStatus::Failed(MilkitError::Decode("truncated".into()))));
        builder.record(&outcome(3, done(None)));
        let summary = builder.finish(false);

        assert_eq!(summary.total(), 4);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(
            summary.total(),
            summary.succeeded() + summary.skipped() + summary.failed()
        );
        assert_eq!(summary.failures()[0].source, PathBuf::from("in/2.png"));
        assert!(summary.failures()[0].reason.contains("truncated"));
        assert!(summary.unwatermarked().is_empty());
    }

    #[test]
    fn arrival_order_does_not_matter() {
        let statuses = || {
            vec![
                outcome(0, OutcomeStatus::Failed(MilkitError::Encode("a".into()))),
                outcome(1, OutcomeStatus::Failed(MilkitError::Encode("b".into()))),
                outcome(2, done(None)),
            ]
        };
        let mut forward = SummaryBuilder::new(RunId::new(), "out").tracking_watermarks();
        for o in statuses() {
            forward.record(&o);
        }
        let mut backward = SummaryBuilder::new(RunId::new(), "out").tracking_watermarks();
        for o in statuses().into_iter().rev() {
            backward.record(&o);
        }
        let (a, b) = (forward.finish(false), backward.finish(false));
        assert_eq!(a.failures(), b.failures());
        assert_eq!(a.unwatermarked(), b.unwatermarked());
        assert_eq!(a.unwatermarked(), &[PathBuf::from("in/2.png")]);
    }

    #[test]
    fn empty_summary_is_zeroed() {
        let summary = RunSummary::empty(RunId::new(), "out");
        assert_eq!(summary.total(), 0);
        assert!(!summary.has_failures());
        assert!(!summary.interrupted());
    }
}
