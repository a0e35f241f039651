// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trait seams between the batch engine and its collaborators.
//
// The batch engine never decodes or encodes pixels itself. It hands each
// `FileTask` to a `TaskExecutor` and reports progress through a
// `ProgressSink`, so image codecs and terminal rendering stay swappable.

use crate::error::Result;
use crate::summary::RunSummary;
use crate::types::{Completion, FileTask, JobPhase, Outcome};

/// Performs the per-file work for one task.
///
/// Implementations are shared by every worker thread, so they must be
/// `Sync` and must not rely on per-call mutable state.
pub trait TaskExecutor: Sync {
    /// Read the source, transform it, and write the output described by
    /// `task.output`. An `Err` is recorded as a failed outcome.
    fn execute(&self, task: &FileTask) -> Result<Completion>;
}

impl<F> TaskExecutor for F
where
    F: Fn(&FileTask) -> Result<Completion> + Sync,
{
    fn execute(&self, task: &FileTask) -> Result<Completion> {
        self(task)
    }
}

/// Observes a run while it happens.
///
/// Called only from the aggregating thread, in arrival order.
pub trait ProgressSink {
    /// The job entered a new lifecycle phase.
    fn on_phase(&self, _phase: JobPhase) {}

    /// Dispatch is about to start with this many tasks.
    fn on_start(&self, _total: usize) {}

    /// One task finished (or was skipped).
    fn on_outcome(&self, _outcome: &Outcome) {}

    /// The run is done.
    fn on_finish(&self, _summary: &RunSummary) {}
}

/// A sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}
