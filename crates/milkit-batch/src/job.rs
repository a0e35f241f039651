// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch job orchestration — resolve inputs, plan one task per file, dispatch
// to the worker pool and fold outcomes into a run summary.
//
// A job is single-shot: `run` consumes it. Setup errors (unusable input
// directory, unloadable metadata, invalid configuration) are returned before
// anything is dispatched; per-file errors only ever appear in the summary.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;

use milkit_core::config::{ExportConfig, JobSettings, WatermarkConfig};
use milkit_core::error::Result;
use milkit_core::summary::{RunSummary, SummaryBuilder};
use milkit_core::traits::{ProgressSink, TaskExecutor};
use milkit_core::types::{
    FileTask, JobPhase, LayerRule, Opacity, Outcome, OutcomeStatus, OverwritePolicy, RunId, SkipReason, SourceFile,
    SourceKind, TaskAction, TaskId,
};
use tracing::{debug, info, info_span, warn};

use crate::layout::OutputLayout;
use crate::metadata::WatermarkSource;
use crate::pool::{CancelToken, WorkerPool};
use crate::resolver::PathResolver;
use crate::review;

/// What each task in a job does.
#[derive(Debug, Clone)]
enum Plan {
    Export { layers: LayerRule },
    Watermark { source: WatermarkSource, opacity: Opacity },
}

impl Plan {
    fn label(&self) -> &'static str {
        match self {
            Self::Export { .. } => "export",
            Self::Watermark { .. } => "watermark",
        }
    }

    fn input_kind(&self) -> SourceKind {
        match self {
            Self::Export { .. } => SourceKind::LayeredDocument,
            Self::Watermark { .. } => SourceKind::Raster,
        }
    }

    fn action_for(&self, file: &SourceFile) -> TaskAction {
        match self {
            Self::Export { layers } => TaskAction::Export {
                layers: layers.clone(),
            },
            Self::Watermark { source, opacity } => {
                let text = source.resolve(&file.stem);
                if text.is_none() {
                    debug!(stem = %file.stem, "No watermark text for file");
                }
                TaskAction::Watermark {
                    text,
                    opacity: *opacity,
                }
            }
        }
    }
}

/// One batch run over a directory.
pub struct BatchJob<'a> {
    run_id: RunId,
    settings: JobSettings,
    plan: Plan,
    executor: &'a dyn TaskExecutor,
    cancel: CancelToken,
    phase: JobPhase,
}

impl<'a> BatchJob<'a> {
    /// Flatten every layered document under the input directory.
    pub fn export(config: ExportConfig, executor: &'a dyn TaskExecutor) -> Result<Self> {
        config.validate()?;
        let ExportConfig { settings, layers } = config;
        Ok(Self::with_plan(settings, Plan::Export { layers }, executor))
    }

    /// Watermark every raster image under the input directory, loading the
    /// configured metadata file first.
    pub fn watermark(config: WatermarkConfig, executor: &'a dyn TaskExecutor) -> Result<Self> {
        config.validate()?;
        let source = WatermarkSource::load(config.meta_file.as_deref(), &config.schema, config.fallback_text.clone())?;
        Ok(Self::watermark_with_source(config, source, executor))
    }

    /// Watermark with an already-built text source.
    pub fn watermark_with_source(
        config: WatermarkConfig,
        source: WatermarkSource,
        executor: &'a dyn TaskExecutor,
    ) -> Self {
        let plan = Plan::Watermark {
            source,
            opacity: config.opacity,
        };
        Self::with_plan(config.settings, plan, executor)
    }

    fn with_plan(settings: JobSettings, plan: Plan, executor: &'a dyn TaskExecutor) -> Self {
        Self {
            run_id: RunId::new(),
            settings,
            plan,
            executor,
            cancel: CancelToken::new(),
            phase: JobPhase::Created,
        }
    }

    /// Share a cancellation flag, e.g. with a Ctrl-C handler.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    fn advance(&mut self, phase: JobPhase, sink: &dyn ProgressSink) {
        debug_assert!(phase > self.phase, "job phases only move forward");
        debug!(from = %self.phase, to = %phase, "Job phase");
        self.phase = phase;
        sink.on_phase(phase);
    }

    fn log_settings(&self) {
        let s = &self.settings;
        info!(
            kind = self.plan.label(),
            input = %s.input_dir.display(),
            output = %s.output_root().display(),
            format = %s.output_format,
            recursive = s.recursive,
            max_resolution = ?s.max_resolution,
            limit = ?s.limit,
            workers = s.worker_count().get(),
            overwrite = s.overwrite == OverwritePolicy::Overwrite,
            "Batch settings"
        );
        if let Plan::Watermark { source, opacity } = &self.plan {
            info!(
                metadata_records = source.index().map(|i| i.len()),
                opacity = opacity.get(),
                "Watermark settings"
            );
        }
    }

    /// Run the job to completion.
    ///
    /// Returns the summary even when files failed; only setup problems are
    /// errors.
    pub fn run(mut self, sink: &dyn ProgressSink) -> Result<RunSummary> {
        let span = info_span!("batch", run = %self.run_id, kind = self.plan.label());
        let _guard = span.enter();
        self.log_settings();

        let layout = OutputLayout::from_settings(&self.settings);
        let mut builder = SummaryBuilder::new(self.run_id, layout.root());
        if matches!(self.plan, Plan::Watermark { .. }) {
            builder = builder.tracking_watermarks();
        }

        self.advance(JobPhase::Resolving, sink);
        let files = PathResolver::new(&self.settings.input_dir, self.plan.input_kind())
            .recursive(self.settings.recursive)
            .limit(self.settings.limit)
            .resolve()?;

        if files.is_empty() {
            info!(input = %self.settings.input_dir.display(), "No matching input files");
            self.advance(JobPhase::Done, sink);
            let summary = builder.finish(false);
            sink.on_finish(&summary);
            return Ok(summary);
        }

        self.advance(JobPhase::Dispatching, sink);
        sink.on_start(files.len());

        // Output path -> the source that first claimed it, in resolved order.
        let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::with_capacity(files.len());
        let mut pending = Vec::with_capacity(files.len());
        for (position, source) in files.into_iter().enumerate() {
            let task = FileTask {
                id: TaskId(position),
                output: layout.spec_for(&source),
                action: self.plan.action_for(&source),
                source,
            };
            let skip = match claimed.entry(task.output.path.clone()) {
                Entry::Occupied(first) => {
                    warn!(
                        source = %task.source.path.display(),
                        claimed_by = %first.get().display(),
                        output = %task.output.path.display(),
                        "Output path already claimed; skipping"
                    );
                    Some(SkipReason::OutputClaimed {
                        by: first.get().clone(),
                    })
                }
                Entry::Vacant(slot) => {
                    slot.insert(task.source.path.clone());
                    if task.output.overwrite == OverwritePolicy::SkipExisting && task.output.path.exists() {
                        debug!(output = %task.output.path.display(), "Output exists; skipping");
                        Some(SkipReason::OutputExists)
                    } else {
                        None
                    }
                }
            };
            match skip {
                Some(reason) => {
                    let outcome = Outcome::new(&task, OutcomeStatus::Skipped(reason));
                    sink.on_outcome(&outcome);
                    builder.record(&outcome);
                }
                None => pending.push(task),
            }
        }

        self.advance(JobPhase::Collecting, sink);
        let pool = WorkerPool::new(self.settings.worker_count()).with_cancel(self.cancel.clone());
        pool.run_with(pending, self.executor, |outcome| {
            if let OutcomeStatus::Succeeded(done) = &outcome.status {
                debug!(task = %outcome.task, output = %done.output.display(), "Task done");
            }
            sink.on_outcome(&outcome);
            builder.record(&outcome);
        });

        let interrupted = self.cancel.is_cancelled();
        if interrupted {
            warn!("Run interrupted; remaining files were skipped");
        }
        self.advance(JobPhase::Done, sink);
        let summary = builder.finish(interrupted);
        info!(
            total = summary.total(),
            succeeded = summary.succeeded(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            elapsed_ms = summary.duration().as_millis() as u64,
            "Batch finished"
        );

        if self.settings.review_copies {
            review::copy_for_review(&summary);
        }
        sink.on_finish(&summary);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use milkit_core::error::MilkitError;
    use milkit_core::traits::NoProgress;
    use milkit_core::types::Completion;
    use std::cell::RefCell;

    #[derive(Default)]
    struct PhaseLog(RefCell<Vec<JobPhase>>);

    impl ProgressSink for PhaseLog {
        fn on_phase(&self, phase: JobPhase) {
            self.0.borrow_mut().push(phase);
        }
    }

    fn noop(task: &FileTask) -> Result<Completion> {
        Ok(Completion {
            output: task.output.path.clone(),
            width: 1,
            height: 1,
            watermark: None,
        })
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let mut settings = JobSettings::new("/tmp");
        settings.max_resolution = Some(0);
        assert!(BatchJob::export(ExportConfig::new(settings), &noop).is_err());
    }

    #[test]
    fn missing_metadata_file_is_fatal() {
        let mut config = WatermarkConfig::new(JobSettings::new("/tmp"));
        config.meta_file = Some("/no/such/meta.csv".into());
        let err = BatchJob::watermark(config, &noop).err().unwrap();
        assert!(matches!(err, MilkitError::MetadataLoad { .. }));
    }

    #[test]
    fn empty_input_walks_straight_to_done() {
        let dir = tempfile::tempdir().unwrap();
        let log = PhaseLog::default();
        let job = BatchJob::export(ExportConfig::new(JobSettings::new(dir.path())), &noop).unwrap();
        assert_eq!(job.phase(), JobPhase::Created);

        let summary = job.run(&log).unwrap();
        assert_eq!(summary.total(), 0);
        assert_eq!(*log.0.borrow(), vec![JobPhase::Resolving, JobPhase::Done]);
    }

    #[test]
    fn phases_progress_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.psd"), b"x").unwrap();
        let log = PhaseLog::default();
        let summary = BatchJob::export(ExportConfig::new(JobSettings::new(dir.path())), &noop)
            .unwrap()
            .run(&log)
            .unwrap();
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(
            *log.0.borrow(),
            vec![
                JobPhase::Resolving,
                JobPhase::Dispatching,
                JobPhase::Collecting,
                JobPhase::Done
            ]
        );
    }

    #[test]
    fn duration_includes_resolution() {
        #[derive(Default)]
        struct ResolveClock(RefCell<Option<DateTime<Utc>>>);

        impl ProgressSink for ResolveClock {
            fn on_phase(&self, phase: JobPhase) {
                if phase == JobPhase::Resolving {
                    *self.0.borrow_mut() = Some(Utc::now());
                }
            }
        }

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.psd"), b"x").unwrap();
        let clock = ResolveClock::default();
        let summary = BatchJob::export(ExportConfig::new(JobSettings::new(dir.path())), &noop)
            .unwrap()
            .run(&clock)
            .unwrap();
        let resolving_at = clock.0.borrow().unwrap();
        assert!(summary.started_at() <= resolving_at);
    }

    #[test]
    fn missing_input_directory_is_a_setup_error() {
        let job = BatchJob::export(ExportConfig::new(JobSettings::new("/no/such/input")), &noop).unwrap();
        let err = job.run(&NoProgress).unwrap_err();
        assert!(err.is_fatal());
    }
}
