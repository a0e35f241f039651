// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Terminal progress bar fed by the batch job's outcome stream.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use milkit_core::summary::RunSummary;
use milkit_core::traits::ProgressSink;
use milkit_core::types::{JobPhase, Outcome, OutcomeStatus};

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}";

/// Progress reporter backed by an `indicatif` bar.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self { bar }
    }
}

impl ProgressSink for BarProgress {
    fn on_phase(&self, phase: JobPhase) {
        self.bar.set_message(phase.to_string());
    }

    fn on_start(&self, total: usize) {
        self.bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn on_outcome(&self, outcome: &Outcome) {
        let name = outcome
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match &outcome.status {
            OutcomeStatus::Succeeded(_) => self.bar.set_message(name),
            OutcomeStatus::Skipped(reason) => self.bar.set_message(format!("{name} (skipped: {reason})")),
            OutcomeStatus::Failed(err) => self.bar.println(format!("  failed: {name}: {err}")),
        }
        self.bar.inc(1);
    }

    fn on_finish(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}
