// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded worker pool for a finite batch of file tasks.
//
// Tasks are queued up front on an unbounded channel and pulled by scoped
// worker threads. Each worker sends exactly one `Outcome` per task it takes
// off the queue, including tasks it declines after cancellation, so the
// caller always receives one outcome per task. The calling thread drains the
// outcome channel and is the only place outcomes are observed.

use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::unbounded;
use milkit_core::error::MilkitError;
use milkit_core::traits::{ProgressSink, TaskExecutor};
use milkit_core::types::{FileTask, Outcome, OutcomeStatus, SkipReason};
use tracing::{debug, error, warn};

/// Shared stop flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop dispatching. Tasks already executing run to completion.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs file tasks on a fixed number of threads.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: NonZeroUsize,
    cancel: CancelToken,
}

impl WorkerPool {
    pub fn new(workers: NonZeroUsize) -> Self {
        Self {
            workers,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Execute every task and collect the outcomes in arrival order,
    /// reporting each one to `sink` as it lands.
    pub fn run<E>(&self, tasks: Vec<FileTask>, executor: &E, sink: &dyn ProgressSink) -> Vec<Outcome>
    where
        E: TaskExecutor + ?Sized,
    {
        let mut outcomes = Vec::with_capacity(tasks.len());
        self.run_with(tasks, executor, |outcome| {
            sink.on_outcome(&outcome);
            outcomes.push(outcome);
        });
        outcomes
    }

    /// Execute every task, handing each outcome to `on_outcome` on the
    /// calling thread. Returns the number of outcomes delivered, which always
    /// equals the number of tasks.
    pub fn run_with<E, F>(&self, tasks: Vec<FileTask>, executor: &E, mut on_outcome: F) -> usize
    where
        E: TaskExecutor + ?Sized,
        F: FnMut(Outcome),
    {
        if tasks.is_empty() {
            return 0;
        }
        let workers = self.workers.get().min(tasks.len());
        debug!(tasks = tasks.len(), workers, "Starting worker pool");

        let (task_tx, task_rx) = unbounded::<FileTask>();
        let (outcome_tx, outcome_rx) = unbounded::<Outcome>();
        for task in tasks {
            // The receiver is held below, so the queue cannot be disconnected.
            let _ = task_tx.send(task);
        }
        drop(task_tx);

        let cancel = &self.cancel;
        let mut delivered = 0usize;
        thread::scope(|scope| {
            let mut spawned = 0usize;
            for id in 0..workers {
                let task_rx = task_rx.clone();
                let outcome_tx = outcome_tx.clone();
                let result = thread::Builder::new()
                    .name(format!("milkit-worker-{id}"))
                    .spawn_scoped(scope, move || {
                        for task in task_rx.iter() {
                            let outcome = run_one(&task, executor, cancel);
                            if outcome_tx.send(outcome).is_err() {
                                break;
                            }
                        }
                    });
                match result {
                    Ok(_) => spawned += 1,
                    Err(err) => warn!(worker = id, error = %err, "Failed to spawn worker thread"),
                }
            }
            drop(outcome_tx);

            if spawned == 0 {
                warn!("No worker threads available; running tasks on the calling thread");
                for task in task_rx.try_iter() {
                    on_outcome(run_one(&task, executor, cancel));
                    delivered += 1;
                }
            }

            for outcome in outcome_rx.iter() {
                on_outcome(outcome);
                delivered += 1;
            }
        });
        delivered
    }
}

/// Execute one task, turning errors and panics into a failed outcome.
fn run_one<E>(task: &FileTask, executor: &E, cancel: &CancelToken) -> Outcome
where
    E: TaskExecutor + ?Sized,
{
    if cancel.is_cancelled() {
        return Outcome::new(task, OutcomeStatus::Skipped(SkipReason::Cancelled));
    }

    let status = match panic::catch_unwind(AssertUnwindSafe(|| executor.execute(task))) {
        Ok(Ok(completion)) => OutcomeStatus::Succeeded(completion),
        Ok(Err(err)) => {
            warn!(task = %task.id, source = %task.source.path.display(), error = %err, "Task failed");
            OutcomeStatus::Failed(err)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(task = %task.id, source = %task.source.path.display(), panic = %message, "Task panicked");
            OutcomeStatus::Failed(MilkitError::Panicked(message))
        }
    };
    Outcome::new(task, status)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
