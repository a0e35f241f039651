// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// milkit-batch — Batch orchestration: input discovery, output layout,
// metadata join, the worker pool and the job that ties them together.

pub mod job;
pub mod layout;
pub mod metadata;
pub mod pool;
pub mod resolver;
pub mod review;

pub use job::BatchJob;
pub use layout::OutputLayout;
pub use metadata::{MetadataIndex, WatermarkSource};
pub use pool::{CancelToken, WorkerPool};
pub use resolver::PathResolver;
pub use review::{ReviewCounts, copy_for_review};
