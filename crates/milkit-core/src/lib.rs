// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// milkit — Core types, configuration, and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod summary;
pub mod traits;
pub mod types;

pub use config::{ExportConfig, JobSettings, MetadataSchema, WatermarkConfig};
pub use error::{MilkitError, Result};
pub use summary::{RunSummary, SummaryBuilder};
pub use traits::{NoProgress, ProgressSink, TaskExecutor};
pub use types::*;
