// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Review copies — after a run, copy the sources that need a human look into
// folders under the output root.

use std::fs;
use std::path::{Path, PathBuf};

use milkit_core::error::Result;
use milkit_core::summary::RunSummary;
use tracing::{info, warn};

pub const FAILED_DIR: &str = "failed_files";
pub const UNMATCHED_DIR: &str = "no_metadata";

/// How many sources were copied into each review folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewCounts {
    pub failed: usize,
    pub unmatched: usize,
}

/// Copy failed sources into `<root>/failed_files/` and sources written
/// without a watermark into `<root>/no_metadata/`.
///
/// A copy that fails is logged and skipped; the run is already finished.
pub fn copy_for_review(summary: &RunSummary) -> ReviewCounts {
    let root = summary.output_root();
    let failed = copy_all(
        summary.failures().iter().map(|f| f.source.as_path()),
        &root.join(FAILED_DIR),
    );
    let unmatched = copy_all(
        summary.unwatermarked().iter().map(PathBuf::as_path),
        &root.join(UNMATCHED_DIR),
    );
    let counts = ReviewCounts { failed, unmatched };
    if counts != ReviewCounts::default() {
        info!(
            failed = counts.failed,
            unmatched = counts.unmatched,
            root = %root.display(),
            "Copied sources for review"
        );
    }
    counts
}

fn copy_all<'a>(sources: impl Iterator<Item = &'a Path>, dest_dir: &Path) -> usize {
    let mut copied = 0;
    for source in sources {
        match copy_into(source, dest_dir) {
            Ok(_) => copied += 1,
            Err(err) => warn!(
                source = %source.display(),
                dest = %dest_dir.display(),
                error = %err,
                "Failed to copy source for review"
            ),
        }
    }
    copied
}

fn copy_into(source: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = source.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "source has no file name")
    })?;
    fs::create_dir_all(dest_dir)?;
    let dest = dest_dir.join(name);
    fs::copy(source, &dest)?;
    Ok(dest)
}
