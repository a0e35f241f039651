// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-of-run output: the summary table on stdout, the optional JSON report,
// and plain-English setup errors.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use milkit_core::error::MilkitError;
use milkit_core::human_errors::humanize_error;
use milkit_core::summary::RunSummary;

const RULE_WIDTH: usize = 50;

/// Render the summary table.
pub fn write_summary(out: &mut impl Write, summary: &RunSummary) -> io::Result<()> {
    let elapsed = summary.duration().as_secs_f64();
    let rate = if elapsed > 0.0 {
        summary.total() as f64 / elapsed
    } else {
        0.0
    };

    writeln!(out)?;
    let title = if summary.interrupted() {
        "Run interrupted"
    } else {
        "Run complete"
    };
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "─".repeat(RULE_WIDTH))?;
    writeln!(out, "  {:<14} {}", "Total:", summary.total())?;
    writeln!(out, "  {:<14} {}", "Succeeded:", summary.succeeded())?;
    writeln!(out, "  {:<14} {}", "Skipped:", summary.skipped())?;
    writeln!(out, "  {:<14} {}", "Failed:", summary.failed())?;
    writeln!(out, "  {:<14} {:.1}s ({:.1} files/sec)", "Duration:", elapsed, rate)?;
    writeln!(out, "  {:<14} {}", "Output:", summary.output_root().display())?;

    if !summary.failures().is_empty() {
        writeln!(out)?;
        writeln!(out, "Failed files:")?;
        for failure in summary.failures() {
            writeln!(out, "  {}: {}", failure.source.display(), failure.reason)?;
        }
    }
    if !summary.unwatermarked().is_empty() {
        writeln!(out)?;
        writeln!(out, "Written without a watermark (no metadata match):")?;
        for path in summary.unwatermarked() {
            writeln!(out, "  {}", path.display())?;
        }
    }
    writeln!(out, "{}", "─".repeat(RULE_WIDTH))?;
    Ok(())
}

pub fn print_summary(summary: &RunSummary) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_summary(&mut out, summary).context("Failed to print summary")
}

/// Write the summary as pretty JSON.
pub fn write_report(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize run summary")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("Failed to write report {}", path.display()))?;
    Ok(())
}

/// Print a setup error the way a user should see it.
pub fn print_setup_error(err: &MilkitError) {
    let human = humanize_error(err);
    eprintln!("Error: {}", human.message);
    eprintln!("  {}", human.suggestion);
}
