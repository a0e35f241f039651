// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// milkit — batch PSD export and metadata-driven watermarking.
//
// Entry point. Parses arguments, installs logging and the Ctrl-C handler,
// runs one batch job and prints its summary.
//
// Exit codes: 0 when every file succeeded or was skipped, 2 when the run
// finished with failed files, 1 when the run could not start.

mod cli;
mod logging;
mod progress;
mod report;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use milkit_batch::{BatchJob, CancelToken};
use milkit_core::error::MilkitError;
use milkit_core::summary::RunSummary;
use milkit_image::{ExportExecutor, WatermarkExecutor, Watermarker, load_font};
use tracing::{error, info, warn};

use cli::{Cli, Command};
use progress::BarProgress;

const EXIT_WITH_FAILURES: u8 = 2;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli) {
        Ok(summary) if summary.has_failures() => ExitCode::from(EXIT_WITH_FAILURES),
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            match err.downcast_ref::<MilkitError>() {
                Some(milkit) => report::print_setup_error(milkit),
                None => eprintln!("Error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<RunSummary> {
    let common = cli.command.common().clone();
    logging::init(common.quiet, common.log_file.as_deref())?;
    info!(version = env!("CARGO_PKG_VERSION"), "milkit starting");

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        warn!("Interrupt received; finishing files in progress");
        handler_token.cancel();
    })
    .context("Failed to set signal handler")?;

    let progress = BarProgress::new(common.quiet);
    let summary = match cli.command {
        Command::Export(args) => {
            let config = args.into_config()?;
            BatchJob::export(config, &ExportExecutor)?
                .with_cancel(cancel)
                .run(&progress)?
        }
        Command::Watermark(args) => {
            let config = args.into_config()?;
            let font = load_font(config.font.as_deref())?;
            info!(font = %font.path.display(), "Using font");
            let executor = WatermarkExecutor::new(Watermarker::new(font));
            BatchJob::watermark(config, &executor)?
                .with_cancel(cancel)
                .run(&progress)?
        }
    };

    report::print_summary(&summary)?;
    if let Some(path) = &common.report {
        report::write_report(path, &summary)?;
        info!(path = %path.display(), "Report written");
    }
    Ok(summary)
}
