// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface. Parsing only; `into_config` turns arguments into
// the validated configuration the batch engine consumes.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use milkit_core::config::{ExportConfig, JobSettings, MetadataSchema, WatermarkConfig};
use milkit_core::error::Result;
use milkit_core::types::{LayerRule, Opacity, OutputFormat, OverwritePolicy};

#[derive(Parser, Debug)]
#[command(
    name = "milkit",
    version,
    about = "Batch-export PSDs and watermark image folders",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Flatten PSD files (hiding text layers) into raster images
    Export(ExportArgs),
    /// Stamp photographer credits onto raster images
    Watermark(WatermarkArgs),
}

impl Command {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Self::Export(args) => &args.common,
            Self::Watermark(args) => &args.common,
        }
    }
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Directory to scan for input files
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub dir: PathBuf,

    /// Output root (defaults to the input directory)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Output format: png, jpg, jpeg, tif, tiff, bmp or webp
    #[arg(short = 'f', long, default_value = "png", value_name = "FORMAT", value_parser = parse_format)]
    pub output_format: OutputFormat,

    /// Descend into subdirectories, mirroring them under the output root
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Shrink outputs so the longest side is at most this many pixels
    #[arg(long, value_name = "PIXELS")]
    pub max_resolution: Option<u32>,

    /// Process at most this many files
    #[arg(long, value_name = "NUM")]
    pub limit: Option<usize>,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long, value_name = "NUM")]
    pub max_workers: Option<NonZeroUsize>,

    /// Skip files whose output already exists
    #[arg(long)]
    pub no_overwrite: bool,

    /// Only print warnings, errors and the final summary
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Also write a debug-level log to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Write the run summary as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Copy failed and unmatched sources into `failed_files/` and `no_metadata/`
    /// under the output root. Off by default: the output root defaults to the
    /// input directory, so the copies would otherwise land among the sources
    #[arg(long)]
    pub review_copies: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Keep text layers visible in the export
    #[arg(long)]
    pub keep_text_layers: bool,

    /// Layer-name fragment marking a text layer (repeatable; replaces the defaults)
    #[arg(long = "text-layer", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub text_layers: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct WatermarkArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// CSV or Excel file mapping file names to photographers
    #[arg(short = 'm', long, value_name = "FILE")]
    pub meta_file: Option<PathBuf>,

    /// Watermark text used when no metadata row matches
    #[arg(short = 't', long, value_name = "TEXT")]
    pub text: Option<String>,

    /// Watermark opacity between 0.0 and 1.0
    #[arg(long, default_value_t = 0.8, value_name = "OPACITY", value_parser = parse_opacity)]
    pub opacity: f32,

    /// Metadata column matched against file names
    #[arg(long, default_value = "MIL #", value_name = "NAME")]
    pub key_column: String,

    /// Metadata column holding the credit
    #[arg(long, default_value = "Photographer", value_name = "NAME")]
    pub value_column: String,

    /// Appended to metadata credits as "<credit> / <suffix>" (empty to disable)
    #[arg(long, default_value = "ASM-MIL", value_name = "TEXT")]
    pub suffix: String,

    /// TrueType/OpenType font used for the watermark
    #[arg(long, value_name = "FILE")]
    pub font: Option<PathBuf>,
}

fn parse_format(s: &str) -> std::result::Result<OutputFormat, String> {
    s.parse().map_err(|e: milkit_core::MilkitError| e.to_string())
}

fn parse_opacity(s: &str) -> std::result::Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    Opacity::new(value).map(|o| o.get()).map_err(|e| e.to_string())
}

impl CommonArgs {
    fn settings(&self) -> JobSettings {
        JobSettings {
            input_dir: self.dir.clone(),
            output_dir: self.output.clone(),
            output_format: self.output_format,
            recursive: self.recursive,
            max_resolution: self.max_resolution,
            limit: self.limit,
            max_workers: self.max_workers,
            overwrite: OverwritePolicy::from_no_overwrite(self.no_overwrite),
            review_copies: self.review_copies,
        }
    }
}

impl ExportArgs {
    pub fn into_config(self) -> Result<ExportConfig> {
        let mut layers = LayerRule {
            hide_text_layers: !self.keep_text_layers,
            ..LayerRule::default()
        };
        if !self.text_layers.is_empty() {
            layers.text_markers = self.text_layers;
        }
        let config = ExportConfig {
            settings: self.common.settings(),
            layers,
        };
        config.validate()?;
        Ok(config)
    }
}

impl WatermarkArgs {
    pub fn into_config(self) -> Result<WatermarkConfig> {
        let suffix = Some(self.suffix.trim().to_owned()).filter(|s| !s.is_empty());
        let config = WatermarkConfig {
            settings: self.common.settings(),
            meta_file: self.meta_file,
            schema: MetadataSchema {
                key_column: self.key_column,
                value_column: self.value_column,
                suffix,
            },
            fallback_text: self.text,
            opacity: Opacity::new(self.opacity)?,
            font: self.font,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn review_copies_help_explains_the_default() {
        let mut cmd = Cli::command();
        let help = cmd
            .find_subcommand_mut("export")
            .unwrap()
            .render_long_help()
            .to_string()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        assert!(help.contains("failed_files/"));
        assert!(help.contains("Off by default: the output root defaults to the input directory"));
        assert!(!parse(&["milkit", "export", "-d", "/psd"]).command.common().review_copies);
    }

    #[test]
    fn export_defaults() {
        let Command::Export(args) = parse(&["milkit", "export", "-d", "/psd"]).command else {
            panic!("expected export");
        };
        let config = args.into_config().unwrap();
        assert_eq!(config.settings.output_format, OutputFormat::Png);
        assert_eq!(config.settings.output_root(), std::path::Path::new("/psd"));
        assert!(config.layers.hide_text_layers);
        assert_eq!(config.settings.overwrite, OverwritePolicy::Overwrite);
    }

    #[test]
    fn export_custom_text_layers() {
        let Command::Export(args) = parse(&[
            "milkit", "export", "-d", "/psd", "-r", "-f", "jpeg", "--no-overwrite", "--text-layer", "Credit",
            "--text-layer", "Stamp",
        ])
        .command
        else {
            panic!("expected export");
        };
        let config = args.into_config().unwrap();
        assert!(config.settings.recursive);
        assert_eq!(config.settings.output_format, OutputFormat::Jpeg);
        assert_eq!(config.settings.overwrite, OverwritePolicy::SkipExisting);
        assert_eq!(config.layers.text_markers, vec!["Credit", "Stamp"]);
    }

    #[test]
    fn watermark_schema_flags() {
        let Command::Watermark(args) = parse(&[
            "milkit", "watermark", "-d", "/img", "-m", "meta.xlsx", "--key-column", "ID", "--suffix", "",
        ])
        .command
        else {
            panic!("expected watermark");
        };
        let config = args.into_config().unwrap();
        assert_eq!(config.schema.key_column, "ID");
        assert_eq!(config.schema.value_column, "Photographer");
        assert_eq!(config.schema.suffix, None);
        assert_eq!(config.opacity, Opacity::default());
    }

    #[test]
    fn out_of_range_opacity_is_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["milkit", "watermark", "-d", "/img", "-t", "x", "--opacity", "1.5"]).is_err());
    }

    #[test]
    fn unknown_format_is_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["milkit", "export", "-d", "/psd", "-f", "gif"]).is_err());
    }

    #[test]
    fn watermark_without_any_text_source_fails_validation() {
        let Command::Watermark(args) = parse(&["milkit", "watermark", "-d", "/img"]).command else {
            panic!("expected watermark");
        };
        assert!(args.into_config().is_err());
    }
}
