// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resolved run configuration. The CLI builds these; the batch engine only
// ever sees validated values.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MilkitError, Result};
use crate::types::{LayerRule, Opacity, OutputFormat, OverwritePolicy};

/// Settings shared by every batch job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSettings {
    /// Directory scanned for inputs.
    pub input_dir: PathBuf,
    /// Output root. Defaults to the input directory.
    pub output_dir: Option<PathBuf>,
    pub output_format: OutputFormat,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Longest-side bound for outputs; never upscales.
    pub max_resolution: Option<u32>,
    /// Process at most this many files (in resolved order).
    pub limit: Option<usize>,
    /// Worker threads. `None` uses the host's available parallelism.
    pub max_workers: Option<NonZeroUsize>,
    pub overwrite: OverwritePolicy,
    /// Copy failed / unwatermarked sources into review folders after the run.
    pub review_copies: bool,
}

impl JobSettings {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: None,
            output_format: OutputFormat::Png,
            recursive: false,
            max_resolution: None,
            limit: None,
            max_workers: None,
            overwrite: OverwritePolicy::Overwrite,
            review_copies: false,
        }
    }

    /// The effective output root.
    pub fn output_root(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.input_dir)
    }

    /// Worker count, falling back to the host's available parallelism.
    pub fn worker_count(&self) -> NonZeroUsize {
        self.max_workers.unwrap_or_else(|| {
            std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_resolution == Some(0) {
            return Err(MilkitError::Config(
                "max resolution must be greater than zero".into(),
            ));
        }
        if self.input_dir.as_os_str().is_empty() {
            return Err(MilkitError::Config("input directory must be set".into()));
        }
        Ok(())
    }
}

/// Configuration for `export`: flatten layered documents to raster images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    pub settings: JobSettings,
    pub layers: LayerRule,
}

impl ExportConfig {
    pub fn new(settings: JobSettings) -> Self {
        Self {
            settings,
            layers: LayerRule::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.settings.validate()
    }
}

/// Column contract for a metadata table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSchema {
    /// Column whose values are matched against file stems.
    pub key_column: String,
    /// Column supplying the watermark credit.
    pub value_column: String,
    /// Appended as `"{value} / {suffix}"` when set.
    pub suffix: Option<String>,
}

impl MetadataSchema {
    /// Render the watermark text for one row's value.
    pub fn format_text(&self, value: &str) -> String {
        match self.suffix.as_deref().map(str::trim) {
            Some(suffix) if !suffix.is_empty() => format!("{value} / {suffix}"),
            _ => value.to_owned(),
        }
    }
}

impl Default for MetadataSchema {
    fn default() -> Self {
        Self {
            key_column: "MIL #".into(),
            value_column: "Photographer".into(),
            suffix: Some("ASM-MIL".into()),
        }
    }
}

/// Configuration for `watermark`: stamp credit text onto raster images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkConfig {
    pub settings: JobSettings,
    /// Tabular metadata file keyed by file stem.
    pub meta_file: Option<PathBuf>,
    pub schema: MetadataSchema,
    /// Static text used when no metadata row matches.
    pub fallback_text: Option<String>,
    pub opacity: Opacity,
    /// Explicit TrueType/OpenType font; system fonts are searched otherwise.
    pub font: Option<PathBuf>,
}

impl WatermarkConfig {
    pub fn new(settings: JobSettings) -> Self {
        Self {
            settings,
            meta_file: None,
            schema: MetadataSchema::default(),
            fallback_text: None,
            opacity: Opacity::default(),
            font: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;
        let has_text = self
            .fallback_text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if self.meta_file.is_none() && !has_text {
            return Err(MilkitError::Config(
                "watermark requires a metadata file, fallback text, or both".into(),
            ));
        }
        if self.schema.key_column.trim().is_empty() || self.schema.value_column.trim().is_empty() {
            return Err(MilkitError::Config("metadata column names must not be empty".into()));
        }
        Ok(())
    }
}
