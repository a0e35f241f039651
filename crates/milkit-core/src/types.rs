// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for milkit batch runs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MilkitError, Result};

/// Unique identifier for one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of input a source file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Layered Photoshop document, flattened before export.
    LayeredDocument,
    /// Plain raster image.
    Raster,
}

impl SourceKind {
    /// Extensions recognised as layered documents.
    pub const LAYERED_EXTENSIONS: &'static [&'static str] = &["psd"];
    /// Extensions recognised as raster images.
    pub const RASTER_EXTENSIONS: &'static [&'static str] =
        &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

    /// Infer the source kind from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let lower = ext.to_ascii_lowercase();
        if Self::LAYERED_EXTENSIONS.contains(&lower.as_str()) {
            Some(Self::LayeredDocument)
        } else if Self::RASTER_EXTENSIONS.contains(&lower.as_str()) {
            Some(Self::Raster)
        } else {
            None
        }
    }
}

/// Supported output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Tiff,
    Bmp,
    WebP,
}

impl OutputFormat {
    /// File extension written for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
            Self::WebP => "webp",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = MilkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "tif" | "tiff" => Ok(Self::Tiff),
            "bmp" => Ok(Self::Bmp),
            "webp" => Ok(Self::WebP),
            other => Err(MilkitError::Config(format!(
                "unsupported output format `{other}` (expected png, jpg, jpeg, tif, tiff, bmp or webp)"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// What to do when the derived output path already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverwritePolicy {
    Overwrite,
    SkipExisting,
}

impl OverwritePolicy {
    pub fn from_no_overwrite(no_overwrite: bool) -> Self {
        if no_overwrite {
            Self::SkipExisting
        } else {
            Self::Overwrite
        }
    }
}

/// Watermark opacity in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Opacity(f32);

impl TryFrom<f32> for Opacity {
    type Error = MilkitError;

    fn try_from(value: f32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Opacity> for f32 {
    fn from(opacity: Opacity) -> Self {
        opacity.0
    }
}

impl Opacity {
    pub fn new(value: f32) -> Result<Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(MilkitError::Config(format!(
                "opacity must be between 0.0 and 1.0, got {value}"
            )))
        }
    }

    pub fn get(&self) -> f32 {
        self.0
    }

    /// Scale an 8-bit alpha ceiling by this opacity.
    pub fn scale(&self, max: u8) -> u8 {
        (f32::from(max) * self.0) as u8
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self(0.8)
    }
}

/// A file discovered under the input root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFile {
    /// Full path as found during traversal.
    pub path: PathBuf,
    /// Path relative to the input root, used to mirror structure.
    pub relative: PathBuf,
    /// File stem, used as the metadata join key.
    pub stem: String,
    pub kind: SourceKind,
}

impl SourceFile {
    /// Build a source entry from a path under `root`.
    ///
    /// Returns `None` when `path` is not under `root` or its extension is
    /// not a recognised input.
    pub fn under_root(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?.to_path_buf();
        let kind = SourceKind::from_extension(path.extension()?.to_str()?)?;
        let stem = path.file_stem()?.to_string_lossy().into_owned();
        Some(Self {
            path: path.to_path_buf(),
            relative,
            stem,
            kind,
        })
    }
}

/// Where and how a task writes its result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub path: PathBuf,
    pub format: OutputFormat,
    /// Longest side bound; images are only ever shrunk to meet it.
    pub max_resolution: Option<u32>,
    pub overwrite: OverwritePolicy,
}

/// Which PSD layers are hidden before flattening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRule {
    pub hide_text_layers: bool,
    /// Case-insensitive name fragments that mark a layer as text.
    pub text_markers: Vec<String>,
}

impl LayerRule {
    pub const DEFAULT_MARKERS: &'static [&'static str] =
        &["text", "caption", "title", "label", "credit", "copyright"];

    /// Keep every visible layer; drop only hidden ones.
    pub fn visible_only() -> Self {
        Self {
            hide_text_layers: false,
            text_markers: Vec::new(),
        }
    }

    /// Whether a layer with this name is treated as text.
    pub fn is_text_layer(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.text_markers
            .iter()
            .any(|marker| !marker.is_empty() && lower.contains(&marker.to_lowercase()))
    }

    /// Whether a layer should be dropped from the flattened output.
    pub fn hides(&self, name: &str, visible: bool) -> bool {
        !visible || (self.hide_text_layers && self.is_text_layer(name))
    }
}

impl Default for LayerRule {
    fn default() -> Self {
        Self {
            hide_text_layers: true,
            text_markers: Self::DEFAULT_MARKERS.iter().map(|m| (*m).to_owned()).collect(),
        }
    }
}

/// Position of a task in resolved order; ties outcomes back to tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The per-file work a task performs.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskAction {
    /// Flatten a layered document and re-encode it.
    Export { layers: LayerRule },
    /// Stamp `text` onto a raster image; `None` re-encodes it unmodified.
    Watermark { text: Option<String>, opacity: Opacity },
}

/// One unit of work with its fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTask {
    pub id: TaskId,
    pub source: SourceFile,
    pub output: OutputSpec,
    pub action: TaskAction,
}

/// What a successful task produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Text stamped onto the image, if any.
    pub watermark: Option<String>,
}

/// Why a task was not executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Output exists and the run does not overwrite.
    OutputExists,
    /// An earlier source in the same run already writes this output path.
    OutputClaimed { by: PathBuf },
    /// The run was interrupted before this task was dispatched.
    Cancelled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutputExists => f.write_str("exists"),
            Self::OutputClaimed { by } => write!(f, "output collides with {}", by.display()),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Terminal state of one task.
#[derive(Debug)]
pub enum OutcomeStatus {
    Succeeded(Completion),
    Skipped(SkipReason),
    Failed(MilkitError),
}

/// The single result emitted for each task.
#[derive(Debug)]
pub struct Outcome {
    pub task: TaskId,
    pub source: PathBuf,
    pub status: OutcomeStatus,
}

impl Outcome {
    pub fn new(task: &FileTask, status: OutcomeStatus) -> Self {
        Self {
            task: task.id,
            source: task.source.path.clone(),
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded(_))
    }
}

/// Lifecycle of a batch job. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobPhase {
    Created,
    Resolving,
    Dispatching,
    Collecting,
    Done,
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::Resolving => "resolving",
            Self::Dispatching => "dispatching",
            Self::Collecting => "collecting",
            Self::Done => "done",
        };
        f.write_str(label)
    }
}
