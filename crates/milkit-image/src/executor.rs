// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-file executors handed to the worker pool: one for PSD export, one for
// watermarking. Each runs decode → transform → shrink → encode → write.

use image::DynamicImage;
use milkit_core::error::{MilkitError, Result};
use milkit_core::traits::TaskExecutor;
use milkit_core::types::{Completion, FileTask, LayerRule, SourceKind, TaskAction};
use tracing::{debug, instrument};

use crate::image::processor::ImageProcessor;
use crate::image::watermark::Watermarker;
use crate::layered::psd::LayeredDocument;

/// Decode a task's source according to its kind, flattening layered
/// documents with `layers`.
fn decode(task: &FileTask, layers: &LayerRule) -> Result<DynamicImage> {
    match task.source.kind {
        SourceKind::LayeredDocument => LayeredDocument::open(&task.source.path)?.flatten(layers),
        SourceKind::Raster => Ok(ImageProcessor::open(&task.source.path)?.into_dynamic()),
    }
}

/// Shrink, encode and write; report what landed on disk.
fn finish(task: &FileTask, image: DynamicImage, watermark: Option<String>) -> Result<Completion> {
    let processor = ImageProcessor::from_dynamic(image).fit_within(task.output.max_resolution);
    processor.save_as(&task.output.path, task.output.format)?;
    Ok(Completion {
        output: task.output.path.clone(),
        width: processor.width(),
        height: processor.height(),
        watermark,
    })
}

/// Flattens layered documents (hiding text layers) and exports them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExportExecutor;

impl TaskExecutor for ExportExecutor {
    #[instrument(skip_all, fields(task = %task.id, source = %task.source.relative.display()))]
    fn execute(&self, task: &FileTask) -> Result<Completion> {
        let TaskAction::Export { layers } = &task.action else {
            return Err(MilkitError::Config(format!(
                "export executor given a non-export task for {}",
                task.source.path.display()
            )));
        };
        let image = decode(task, layers)?;
        debug!(width = image.width(), height = image.height(), "Source decoded");
        finish(task, image, None)
    }
}

/// Stamps resolved credit text onto raster images.
pub struct WatermarkExecutor {
    watermarker: Watermarker,
}

impl WatermarkExecutor {
    pub fn new(watermarker: Watermarker) -> Self {
        Self { watermarker }
    }
}

impl TaskExecutor for WatermarkExecutor {
    #[instrument(skip_all, fields(task = %task.id, source = %task.source.relative.display()))]
    fn execute(&self, task: &FileTask) -> Result<Completion> {
        let TaskAction::Watermark { text, opacity } = &task.action else {
            return Err(MilkitError::Config(format!(
                "watermark executor given a non-watermark task for {}",
                task.source.path.display()
            )));
        };
        let image = decode(task, &LayerRule::visible_only())?;
        let image = match text.as_deref() {
            Some(text) => self.watermarker.apply(&image, text, *opacity),
            None => {
                debug!("No watermark text resolved; exporting unmodified");
                image
            }
        };
        finish(task, image, text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use milkit_core::types::{Opacity, OutputFormat, OutputSpec, OverwritePolicy, SourceFile, TaskId};
    use std::path::Path;

    fn raster_task(dir: &Path, action: TaskAction, max: Option<u32>) -> FileTask {
        let src = dir.join("in/2314.png");
        std::fs::create_dir_all(src.parent().unwrap()).unwrap();
        RgbaImage::from_pixel(200, 100, Rgba([10, 200, 30, 255]))
            .save(&src)
            .unwrap();
        FileTask {
            id: TaskId(0),
            source: SourceFile::under_root(&dir.join("in"), &src).unwrap(),
            output: OutputSpec {
                path: dir.join("out/nested/2314.jpg"),
                format: OutputFormat::Jpeg,
                max_resolution: max,
                overwrite: OverwritePolicy::Overwrite,
            },
            action,
        }
    }

    #[test]
    fn export_rejects_watermark_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let task = raster_task(
            dir.path(),
            TaskAction::Watermark {
                text: None,
                opacity: Opacity::default(),
            },
            None,
        );
        assert!(ExportExecutor.execute(&task).is_err());
    }

    #[test]
    fn export_of_raster_writes_shrunk_output() {
        let dir = tempfile::tempdir().unwrap();
        let task = raster_task(
            dir.path(),
            TaskAction::Export {
                layers: LayerRule::default(),
            },
            Some(50),
        );
        let done = ExportExecutor.execute(&task).unwrap();
        assert_eq!((done.width, done.height), (50, 25));
        assert!(done.output.exists());
        assert_eq!(done.watermark, None);
    }

    #[test]
    fn export_of_layered_document_hides_text() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in/2314.psd");
        std::fs::create_dir_all(src.parent().unwrap()).unwrap();
        std::fs::write(&src, include_bytes!("../tests/fixtures/layered.psd")).unwrap();
        let task = FileTask {
            id: TaskId(0),
            source: SourceFile::under_root(&dir.path().join("in"), &src).unwrap(),
            output: OutputSpec {
                path: dir.path().join("out/2314.png"),
                format: OutputFormat::Png,
                max_resolution: None,
                overwrite: OverwritePolicy::Overwrite,
            },
            action: TaskAction::Export {
                layers: LayerRule::default(),
            },
        };

        let done = ExportExecutor.execute(&task).unwrap();
        assert_eq!((done.width, done.height), (4, 4));
        let written = image::open(&done.output).unwrap().to_rgba8();
        assert_eq!(*written.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn unreadable_source_fails_the_task() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = raster_task(
            dir.path(),
            TaskAction::Export {
                layers: LayerRule::default(),
            },
            None,
        );
        std::fs::write(&task.source.path, b"corrupt").unwrap();
        task.output.path = dir.path().join("out/x.png");
        let err = ExportExecutor.execute(&task).unwrap_err();
        assert!(matches!(err, MilkitError::Decode(_)));
        assert!(!task.output.path.exists());
    }

    #[test]
    fn watermark_without_text_copies_unmodified() {
        let Ok(font) = crate::image::font::load_font(None) else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let task = raster_task(
            dir.path(),
            TaskAction::Watermark {
                text: None,
                opacity: Opacity::default(),
            },
            None,
        );
        let exec = WatermarkExecutor::new(Watermarker::new(font));
        let done = exec.execute(&task).unwrap();
        assert_eq!(done.watermark, None);
        assert_eq!((done.width, done.height), (200, 100));
    }
}
