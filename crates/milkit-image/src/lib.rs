// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// milkit-image — Per-file image work for milkit batch runs.
//
// Provides PSD flattening (hiding text layers), raster decode, shrink-to-fit,
// text watermarking, and encoding, plus the two `TaskExecutor`
// implementations the batch engine dispatches to.

pub mod executor;
pub mod image;
pub mod layered;

// Re-export the primary structs so callers can use `milkit_image::ImageProcessor` etc.
pub use executor::{ExportExecutor, WatermarkExecutor};
pub use self::image::font::{LoadedFont, load_font};
pub use self::image::processor::ImageProcessor;
pub use self::image::watermark::{WatermarkStyle, Watermarker};
pub use layered::psd::LayeredDocument;
