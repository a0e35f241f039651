// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, shrink-to-fit, and encode to the run's output
// format. Operates on in-memory images using the `image` crate.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use milkit_core::error::{MilkitError, Result};
use milkit_core::types::OutputFormat;
use tracing::{debug, instrument};
use uuid::Uuid;

/// JPEG quality used for every JPEG output.
const JPEG_QUALITY: u8 = 92;

/// Image processing pipeline operating on a single in-memory image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, so a
/// per-file pipeline reads top to bottom:
///
/// ```ignore
/// ImageProcessor::open("2314.jpg")?
///     .fit_within(Some(1920))
///     .save_as("out/2314.png", OutputFormat::Png)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            MilkitError::Decode(format!("failed to open {}: {}", path.as_ref().display(), err))
        })?;
        debug!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| MilkitError::Decode(format!("failed to decode image: {}", err)))?;
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Shrink the image so neither side exceeds `max_side`, preserving aspect
    /// ratio. Images already within the bound are returned untouched; this
    /// never upscales. Uses Lanczos3 filtering.
    pub fn fit_within(self, max_side: Option<u32>) -> Self {
        let Some(max_side) = max_side else {
            return self;
        };
        let (w, h) = (self.image.width(), self.image.height());
        if w <= max_side && h <= max_side {
            return self;
        }
        let resized = self.image.resize(max_side, max_side, FilterType::Lanczos3);
        debug!(
            from_w = w,
            from_h = h,
            new_w = resized.width(),
            new_h = resized.height(),
            "Downscaled to fit"
        );
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image in `format`, returning the raw bytes.
    pub fn encode(&self, format: OutputFormat) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        write_encoded(&self.image, format, &mut std::io::Cursor::new(&mut buffer))?;
        Ok(buffer)
    }

    /// Write the image to `path` in `format`.
    ///
    /// Parent directories are created as needed (concurrent creation of the
    /// same directory is fine). The bytes go to a sibling `.part` file, unique
    /// to this call, that is renamed into place once complete, so `path` only
    /// ever exists as a finished image.
    #[instrument(skip_all, fields(path = %path.as_ref().display(), format = %format))]
    pub fn save_as(&self, path: impl AsRef<Path>, format: OutputFormat) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let partial = partial_path(path);
        let written = File::create(&partial).map_err(MilkitError::from).and_then(|file| {
            let mut writer = BufWriter::new(file);
            write_encoded(&self.image, format, &mut writer)?;
            writer.flush()?;
            Ok(())
        });
        if let Err(err) = written {
            let _ = fs::remove_file(&partial);
            return Err(err);
        }

        fs::rename(&partial, path)?;
        debug!("Image written");
        Ok(())
    }
}

/// Temporary sibling used while an output is being written. Each writer gets
/// its own name, so concurrent saves to one path never share a file.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.part", Uuid::new_v4().simple()));
    path.with_file_name(name)
}

/// Encode `image` into `writer`, converting the pixel layout where the target
/// codec requires it (JPEG has no alpha; WebP only takes 8-bit RGB(A)).
fn write_encoded<W: Write + std::io::Seek>(
    image: &DynamicImage,
    format: OutputFormat,
    writer: &mut W,
) -> Result<()> {
    let result = match format {
        OutputFormat::Jpeg => {
            let rgb = image.to_rgb8();
            let encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
            rgb.write_with_encoder(encoder)
        }
        OutputFormat::Png => image.write_to(writer, ImageFormat::Png),
        OutputFormat::Tiff => DynamicImage::ImageRgba8(image.to_rgba8()).write_to(writer, ImageFormat::Tiff),
        OutputFormat::Bmp => DynamicImage::ImageRgba8(image.to_rgba8()).write_to(writer, ImageFormat::Bmp),
        OutputFormat::WebP => DynamicImage::ImageRgba8(image.to_rgba8()).write_to(writer, ImageFormat::WebP),
    };
    result.map_err(|err| MilkitError::Encode(format!("{format} encoding failed: {err}")))
}
