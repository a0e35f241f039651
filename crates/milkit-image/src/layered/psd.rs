// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PSD flattening — decode a Photoshop document, drop hidden and text layers,
// and composite what remains into a single RGBA image.

use std::path::Path;

use image::{DynamicImage, RgbaImage};
use milkit_core::error::{MilkitError, Result};
use milkit_core::types::LayerRule;
use psd::Psd;
use tracing::{debug, info, instrument};

/// A decoded layered document.
pub struct LayeredDocument {
    psd: Psd,
}

impl LayeredDocument {
    /// Read and parse a PSD file.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let psd = Psd::from_bytes(&bytes).map_err(|err| {
            MilkitError::Document(format!("failed to parse {}: {}", path.display(), err))
        })?;
        debug!(
            width = psd.width(),
            height = psd.height(),
            layers = psd.layers().len(),
            "PSD decoded"
        );
        Ok(Self { psd })
    }

    /// Parse a PSD from memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let psd = Psd::from_bytes(bytes)
            .map_err(|err| MilkitError::Document(format!("failed to parse PSD: {}", err)))?;
        Ok(Self { psd })
    }

    pub fn width(&self) -> u32 {
        self.psd.width()
    }

    pub fn height(&self) -> u32 {
        self.psd.height()
    }

    /// Names of the layers `rule` would hide.
    pub fn hidden_layers(&self, rule: &LayerRule) -> Vec<String> {
        self.psd
            .layers()
            .iter()
            .filter(|l| rule.hides(l.name(), l.visible()))
            .map(|l| l.name().to_owned())
            .collect()
    }

    /// Composite the layers `rule` keeps into one image.
    ///
    /// A document with no layer records (a flat PSD) yields its merged
    /// composite image instead.
    pub fn flatten(&self, rule: &LayerRule) -> Result<DynamicImage> {
        let (width, height) = (self.width(), self.height());

        let pixels = if self.psd.layers().is_empty() {
            self.psd.rgba()
        } else {
            let hidden = self.hidden_layers(rule);
            if !hidden.is_empty() {
                info!(count = hidden.len(), layers = ?hidden, "Hiding layers before flatten");
            }
            self.psd
                .flatten_layers_rgba(&|(_, layer)| !rule.hides(layer.name(), layer.visible()))
                .map_err(|err| MilkitError::Document(format!("failed to flatten layers: {}", err)))?
        };

        let buffer = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
            MilkitError::Document(format!(
                "flattened pixel buffer does not match {width}x{height}"
            ))
        })?;
        Ok(DynamicImage::ImageRgba8(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    // 4x4, stored bottom to top: opaque red "Background", hidden opaque blue
    // "Hidden blue", and a 1x1 green "Caption text" at the origin.
    const LAYERED: &[u8] = include_bytes!("../../tests/fixtures/layered.psd");
    // 2x2 with no layer records; merged composite is (10, 20, 30).
    const FLAT: &[u8] = include_bytes!("../../tests/fixtures/flat.psd");

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

    fn flatten(bytes: &[u8], rule: &LayerRule) -> RgbaImage {
        LayeredDocument::from_bytes(bytes).unwrap().flatten(rule).unwrap().to_rgba8()
    }

    #[test]
    fn default_rule_drops_text_and_hidden_layers() {
        let doc = LayeredDocument::from_bytes(LAYERED).unwrap();
        assert_eq!((doc.width(), doc.height()), (4, 4));
        assert_eq!(doc.hidden_layers(&LayerRule::default()), vec!["Caption text", "Hidden blue"]);

        let flat = flatten(LAYERED, &LayerRule::default());
        assert_eq!(flat.dimensions(), (4, 4));
        assert!(flat.pixels().all(|p| *p == RED));
    }

    #[test]
    fn text_layers_survive_when_not_hidden() {
        let rule = LayerRule {
            hide_text_layers: false,
            ..LayerRule::default()
        };
        let flat = flatten(LAYERED, &rule);
        assert_eq!(*flat.get_pixel(0, 0), GREEN);
        // The hidden blue layer stays out even though it covers everything.
        assert_eq!(*flat.get_pixel(1, 0), RED);
        assert_eq!(*flat.get_pixel(3, 3), RED);
        assert_eq!(flatten(LAYERED, &LayerRule::visible_only()), flat);
    }

    #[test]
    fn flat_document_uses_merged_composite() {
        let doc = LayeredDocument::from_bytes(FLAT).unwrap();
        assert!(doc.hidden_layers(&LayerRule::default()).is_empty());

        let flat = flatten(FLAT, &LayerRule::default());
        assert_eq!(flat.dimensions(), (2, 2));
        assert!(flat.pixels().all(|p| *p == Rgba([10, 20, 30, 255])));
    }

    #[test]
    fn garbage_is_a_document_error() {
        let err = LayeredDocument::from_bytes(b"8BPS but not really").err().unwrap();
        assert!(matches!(err, MilkitError::Document(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = LayeredDocument::open("/no/such/file.psd").err().unwrap();
        assert!(matches!(err, MilkitError::Io(_)));
    }
}
