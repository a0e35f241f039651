// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Font discovery for watermark rendering.

use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use milkit_core::error::{MilkitError, Result};
use tracing::{debug, info};

/// Bold sans-serif fonts tried in order when no font is given explicitly.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:/Windows/Fonts/arialbd.ttf",
];

/// A parsed font plus where it came from.
pub struct LoadedFont {
    pub font: FontVec,
    pub path: PathBuf,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont").field("path", &self.path).finish()
    }
}

/// Load `explicit` if given, otherwise the first system candidate that exists.
pub fn load_font(explicit: Option<&Path>) -> Result<LoadedFont> {
    if let Some(path) = explicit {
        return read_font(path);
    }

    for candidate in SYSTEM_FONT_CANDIDATES.iter().map(Path::new) {
        if candidate.is_file() {
            match read_font(candidate) {
                Ok(font) => return Ok(font),
                Err(err) => debug!(path = %candidate.display(), error = %err, "skipping font candidate"),
            }
        }
    }

    Err(MilkitError::Font(format!(
        "none of the standard system fonts were found ({} locations searched)",
        SYSTEM_FONT_CANDIDATES.len()
    )))
}

fn read_font(path: &Path) -> Result<LoadedFont> {
    let bytes = std::fs::read(path)
        .map_err(|err| MilkitError::Font(format!("cannot read {}: {err}", path.display())))?;
    let font = FontVec::try_from_vec(bytes)
        .map_err(|err| MilkitError::Font(format!("{} is not a usable font: {err}", path.display())))?;
    info!(path = %path.display(), "Watermark font loaded");
    Ok(LoadedFont {
        font,
        path: path.to_path_buf(),
    })
}
