// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text watermark renderer — draws a copyright credit in the bottom-left
// corner on a translucent rounded pill, using `imageproc` drawing and an
// `ab_glyph` font.

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use milkit_core::types::Opacity;
use tracing::{debug, instrument};

use crate::image::font::LoadedFont;

const COPYRIGHT_SYMBOL: char = '©';

/// Layout constants for the watermark pill, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkStyle {
    /// Space between text and pill edge.
    pub padding: u32,
    /// Space between pill and canvas edge.
    pub margin: u32,
    /// Extra space between wrapped lines.
    pub line_spacing: u32,
    /// Font size is `width / font_divisor`...
    pub font_divisor: u32,
    /// ...but never smaller than this.
    pub min_font_size: u32,
    pub corner_radius: u32,
    pub background: [u8; 3],
    pub foreground: [u8; 3],
    /// Pill alpha at full opacity.
    pub background_alpha: u8,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            padding: 8,
            margin: 4,
            line_spacing: 4,
            font_divisor: 40,
            min_font_size: 12,
            corner_radius: 6,
            background: [0, 0, 0],
            foreground: [255, 255, 255],
            background_alpha: 180,
        }
    }
}

/// Renders credit text onto images. Shared read-only by all workers.
pub struct Watermarker {
    font: FontVec,
    style: WatermarkStyle,
}

impl Watermarker {
    pub fn new(font: LoadedFont) -> Self {
        Self::with_style(font, WatermarkStyle::default())
    }

    pub fn with_style(font: LoadedFont, style: WatermarkStyle) -> Self {
        Self {
            font: font.font,
            style,
        }
    }

    /// Composite `text` onto `image` at the bottom-left corner.
    ///
    /// `©` is prepended unless the text already starts with it. Text wider
    /// than the canvas is word-wrapped; a single word wider than the canvas
    /// stays on its own line rather than being split.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn apply(&self, image: &DynamicImage, text: &str, opacity: Opacity) -> DynamicImage {
        let mut base = image.to_rgba8();
        let (width, height) = base.dimensions();
        let style = &self.style;

        let text = credit_text(text);
        let scale = PxScale::from(style.min_font_size.max(width / style.font_divisor) as f32);
        let max_text_width = width.saturating_sub((style.margin + style.padding) * 2);
        let lines = wrap_text(&text, max_text_width, |s| text_size(scale, &self.font, s).0);
        if lines.is_empty() {
            return DynamicImage::ImageRgba8(base);
        }

        let line_height = text_size(scale, &self.font, "Ag").1;
        let line_count = lines.len() as u32;
        let text_block_h = line_height * line_count + style.line_spacing * (line_count - 1);
        let widest = lines
            .iter()
            .map(|line| text_size(scale, &self.font, line).0)
            .max()
            .unwrap_or(0);

        let pill_w = widest + style.padding * 2;
        let pill_h = text_block_h + style.padding * 2;
        let pill_x = style.margin as i32;
        let pill_y = height as i32 - pill_h as i32 - style.margin as i32;

        let mut layer = RgbaImage::new(width, height);
        let [br, bg, bb] = style.background;
        let pill_color = Rgba([br, bg, bb, opacity.scale(style.background_alpha)]);
        draw_rounded_rect(&mut layer, pill_x, pill_y, pill_w, pill_h, style.corner_radius, pill_color);

        let [fr, fg, fb] = style.foreground;
        let text_color = Rgba([fr, fg, fb, opacity.scale(u8::MAX)]);
        let mut text_y = pill_y + style.padding as i32;
        for line in &lines {
            draw_text_mut(
                &mut layer,
                text_color,
                pill_x + style.padding as i32,
                text_y,
                scale,
                &self.font,
                line,
            );
            text_y += (line_height + style.line_spacing) as i32;
        }

        image::imageops::overlay(&mut base, &layer, 0, 0);
        debug!(lines = lines.len(), pill_w, pill_h, "Watermark composited");
        DynamicImage::ImageRgba8(base)
    }
}

/// Prefix `©` unless already present.
pub fn credit_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with(COPYRIGHT_SYMBOL) {
        trimmed.to_owned()
    } else {
        format!("{COPYRIGHT_SYMBOL} {trimmed}")
    }
}

/// Greedy word wrap: add words to the current line while `measure` stays
/// within `max_width`.
pub fn wrap_text(text: &str, max_width: u32, measure: impl Fn(&str) -> u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_owned()
        } else {
            format!("{current} {word}")
        };
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = word.to_owned();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Fill a rectangle with rounded corners: two overlapping bars plus a disc
/// at each corner.
fn draw_rounded_rect(
    canvas: &mut RgbaImage,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    radius: u32,
    color: Rgba<u8>,
) {
    if width == 0 || height == 0 {
        return;
    }
    let r = radius.min(width / 2).min(height / 2);
    if r == 0 {
        draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(width, height), color);
        return;
    }
    let ri = r as i32;

    if width > 2 * r {
        draw_filled_rect_mut(canvas, Rect::at(x + ri, y).of_size(width - 2 * r, height), color);
    }
    if height > 2 * r {
        draw_filled_rect_mut(canvas, Rect::at(x, y + ri).of_size(width, height - 2 * r), color);
    }

    let right = x + width as i32 - 1 - ri;
    let bottom = y + height as i32 - 1 - ri;
    for center in [(x + ri, y + ri), (right, y + ri), (x + ri, bottom), (right, bottom)] {
        draw_filled_circle_mut(canvas, center, ri, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed-width measure: 10px per character.
    fn mono(s: &str) -> u32 {
        s.chars().count() as u32 * 10
    }

    #[test]
    fn copyright_symbol_is_prefixed_once() {
        assert_eq!(credit_text("HA York / ASM-MIL"), "© HA York / ASM-MIL");
        assert_eq!(credit_text("© 2024 Studio"), "© 2024 Studio");
    }

    #[test]
    fn short_text_stays_on_one_line() {
        assert_eq!(wrap_text("© HA York", 200, mono), vec!["© HA York"]);
    }

    #[test]
    fn long_text_wraps_greedily() {
        let lines = wrap_text("© aaaa bbbb cccc", 100, mono);
        assert_eq!(lines, vec!["© aaaa", "bbbb cccc"]);
    }

    #[test]
    fn oversized_word_gets_its_own_line() {
        let lines = wrap_text("a enormouslylongword b", 50, mono);
        assert_eq!(lines, vec!["a", "enormouslylongword", "b"]);
    }

    #[test]
    fn empty_text_has_no_lines() {
        assert!(wrap_text("   ", 100, mono).is_empty());
    }

    #[test]
    fn rounded_rect_leaves_corners_clear() {
        let mut canvas = RgbaImage::new(40, 20);
        let color = Rgba([0, 0, 0, 200]);
        draw_rounded_rect(&mut canvas, 0, 0, 40, 20, 6, color);
        assert_eq!(canvas.get_pixel(0, 0)[3], 0);
        assert_eq!(canvas.get_pixel(20, 10), &color);
        assert_eq!(canvas.get_pixel(20, 0), &color);
    }

    #[test]
    fn renders_with_a_system_font_when_available() {
        let Ok(font) = crate::image::font::load_font(None) else {
            return;
        };
        let marker = Watermarker::new(font);
        let src = DynamicImage::ImageRgba8(RgbaImage::from_pixel(400, 300, Rgba([255, 255, 255, 255])));
        let out = marker
            .apply(&src, "HA York / ASM-MIL", Opacity::new(1.0).unwrap())
            .to_rgba8();

        assert_eq!(out.dimensions(), (400, 300));
        // Pill sits in the bottom-left corner and darkens it.
        let inside = out.get_pixel(6, 300 - 8);
        assert!(inside[0] < 200);
        // The top-right corner is untouched.
        assert_eq!(out.get_pixel(399, 0), &Rgba([255, 255, 255, 255]));
    }
}
