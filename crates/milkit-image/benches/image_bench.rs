// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the milkit-image crate. Covers the per-file hot
// path that does not need a font: shrink-to-fit followed by PNG encoding.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgba, RgbaImage};

use milkit_core::OutputFormat;
use milkit_image::ImageProcessor;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Downscale a 2000x1500 gradient to a 512px bound and encode it as PNG.
fn bench_fit_and_encode(c: &mut Criterion) {
    let (width, height) = (2000u32, 1500u32);
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    });
    let dynamic = DynamicImage::ImageRgba8(img);

    c.bench_function("fit_within(512) + png (2000x1500)", |b| {
        b.iter(|| {
            let processor =
                ImageProcessor::from_dynamic(black_box(dynamic.clone())).fit_within(Some(512));
            black_box(processor.encode(OutputFormat::Png).unwrap());
        });
    });
}

criterion_group!(benches, bench_fit_and_encode);
criterion_main!(benches);
