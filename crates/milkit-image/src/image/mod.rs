// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decode/resize/encode, font discovery, and text watermarking.

pub mod font;
pub mod processor;
pub mod watermark;

pub use processor::ImageProcessor;
