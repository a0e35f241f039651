// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layered document module — PSD decoding and flattening.

pub mod psd;

pub use self::psd::LayeredDocument;
