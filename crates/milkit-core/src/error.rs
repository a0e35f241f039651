// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for milkit.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for all milkit operations.
#[derive(Debug, Error)]
pub enum MilkitError {
    // -- Setup errors (abort the run before dispatch) --
    #[error("input directory {} is not usable: {reason}", path.display())]
    Resolution { path: PathBuf, reason: String },

    #[error("failed to load metadata from {}: {reason}", path.display())]
    MetadataLoad { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no usable font: {0}")]
    Font(String),

    // -- Per-file errors (recorded as a failed outcome) --
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("layered document error: {0}")]
    Document(String),

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("worker panicked: {0}")]
    Panicked(String),

    // -- Storage --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether an error stops the whole run or only the file that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Raised while setting the run up; nothing is dispatched.
    Setup,
    /// Raised by a single file; the run carries on.
    Task,
}

impl MilkitError {
    /// Classify the error for propagation decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Resolution { .. } | Self::MetadataLoad { .. } | Self::Config(_) | Self::Font(_) => {
                ErrorClass::Setup
            }
            Self::Decode(_)
            | Self::Document(_)
            | Self::Encode(_)
            | Self::Panicked(_)
            | Self::Io(_) => ErrorClass::Task,
        }
    }

    /// Shorthand for `class() == ErrorClass::Setup`.
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Setup
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MilkitError>;
