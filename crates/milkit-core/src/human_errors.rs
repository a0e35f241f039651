// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command line.
//
// Every error is mapped to a plain-English headline with a concrete next
// step. Setup errors get specific advice; per-file errors point at the file.

use crate::error::{ErrorClass, MilkitError};

/// A human-readable error with a plain-English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// One-line summary.
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
    /// Whether the run as a whole was stopped by this error.
    pub fatal: bool,
}

/// Convert a `MilkitError` into a `HumanError`.
pub fn humanize_error(err: &MilkitError) -> HumanError {
    let fatal = err.class() == ErrorClass::Setup;
    let (message, suggestion) = match err {
        MilkitError::Resolution { path, reason } => (
            format!("Can't read the input folder {}.", path.display()),
            format!("Check that the folder exists and you can open it. ({reason})"),
        ),

        MilkitError::MetadataLoad { path, reason } => (
            format!("Can't use the metadata file {}.", path.display()),
            if reason.contains("not found in") {
                format!("Check the column names, or pass --key-column / --value-column. ({reason})")
            } else {
                format!("Make sure it is a readable .csv, .xlsx, .xls or .ods file. ({reason})")
            },
        ),

        MilkitError::Config(detail) => (
            "The options don't fit together.".into(),
            format!("Fix the command line and try again. ({detail})"),
        ),

        MilkitError::Font(detail) => (
            "No font is available to draw the watermark.".into(),
            format!("Pass a .ttf or .otf file with --font. ({detail})"),
        ),

        MilkitError::Decode(detail) | MilkitError::Document(detail) => (
            "A file could not be read as an image.".into(),
            format!("The file may be damaged or in an unsupported variant. ({detail})"),
        ),

        MilkitError::Encode(detail) => (
            "An image could not be converted.".into(),
            format!("Try a different --output-format. ({detail})"),
        ),

        MilkitError::Panicked(detail) => (
            "Processing crashed on a file.".into(),
            format!("The rest of the batch kept going; please report this file. ({detail})"),
        ),

        MilkitError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::PermissionDenied => (
                "Permission denied.".into(),
                "Check that you can write to the output folder.".into(),
            ),
            std::io::ErrorKind::NotFound => (
                "A file disappeared while it was being processed.".into(),
                "Make sure nothing else is moving files in the input folder.".into(),
            ),
            _ => (
                "A file could not be read or written.".into(),
                format!("Check free disk space and try again. ({io_err})"),
            ),
        },
    };

    HumanError {
        message,
        suggestion,
        fatal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn missing_column_suggests_flags() {
        let err = MilkitError::MetadataLoad {
            path: PathBuf::from("meta.xlsx"),
            reason: "column `MIL #` not found in header [Id, Name]".into(),
        };
        let human = humanize_error(&err);
        assert!(human.fatal);
        assert!(human.suggestion.contains("--key-column"));
    }

    #[test]
    fn decode_failure_is_not_fatal() {
        let human = humanize_error(&MilkitError::Decode("bad magic".into()));
        assert!(!human.fatal);
        assert!(human.suggestion.contains("bad magic"));
    }

    #[test]
    fn permission_denied_mentions_output() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let human = humanize_error(&MilkitError::Io(io));
        assert!(human.suggestion.contains("output folder"));
    }
}
