// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output path derivation: mirror the input subpath under the output root and
// retarget the extension.

use std::path::PathBuf;

use milkit_core::config::JobSettings;
use milkit_core::types::{OutputFormat, OutputSpec, OverwritePolicy, SourceFile};

#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    format: OutputFormat,
    max_resolution: Option<u32>,
    overwrite: OverwritePolicy,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            root: root.into(),
            format,
            max_resolution: None,
            overwrite: OverwritePolicy::Overwrite,
        }
    }

    pub fn from_settings(settings: &JobSettings) -> Self {
        Self {
            root: settings.output_root().to_path_buf(),
            format: settings.output_format,
            max_resolution: settings.max_resolution,
            overwrite: settings.overwrite,
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// `root / relative` with the extension replaced by the target format's.
    pub fn output_path(&self, source: &SourceFile) -> PathBuf {
        self.root
            .join(&source.relative)
            .with_extension(self.format.extension())
    }

    pub fn spec_for(&self, source: &SourceFile) -> OutputSpec {
        OutputSpec {
            path: self.output_path(source),
            format: self.format,
            max_resolution: self.max_resolution,
            overwrite: self.overwrite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn source(rel: &str) -> SourceFile {
        let root = Path::new("/in");
        SourceFile::under_root(root, &root.join(rel)).unwrap()
    }

    #[test]
    fn mirrors_subpath_and_retargets_extension() {
        let layout = OutputLayout::new("/out", OutputFormat::Png);
        assert_eq!(
            layout.output_path(&source("sub/a.psd")),
            PathBuf::from("/out/sub/a.png")
        );
    }

    #[test]
    fn jpeg_writes_jpg() {
        let layout = OutputLayout::new("/out", OutputFormat::Jpeg);
        assert_eq!(
            layout.output_path(&source("2314.PSD")),
            PathBuf::from("/out/2314.jpg")
        );
    }

    #[test]
    fn dotted_stems_keep_their_inner_dots() {
        let layout = OutputLayout::new("/out", OutputFormat::Tiff);
        assert_eq!(
            layout.output_path(&source("a/v1.2 final.png")),
            PathBuf::from("/out/a/v1.2 final.tiff")
        );
    }

    #[test]
    fn spec_carries_settings() {
        let mut settings = JobSettings::new("/in");
        settings.output_dir = Some("/out".into());
        settings.output_format = OutputFormat::WebP;
        settings.max_resolution = Some(800);
        settings.overwrite = OverwritePolicy::SkipExisting;

        let spec = OutputLayout::from_settings(&settings).spec_for(&source("x.psd"));
        assert_eq!(spec.path, PathBuf::from("/out/x.webp"));
        assert_eq!(spec.max_resolution, Some(800));
        assert_eq!(spec.overwrite, OverwritePolicy::SkipExisting);
    }

    #[test]
    fn defaults_to_the_input_root() {
        let settings = JobSettings::new("/in");
        let layout = OutputLayout::from_settings(&settings);
        assert_eq!(layout.output_path(&source("x.psd")), PathBuf::from("/in/x.png"));
    }
}
