// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Input discovery — walk the input root and yield recognised source files in
// a stable order.
//
// Children are visited sorted by file name, depth first, which is the same
// order as sorting the relative paths component by component. `limit`
// therefore always keeps the same prefix on an unchanged tree.

use std::path::{Path, PathBuf};

use milkit_core::error::{MilkitError, Result};
use milkit_core::types::{SourceFile, SourceKind};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Finds the source files a job will process.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    recursive: bool,
    limit: Option<usize>,
    kind: SourceKind,
}

impl PathResolver {
    /// Resolve files of `kind` directly under `root`.
    pub fn new(root: impl Into<PathBuf>, kind: SourceKind) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            limit: None,
            kind,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fail fast if the root is missing or not a directory.
    pub fn check_root(&self) -> Result<()> {
        let meta = std::fs::metadata(&self.root).map_err(|err| MilkitError::Resolution {
            path: self.root.clone(),
            reason: err.to_string(),
        })?;
        if !meta.is_dir() {
            return Err(MilkitError::Resolution {
                path: self.root.clone(),
                reason: "not a directory".into(),
            });
        }
        Ok(())
    }

    /// Lazily walk the tree. Each call starts a fresh traversal.
    ///
    /// Unreadable entries are logged and skipped.
    pub fn iter(&self) -> impl Iterator<Item = SourceFile> + '_ {
        let max_depth = if self.recursive { usize::MAX } else { 1 };
        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(
                        path = ?err.path().map(Path::display).map(|d| d.to_string()),
                        error = %err,
                        "skipping unreadable entry"
                    );
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| SourceFile::under_root(&self.root, entry.path()))
            .filter(|file| file.kind == self.kind)
            .take(self.limit.unwrap_or(usize::MAX))
    }

    /// Check the root and collect every matching file.
    pub fn resolve(&self) -> Result<Vec<SourceFile>> {
        self.check_root()?;
        let files: Vec<SourceFile> = self.iter().collect();
        info!(
            root = %self.root.display(),
            recursive = self.recursive,
            found = files.len(),
            "Resolved input files"
        );
        for file in &files {
            debug!(relative = %file.relative.display(), "input");
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn relatives(files: &[SourceFile]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.relative.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for rel in ["b.psd", "a.PSD", "notes.txt", "sub/c.psd", "sub/deeper/d.psd", "a/z.psd", "x.png"] {
            touch(dir.path(), rel);
        }
        dir
    }

    #[test]
    fn flat_mode_only_sees_direct_children() {
        let dir = tree();
        let files = PathResolver::new(dir.path(), SourceKind::LayeredDocument)
            .resolve()
            .unwrap();
        assert_eq!(relatives(&files), vec!["a.PSD", "b.psd"]);
    }

    #[test]
    fn recursive_mode_orders_by_relative_path() {
        let dir = tree();
        let files = PathResolver::new(dir.path(), SourceKind::LayeredDocument)
            .recursive(true)
            .resolve()
            .unwrap();
        let rel = relatives(&files);
        assert_eq!(rel, vec!["a/z.psd", "a.PSD", "b.psd", "sub/c.psd", "sub/deeper/d.psd"]);

        let mut sorted: Vec<PathBuf> = files.iter().map(|f| f.relative.clone()).collect();
        sorted.sort();
        assert_eq!(sorted, files.iter().map(|f| f.relative.clone()).collect::<Vec<_>>());
    }

    #[test]
    fn limit_keeps_a_stable_prefix() {
        let dir = tree();
        let resolver = PathResolver::new(dir.path(), SourceKind::LayeredDocument)
            .recursive(true)
            .limit(Some(2));
        let first = resolver.resolve().unwrap();
        let second = resolver.resolve().unwrap();
        assert_eq!(first, second);
        assert_eq!(relatives(&first), vec!["a/z.psd", "a.PSD"]);
    }

    #[test]
    fn raster_kind_picks_images() {
        let dir = tree();
        let files = PathResolver::new(dir.path(), SourceKind::Raster).resolve().unwrap();
        assert_eq!(relatives(&files), vec!["x.png"]);
        assert_eq!(files[0].stem, "x");
    }

    #[test]
    fn missing_root_is_a_resolution_error() {
        let err = PathResolver::new("/no/such/dir", SourceKind::Raster)
            .resolve()
            .unwrap_err();
        assert!(matches!(err, MilkitError::Resolution { .. }));
    }

    #[test]
    fn file_root_is_rejected() {
        let dir = tree();
        let err = PathResolver::new(dir.path().join("b.psd"), SourceKind::LayeredDocument)
            .resolve()
            .unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn empty_directory_resolves_to_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let files = PathResolver::new(dir.path(), SourceKind::Raster).resolve().unwrap();
        assert!(files.is_empty());
    }
}
