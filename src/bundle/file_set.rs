//! Relative file sets rooted at the publish directory

use crate::core::error::DeployError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Ordered, deduplicated set of paths relative to one root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSet {
    root: PathBuf,
    files: BTreeSet<PathBuf>,
}

impl FileSet {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: BTreeSet::new(),
        }
    }

    pub fn from_paths<I, P>(root: impl Into<PathBuf>, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            root: root.into(),
            files: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, relative: impl AsRef<Path>) -> bool {
        self.files.contains(relative.as_ref())
    }

    /// Relative paths in order
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    /// Absolute location of a relative entry
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Union of both sets
    ///
    /// Relative entries only make sense below one root, so sets with
    /// different roots are rejected.
    pub fn plus(&self, other: &FileSet) -> Result<FileSet, DeployError> {
        if self.root != other.root {
            return Err(DeployError::FileSetRootMismatch {
                left: self.root.clone(),
                right: other.root.clone(),
            });
        }
        Ok(FileSet {
            root: self.root.clone(),
            files: self.files.union(&other.files).cloned().collect(),
        })
    }
}

/// Recursively lists regular files below a directory
#[derive(Debug, Default, Clone, Copy)]
pub struct FileScanner;

impl FileScanner {
    pub fn new() -> Self {
        Self
    }

    pub fn scan(&self, root: &Path) -> Result<FileSet, DeployError> {
        let mut files = BTreeSet::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| DeployError::io(root, e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            // WalkDir yields paths prefixed with root
            if let Ok(relative) = entry.path().strip_prefix(root) {
                files.insert(relative.to_path_buf());
            }
        }

        Ok(FileSet {
            root: root.to_path_buf(),
            files,
        })
    }
}
