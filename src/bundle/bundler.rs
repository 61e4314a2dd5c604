//! Zip bundle creation

use crate::bundle::file_set::FileSet;
use crate::core::error::DeployError;
use std::fs::File;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use uuid::Uuid;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zip archive ready to be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    path: PathBuf,
    size: u64,
}

impl Bundle {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Delete the archive
    pub fn remove(&self) -> Result<(), DeployError> {
        std::fs::remove_file(&self.path).map_err(|e| DeployError::io(&self.path, e))
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bundle.zip".to_string())
    }
}

/// Packs a [`FileSet`] into a zip archive
#[derive(Debug, Clone)]
pub struct Bundler {
    output_dir: PathBuf,
}

impl Bundler {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Create a bundle holding every file of `files`, named by its path
    /// relative to `root`
    pub fn create_bundle(&self, root: &Path, files: &FileSet) -> Result<Bundle, DeployError> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| DeployError::io(&self.output_dir, e))?;

        let path = self
            .output_dir
            .join(format!("central-bundle-{}.zip", Uuid::new_v4()));
        let file = File::create(&path).map_err(|e| DeployError::io(&path, e))?;
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for relative in files.iter() {
            let source = root.join(relative);
            let data = std::fs::read(&source).map_err(|e| DeployError::io(&source, e))?;
            zip.start_file(entry_name(relative), options)?;
            zip.write_all(&data).map_err(|e| DeployError::io(&path, e))?;
        }

        zip.finish()?;

        let size = std::fs::metadata(&path)
            .map_err(|e| DeployError::io(&path, e))?
            .len();
        debug!(path = %path.display(), size, entries = files.len(), "bundle written");

        Ok(Bundle { path, size })
    }
}

/// Zip entry names always use forward slashes
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn test_create_bundle_contains_all_files() {
        let staging = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        fs::create_dir_all(staging.path().join("com/example")).unwrap();
        fs::write(staging.path().join("com/example/lib.jar"), b"jar-bytes").unwrap();
        fs::write(staging.path().join("com/example/lib.jar.md5"), b"digest").unwrap();
        let files = FileSet::from_paths(
            staging.path(),
            ["com/example/lib.jar", "com/example/lib.jar.md5"],
        );

        let bundle = Bundler::new(output.path())
            .create_bundle(staging.path(), &files)
            .unwrap();

        assert!(bundle.path().starts_with(output.path()));
        assert_eq!(bundle.size(), fs::metadata(bundle.path()).unwrap().len());
        assert!(bundle.file_name().starts_with("central-bundle-"));

        let mut archive = zip::ZipArchive::new(File::open(bundle.path()).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let mut content = String::new();
        archive
            .by_name("com/example/lib.jar")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "jar-bytes");
    }

    #[test]
    fn test_missing_source_file_fails() {
        let staging = TempDir::new().unwrap();
        let files = FileSet::from_paths(staging.path(), ["gone.jar"]);

        let result = Bundler::new(staging.path()).create_bundle(staging.path(), &files);

        assert!(matches!(result, Err(DeployError::Io { .. })));
    }

    #[test]
    fn test_remove_deletes_the_archive() {
        let staging = TempDir::new().unwrap();
        fs::write(staging.path().join("lib.jar"), b"jar").unwrap();
        let files = FileSet::from_paths(staging.path(), ["lib.jar"]);
        let bundle = Bundler::new(staging.path().join("out"))
            .create_bundle(staging.path(), &files)
            .unwrap();

        bundle.remove().unwrap();

        assert!(!bundle.path().exists());
        assert!(matches!(bundle.remove(), Err(DeployError::Io { .. })));
    }

    #[test]
    fn test_entry_name_uses_forward_slashes() {
        let relative: PathBuf = ["com", "example", "lib.jar"].iter().collect();

        assert_eq!(entry_name(&relative), "com/example/lib.jar");
    }
}
