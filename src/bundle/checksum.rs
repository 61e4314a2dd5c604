//! Checksum files for staged artifacts
//!
//! The Central Portal requires an `.md5` and a `.sha1` file next to every
//! artifact and also accepts `.sha256` and `.sha512`.

use crate::bundle::file_set::FileSet;
use crate::core::error::DeployError;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    pub const ALL: [ChecksumAlgorithm; 4] = [Self::Md5, Self::Sha1, Self::Sha256, Self::Sha512];

    /// File extension of the checksum file, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Lowercase hex digest of `data`
    pub fn digest(self, data: &[u8]) -> String {
        match self {
            Self::Md5 => hex::encode(Md5::digest(data)),
            Self::Sha1 => hex::encode(Sha1::digest(data)),
            Self::Sha256 => hex::encode(Sha256::digest(data)),
            Self::Sha512 => hex::encode(Sha512::digest(data)),
        }
    }

    fn is_checksum_file(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| Self::ALL.iter().any(|a| a.extension() == ext))
    }
}

impl std::str::FromStr for ChecksumAlgorithm {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace('-', "");
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.extension() == name)
            .ok_or_else(|| {
                DeployError::Config(format!(
                    "Unknown checksum algorithm '{}', expected md5, sha1, sha256 or sha512",
                    s.trim()
                ))
            })
    }
}

/// Writes checksum files next to the files of a [`FileSet`]
#[derive(Debug, Clone)]
pub struct ChecksumCreator {
    algorithms: Vec<ChecksumAlgorithm>,
}

impl Default for ChecksumCreator {
    fn default() -> Self {
        Self::new(ChecksumAlgorithm::ALL.to_vec())
    }
}

impl ChecksumCreator {
    pub fn new(algorithms: Vec<ChecksumAlgorithm>) -> Self {
        Self { algorithms }
    }

    /// Create checksum files for every file in `files`
    ///
    /// Files that are checksums themselves are skipped. Returns the set of
    /// created checksum files, rooted like `files`.
    pub fn create_checksums(&self, files: &FileSet) -> Result<FileSet, DeployError> {
        let mut created = Vec::new();

        for relative in files.iter() {
            if ChecksumAlgorithm::is_checksum_file(relative) {
                continue;
            }
            let path = files.resolve(relative);
            let content = fs::read(&path).map_err(|e| DeployError::io(&path, e))?;

            for algorithm in &self.algorithms {
                let checksum_relative = with_appended_extension(relative, algorithm.extension());
                let checksum_path = files.resolve(&checksum_relative);
                fs::write(&checksum_path, algorithm.digest(&content))
                    .map_err(|e| DeployError::io(&checksum_path, e))?;
                created.push(checksum_relative);
            }
        }

        debug!(count = created.len(), "created checksum files");
        Ok(FileSet::from_paths(files.root(), created))
    }
}

fn with_appended_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}
