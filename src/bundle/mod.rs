//! Bundle assembly
//!
//! Scans the publish directory, creates checksum files and packs everything
//! into the zip bundle uploaded to the Central Portal.

pub mod bundler;
pub mod checksum;
pub mod file_set;

pub use bundler::{Bundle, Bundler};
pub use checksum::{ChecksumAlgorithm, ChecksumCreator};
pub use file_set::{FileScanner, FileSet};
