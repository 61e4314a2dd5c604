pub mod bundle;
pub mod core;
pub mod orchestration;
pub mod portal;
pub mod security;

pub use bundle::{Bundle, Bundler, ChecksumAlgorithm, ChecksumCreator, FileScanner, FileSet};
pub use core::*;
pub use orchestration::{ArtifactAwaiter, DeployOptions, DeployResult, Deployer, HttpArtifactProbe};
pub use portal::{Deployment, Errors, PortalClient, StatusPolling};
pub use security::PortalCredentials;
