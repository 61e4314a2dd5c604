//! Orchestration layer for Central Portal deployments
//!
//! This module drives the publish-and-await workflow on top of the bundle,
//! portal and core modules.

pub mod artifact_awaiter;
pub mod deployer;

// Re-export main types for convenience
pub use artifact_awaiter::{ArtifactAwaiter, HttpArtifactProbe};
pub use deployer::{DeployOptions, DeployResult, Deployer};
