//! Central Portal publisher API: client, deployments and their errors

pub mod client;
pub mod deployment;
pub mod errors;

pub use client::{PortalClient, USER_AGENT};
pub use deployment::{Deployment, StatusPolling};
pub use errors::{Errors, already_exists_message};
