pub mod token_manager;

pub use token_manager::{PASSWORD_VAR, PortalCredentials, USERNAME_VAR, mask_token};
