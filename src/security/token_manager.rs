//! Central Portal user token handling
//!
//! Credentials are read from the environment only and held as
//! [`SecretString`] so they never end up in logs or debug output.

use crate::core::error::DeployError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

pub const USERNAME_VAR: &str = "CENTRAL_USERNAME";
pub const PASSWORD_VAR: &str = "CENTRAL_PASSWORD";

/// User token pair generated on the Central Portal
///
/// # Examples
///
/// ```
/// use central_publisher::security::PortalCredentials;
///
/// let credentials = PortalCredentials::new("user", "secret-password");
/// assert_eq!(credentials.masked_username(), "****");
/// ```
pub struct PortalCredentials {
    username: SecretString,
    password: SecretString,
}

impl PortalCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: SecretString::from(username.into()),
            password: SecretString::from(password.into()),
        }
    }

    /// Read `CENTRAL_USERNAME` and `CENTRAL_PASSWORD` from the process
    /// environment
    pub fn from_env() -> Result<Self, DeployError> {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Read the credentials from an explicit variable map
    ///
    /// Both variables must be set and non-blank.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, DeployError> {
        let lookup = |name: &str| {
            vars.get(name)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        match (lookup(USERNAME_VAR), lookup(PASSWORD_VAR)) {
            (Some(username), Some(password)) => Ok(Self::new(username, password)),
            _ => Err(DeployError::MissingCredentials {
                username_var: USERNAME_VAR,
                password_var: PASSWORD_VAR,
            }),
        }
    }

    /// Value of the `Authorization` header: `Bearer base64(username:password)`
    pub fn bearer_token(&self) -> SecretString {
        let raw = format!(
            "{}:{}",
            self.username.expose_secret(),
            self.password.expose_secret()
        );
        SecretString::from(format!("Bearer {}", STANDARD.encode(raw)))
    }

    pub fn masked_username(&self) -> String {
        mask_token(self.username.expose_secret())
    }

    /// Replace every occurrence of the credentials in `text`
    pub fn redact(&self, text: &str) -> String {
        let encoded = STANDARD.encode(format!(
            "{}:{}",
            self.username.expose_secret(),
            self.password.expose_secret()
        ));
        [
            encoded.as_str(),
            self.password.expose_secret(),
            self.username.expose_secret(),
        ]
        .iter()
        .filter(|secret| !secret.is_empty())
        .fold(text.to_string(), |acc, secret| {
            acc.replace(secret, &mask_token(secret))
        })
    }
}

impl std::fmt::Debug for PortalCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalCredentials")
            .field("username", &self.masked_username())
            .field("password", &"****")
            .finish()
    }
}

/// Mask a token for safe logging
///
/// Shows only the first 3 and last 3 characters. Tokens shorter than 10
/// characters are fully masked.
pub fn mask_token(token: &str) -> String {
    if token.chars().count() < 10 {
        return "****".to_string();
    }

    let chars: Vec<char> = token.chars().collect();
    let prefix: String = chars[..3].iter().collect();
    let suffix: String = chars[chars.len() - 3..].iter().collect();
    format!("{}...{}", prefix, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_vars_reads_both_variables() {
        let credentials = PortalCredentials::from_vars(&vars(&[
            (USERNAME_VAR, "token-user"),
            (PASSWORD_VAR, "token-password"),
        ]))
        .unwrap();

        assert_eq!(credentials.username.expose_secret(), "token-user");
        assert_eq!(credentials.password.expose_secret(), "token-password");
    }

    #[test]
    fn test_missing_password_fails() {
        let result = PortalCredentials::from_vars(&vars(&[(USERNAME_VAR, "token-user")]));

        assert!(matches!(
            result,
            Err(DeployError::MissingCredentials { .. })
        ));
    }

    #[test]
    fn test_blank_username_fails() {
        let result = PortalCredentials::from_vars(&vars(&[
            (USERNAME_VAR, "  "),
            (PASSWORD_VAR, "token-password"),
        ]));

        assert!(result.is_err());
    }

    #[test]
    fn test_bearer_token_encodes_user_and_password() {
        let credentials = PortalCredentials::new("user", "pass");

        // base64("user:pass")
        assert_eq!(credentials.bearer_token().expose_secret(), "Bearer dXNlcjpwYXNz");
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let credentials = PortalCredentials::new("long-username-value", "super-secret-password");

        let debug = format!("{:?}", credentials);

        assert!(!debug.contains("super-secret-password"));
        assert!(!debug.contains("long-username-value"));
        assert!(debug.contains("lon...lue"));
    }

    #[test]
    fn test_redact_replaces_secrets() {
        let credentials = PortalCredentials::new("user", "super-secret-password");

        let redacted = credentials.redact("auth failed for super-secret-password (dXNlcjpzdXBlci1zZWNyZXQtcGFzc3dvcmQ=)");

        assert!(!redacted.contains("super-secret-password"));
        assert!(!redacted.contains("dXNlcjpzdXBlci1zZWNyZXQtcGFzc3dvcmQ="));
        assert!(redacted.contains("sup...ord"));
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "****");
        assert_eq!(mask_token(""), "****");
        assert_eq!(mask_token("abcdef123456"), "abc...456");
    }
}
