//! Configuration file loader for central-publisher
//!
//! This module provides configuration loading, merging and environment
//! variable expansion.

use super::config::*;
use crate::bundle::ChecksumAlgorithm;
use crate::core::error::DeployError;
use crate::core::traits::PublishingType;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".central-publish.yaml";

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}";

/// Configuration load options
#[derive(Debug, Clone, Default)]
pub struct ConfigLoadOptions {
    /// Directory searched for the project config file
    pub project_path: PathBuf,

    /// Explicit config file, replaces the project config lookup
    pub config_file: Option<PathBuf>,

    /// CLI arguments (highest priority)
    pub cli_args: Option<PublishConfig>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables (`CENTRAL_PUBLISH_*`)
    /// 3. Config file (`--config` or ./.central-publish.yaml)
    /// 4. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<PublishConfig, DeployError> {
        let mut configs: Vec<PublishConfig> = vec![PublishConfig::default()];

        let file_config = match &options.config_file {
            Some(path) => {
                let config = Self::load_config_file(path).await?;
                if config.is_none() {
                    return Err(DeployError::Config(format!(
                        "Config file '{}' does not exist",
                        path.display()
                    )));
                }
                config
            }
            None => Self::load_config_file(&options.project_path.join(CONFIG_FILENAME)).await?,
        };
        if let Some(file_config) = file_config {
            configs.push(file_config);
        }

        if let Some(env_config) = Self::load_env_config(&options.env)? {
            configs.push(env_config);
        }

        if let Some(cli_config) = options.cli_args {
            configs.push(cli_config);
        }

        let merged_config = Self::merge_configs(configs);

        Self::expand_env_vars(merged_config, &options.env)
    }

    /// Load configuration from YAML file, `None` if it does not exist
    async fn load_config_file(file_path: &Path) -> Result<Option<PublishConfig>, DeployError> {
        if !fs::try_exists(file_path).await.unwrap_or(false) {
            debug!(path = %file_path.display(), "no config file");
            return Ok(None);
        }

        let content = fs::read_to_string(file_path)
            .await
            .map_err(|e| DeployError::io(file_path, e))?;

        let config: PublishConfig = serde_yaml::from_str(&content).map_err(|e| {
            DeployError::Config(format!(
                "Failed to parse YAML config '{}': {}",
                file_path.display(),
                e
            ))
        })?;

        debug!(path = %file_path.display(), "loaded config file");
        Ok(Some(config))
    }

    /// Load configuration from `CENTRAL_PUBLISH_*` environment variables
    fn load_env_config(
        env: &HashMap<String, String>,
    ) -> Result<Option<PublishConfig>, DeployError> {
        let mut config = PublishConfig::default();
        let mut deployment = DeploymentConfig::default();
        let mut has_changes = false;

        let get = |name: &str| env.get(name).filter(|value| !value.is_empty());

        if let Some(directory) = get("CENTRAL_PUBLISH_DIRECTORY") {
            config.directory = Some(PathBuf::from(directory));
            has_changes = true;
        }
        if let Some(uri) = get("CENTRAL_PUBLISH_PORTAL_BASE_URI") {
            config.portal_base_uri = Some(uri.clone());
            has_changes = true;
        }
        if let Some(uri) = get("CENTRAL_PUBLISH_MAVEN_CENTRAL_BASE_URI") {
            config.maven_central_base_uri = Some(uri.clone());
            has_changes = true;
        }
        if let Some(publishing_type) = get("CENTRAL_PUBLISH_PUBLISHING_TYPE") {
            deployment.publishing_type = Some(publishing_type.parse::<PublishingType>()?);
            has_changes = true;
        }
        if let Some(name) = get("CENTRAL_PUBLISH_NAME") {
            deployment.name = Some(name.clone());
            has_changes = true;
        }
        if let Some(value) = get("CENTRAL_PUBLISH_DROP_ON_FAILURE") {
            deployment.drop_on_failure = Some(parse_bool("CENTRAL_PUBLISH_DROP_ON_FAILURE", value)?);
            has_changes = true;
        }
        if let Some(value) = get("CENTRAL_PUBLISH_IGNORE_ALREADY_EXISTS_ERROR") {
            deployment.ignore_already_exists_error = Some(parse_bool(
                "CENTRAL_PUBLISH_IGNORE_ALREADY_EXISTS_ERROR",
                value,
            )?);
            has_changes = true;
        }
        if let Some(coordinates) = get("CENTRAL_PUBLISH_AWAIT_ARTIFACT") {
            deployment.await_artifact = Some(coordinates.clone());
            has_changes = true;
        }
        if let Some(value) = get("CENTRAL_PUBLISH_TIMEOUT_SECONDS") {
            deployment.timeout_seconds = Some(parse_seconds("CENTRAL_PUBLISH_TIMEOUT_SECONDS", value)?);
            has_changes = true;
        }
        if let Some(value) = get("CENTRAL_PUBLISH_SLEEP_BETWEEN_RETRIES_SECONDS") {
            deployment.sleep_between_retries_seconds = Some(parse_seconds(
                "CENTRAL_PUBLISH_SLEEP_BETWEEN_RETRIES_SECONDS",
                value,
            )?);
            has_changes = true;
        }
        if let Some(value) = get("CENTRAL_PUBLISH_STATUS_POLL_INTERVAL_SECONDS") {
            deployment.status_poll_interval_seconds = Some(parse_seconds(
                "CENTRAL_PUBLISH_STATUS_POLL_INTERVAL_SECONDS",
                value,
            )?);
            has_changes = true;
        }
        if let Some(directory) = get("CENTRAL_PUBLISH_BUNDLE_DIRECTORY") {
            config.bundle_directory = Some(PathBuf::from(directory));
            has_changes = true;
        }
        if let Some(value) = get("CENTRAL_PUBLISH_CHECKSUMS") {
            config.checksums = Some(parse_checksums(value)?);
            has_changes = true;
        }

        if deployment != DeploymentConfig::default() {
            config.deployment = Some(deployment);
        }

        Ok(if has_changes { Some(config) } else { None })
    }

    /// Merge multiple configurations with priority
    fn merge_configs(configs: Vec<PublishConfig>) -> PublishConfig {
        let mut result = PublishConfig::default();

        for config in configs {
            Self::merge_into(&mut result, config);
        }

        result
    }

    /// Merge source config into target
    fn merge_into(target: &mut PublishConfig, source: PublishConfig) {
        if source.directory.is_some() {
            target.directory = source.directory;
        }
        if source.portal_base_uri.is_some() {
            target.portal_base_uri = source.portal_base_uri;
        }
        if source.maven_central_base_uri.is_some() {
            target.maven_central_base_uri = source.maven_central_base_uri;
        }
        if source.bundle_directory.is_some() {
            target.bundle_directory = source.bundle_directory;
        }
        if source.checksums.is_some() {
            target.checksums = source.checksums;
        }

        // Deployment settings merge field by field
        if let Some(source_deployment) = source.deployment {
            let target_deployment = target.deployment.get_or_insert_with(Default::default);

            if source_deployment.name.is_some() {
                target_deployment.name = source_deployment.name;
            }
            if source_deployment.publishing_type.is_some() {
                target_deployment.publishing_type = source_deployment.publishing_type;
            }
            if source_deployment.drop_on_failure.is_some() {
                target_deployment.drop_on_failure = source_deployment.drop_on_failure;
            }
            if source_deployment.ignore_already_exists_error.is_some() {
                target_deployment.ignore_already_exists_error =
                    source_deployment.ignore_already_exists_error;
            }
            if source_deployment.await_artifact.is_some() {
                target_deployment.await_artifact = source_deployment.await_artifact;
            }
            if source_deployment.timeout_seconds.is_some() {
                target_deployment.timeout_seconds = source_deployment.timeout_seconds;
            }
            if source_deployment.sleep_between_retries_seconds.is_some() {
                target_deployment.sleep_between_retries_seconds =
                    source_deployment.sleep_between_retries_seconds;
            }
            if source_deployment.status_poll_interval_seconds.is_some() {
                target_deployment.status_poll_interval_seconds =
                    source_deployment.status_poll_interval_seconds;
            }
        }
    }

    /// Expand `${VAR}` references in string settings
    fn expand_env_vars(
        mut config: PublishConfig,
        env: &HashMap<String, String>,
    ) -> Result<PublishConfig, DeployError> {
        let regex = Regex::new(ENV_VAR_PATTERN)
            .map_err(|e| DeployError::Config(format!("Invalid variable pattern: {}", e)))?;

        if let Some(directory) = &config.directory {
            let expanded = Self::expand_string(&regex, &directory.to_string_lossy(), env)?;
            config.directory = Some(PathBuf::from(expanded));
        }
        if let Some(directory) = &config.bundle_directory {
            let expanded = Self::expand_string(&regex, &directory.to_string_lossy(), env)?;
            config.bundle_directory = Some(PathBuf::from(expanded));
        }
        if let Some(uri) = &config.portal_base_uri {
            config.portal_base_uri = Some(Self::expand_string(&regex, uri, env)?);
        }
        if let Some(uri) = &config.maven_central_base_uri {
            config.maven_central_base_uri = Some(Self::expand_string(&regex, uri, env)?);
        }
        if let Some(deployment) = &mut config.deployment {
            if let Some(name) = &deployment.name {
                deployment.name = Some(Self::expand_string(&regex, name, env)?);
            }
            if let Some(coordinates) = &deployment.await_artifact {
                deployment.await_artifact = Some(Self::expand_string(&regex, coordinates, env)?);
            }
        }

        Ok(config)
    }

    /// Expand environment variables in a single string
    fn expand_string(
        regex: &Regex,
        input: &str,
        env: &HashMap<String, String>,
    ) -> Result<String, DeployError> {
        let mut missing = None;
        let expanded = regex.replace_all(input, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match env.get(var_name) {
                Some(value) => value.clone(),
                None => {
                    missing.get_or_insert_with(|| var_name.to_string());
                    String::new()
                }
            }
        });

        match missing {
            Some(var_name) => Err(DeployError::Config(format!(
                "Environment variable {} referenced in '{}' is not set",
                var_name, input
            ))),
            None => Ok(expanded.into_owned()),
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, DeployError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(DeployError::Config(format!(
            "{} must be true or false, got '{}'",
            name, value
        ))),
    }
}

fn parse_seconds(name: &str, value: &str) -> Result<u64, DeployError> {
    value.trim().parse().map_err(|_| {
        DeployError::Config(format!("{} must be a number of seconds, got '{}'", name, value))
    })
}

/// Comma separated algorithm names, e.g. `md5,sha1`
fn parse_checksums(value: &str) -> Result<Vec<ChecksumAlgorithm>, DeployError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_load_without_sources_is_default() {
        let temp_dir = TempDir::new().unwrap();

        let config = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(config, PublishConfig::default());
    }

    #[tokio::test]
    async fn test_load_project_config() {
        let temp_dir = TempDir::new().unwrap();
        tokio::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "directory: build/staging\ndeployment:\n  publishing_type: USER_MANAGED\n",
        )
        .await
        .unwrap();

        let config = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(config.directory, Some(PathBuf::from("build/staging")));
        assert_eq!(
            config.deployment.unwrap().publishing_type,
            Some(PublishingType::UserManaged)
        );
    }

    #[tokio::test]
    async fn test_missing_explicit_config_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();

        let result = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            config_file: Some(temp_dir.path().join("missing.yaml")),
            ..Default::default()
        })
        .await;

        assert!(matches!(result, Err(DeployError::Config(_))));
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        tokio::fs::write(temp_dir.path().join(CONFIG_FILENAME), "deployment: [")
            .await
            .unwrap();

        let result = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .await;

        assert!(matches!(result, Err(DeployError::Config(_))));
    }

    #[tokio::test]
    async fn test_priority_cli_over_env_over_file() {
        let temp_dir = TempDir::new().unwrap();
        tokio::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "directory: from-file\ndeployment:\n  drop_on_failure: true\n  timeout_seconds: 10\n",
        )
        .await
        .unwrap();

        let cli_args = PublishConfig {
            directory: Some(PathBuf::from("from-cli")),
            ..Default::default()
        };

        let config = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            config_file: None,
            cli_args: Some(cli_args),
            env: env(&[
                ("CENTRAL_PUBLISH_DIRECTORY", "from-env"),
                ("CENTRAL_PUBLISH_DROP_ON_FAILURE", "false"),
            ]),
        })
        .await
        .unwrap();

        assert_eq!(config.directory, Some(PathBuf::from("from-cli")));
        let deployment = config.deployment.unwrap();
        assert_eq!(deployment.drop_on_failure, Some(false));
        assert_eq!(deployment.timeout_seconds, Some(10));
    }

    #[tokio::test]
    async fn test_invalid_env_bool_is_an_error() {
        let temp_dir = TempDir::new().unwrap();

        let result = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            env: env(&[("CENTRAL_PUBLISH_IGNORE_ALREADY_EXISTS_ERROR", "maybe")]),
            ..Default::default()
        })
        .await;

        assert!(matches!(result, Err(DeployError::Config(_))));
    }

    #[tokio::test]
    async fn test_env_var_expansion() {
        let temp_dir = TempDir::new().unwrap();
        tokio::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "directory: ${STAGING}/repo\ndeployment:\n  await_artifact: com.example:lib:${VERSION}\n",
        )
        .await
        .unwrap();

        let config = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            env: env(&[("STAGING", "/tmp/staging"), ("VERSION", "1.2.3")]),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(config.directory, Some(PathBuf::from("/tmp/staging/repo")));
        assert_eq!(
            config.deployment.unwrap().await_artifact,
            Some("com.example:lib:1.2.3".to_string())
        );
    }

    #[tokio::test]
    async fn test_unset_env_var_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        tokio::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "directory: ${NOT_SET_ANYWHERE}\n",
        )
        .await
        .unwrap();

        let result = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        })
        .await;

        assert!(matches!(result, Err(DeployError::Config(_))));
    }

    #[tokio::test]
    async fn test_env_sets_intervals_bundle_directory_and_checksums() {
        let temp_dir = TempDir::new().unwrap();
        tokio::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "checksums: [sha512]\ndeployment:\n  sleep_between_retries_seconds: 30\n",
        )
        .await
        .unwrap();

        let config = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            env: env(&[
                ("CENTRAL_PUBLISH_SLEEP_BETWEEN_RETRIES_SECONDS", "2"),
                ("CENTRAL_PUBLISH_STATUS_POLL_INTERVAL_SECONDS", "3"),
                ("CENTRAL_PUBLISH_BUNDLE_DIRECTORY", "${OUT}/bundles"),
                ("CENTRAL_PUBLISH_CHECKSUMS", "md5, sha1"),
                ("OUT", "/tmp/out"),
            ]),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(config.bundle_directory, Some(PathBuf::from("/tmp/out/bundles")));
        assert_eq!(
            config.checksums,
            Some(vec![ChecksumAlgorithm::Md5, ChecksumAlgorithm::Sha1])
        );
        let deployment = config.deployment.unwrap();
        assert_eq!(deployment.sleep_between_retries_seconds, Some(2));
        assert_eq!(deployment.status_poll_interval_seconds, Some(3));
    }

    #[tokio::test]
    async fn test_cli_intervals_and_checksums_override_env() {
        let temp_dir = TempDir::new().unwrap();
        let cli_args = PublishConfig {
            checksums: Some(vec![ChecksumAlgorithm::Sha256]),
            deployment: Some(DeploymentConfig {
                status_poll_interval_seconds: Some(1),
                ..Default::default()
            }),
            ..Default::default()
        };

        let config = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            config_file: None,
            cli_args: Some(cli_args),
            env: env(&[
                ("CENTRAL_PUBLISH_STATUS_POLL_INTERVAL_SECONDS", "10"),
                ("CENTRAL_PUBLISH_SLEEP_BETWEEN_RETRIES_SECONDS", "7"),
                ("CENTRAL_PUBLISH_CHECKSUMS", "md5"),
            ]),
        })
        .await
        .unwrap();

        assert_eq!(config.checksums, Some(vec![ChecksumAlgorithm::Sha256]));
        let deployment = config.deployment.unwrap();
        assert_eq!(deployment.status_poll_interval_seconds, Some(1));
        assert_eq!(deployment.sleep_between_retries_seconds, Some(7));
    }

    #[tokio::test]
    async fn test_invalid_env_checksums_are_an_error() {
        let temp_dir = TempDir::new().unwrap();

        let result = ConfigLoader::load(ConfigLoadOptions {
            project_path: temp_dir.path().to_path_buf(),
            env: env(&[("CENTRAL_PUBLISH_CHECKSUMS", "md5,crc32")]),
            ..Default::default()
        })
        .await;

        assert!(matches!(result, Err(DeployError::Config(_))));
    }
}
