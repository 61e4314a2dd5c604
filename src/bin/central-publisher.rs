//! Central Publisher CLI
//!
//! Publishes a directory of Maven artifacts through the Central Portal

use anyhow::{Context, Result};
use central_publisher::security::PortalCredentials;
use central_publisher::{
    ChecksumAlgorithm, ConfigLoadOptions, ConfigLoader, DeployError, DeployOptions, DeployResult, Deployer,
    DeploymentConfig, FileScanner, HttpArtifactProbe, Interrupt, PortalClient, PublishConfig,
    PublishingType, Settings,
};
use clap::{Args, Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Publish Maven artifacts to the Central Portal
#[derive(Parser)]
#[command(name = "central-publisher")]
#[command(version)]
#[command(about = "Publish Maven artifacts to the Central Portal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bundle, upload and await a deployment
    Deploy(ConfigArgs),

    /// Validate the configuration and list the files to publish
    Check(ConfigArgs),
}

/// Options overriding the configuration file and environment
#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// Project path searched for .central-publish.yaml (defaults to current directory)
    #[arg(value_name = "PROJECT_PATH")]
    project_path: Option<PathBuf>,

    /// Explicit configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the staged artifacts
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// AUTOMATIC or USER_MANAGED
    #[arg(short, long)]
    publishing_type: Option<PublishingType>,

    /// Deployment name shown on the portal
    #[arg(short, long)]
    name: Option<String>,

    /// Drop failed deployments (true|false)
    #[arg(long)]
    drop_on_failure: Option<bool>,

    /// Treat a failure made only of "already exists" errors as success (true|false)
    #[arg(long)]
    ignore_already_exists_error: Option<bool>,

    /// group:artifact:version to await on Maven Central
    #[arg(long)]
    await_artifact: Option<String>,

    /// Upper bound in seconds for awaiting the artifact
    #[arg(long)]
    timeout_seconds: Option<u64>,

    /// Central Portal base uri
    #[arg(long)]
    portal_base_uri: Option<String>,

    /// Maven repository probed when awaiting the artifact
    #[arg(long)]
    maven_central_base_uri: Option<String>,

    /// Pause in seconds between artifact probes
    #[arg(long)]
    sleep_between_retries_seconds: Option<u64>,

    /// Pause in seconds between deployment status queries
    #[arg(long)]
    status_poll_interval_seconds: Option<u64>,

    /// Where the bundle archive is written and kept
    #[arg(long)]
    bundle_directory: Option<PathBuf>,

    /// Checksum files to create, e.g. md5,sha1
    #[arg(long, value_delimiter = ',')]
    checksums: Option<Vec<ChecksumAlgorithm>>,
}

impl ConfigArgs {
    fn to_config(&self) -> PublishConfig {
        let deployment = DeploymentConfig {
            name: self.name.clone(),
            publishing_type: self.publishing_type,
            drop_on_failure: self.drop_on_failure,
            ignore_already_exists_error: self.ignore_already_exists_error,
            await_artifact: self.await_artifact.clone(),
            timeout_seconds: self.timeout_seconds,
            sleep_between_retries_seconds: self.sleep_between_retries_seconds,
            status_poll_interval_seconds: self.status_poll_interval_seconds,
        };

        PublishConfig {
            directory: self.directory.clone(),
            portal_base_uri: self.portal_base_uri.clone(),
            maven_central_base_uri: self.maven_central_base_uri.clone(),
            bundle_directory: self.bundle_directory.clone(),
            checksums: self.checksums.clone(),
            deployment: Some(deployment),
        }
    }

    async fn load_settings(&self, env: &HashMap<String, String>) -> Result<Settings> {
        let project_path = self
            .project_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));

        let config = ConfigLoader::load(ConfigLoadOptions {
            project_path,
            config_file: self.config.clone(),
            cli_args: Some(self.to_config()),
            env: env.clone(),
        })
        .await?;

        Ok(config.resolve()?)
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let result = run().await;

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{}", e);
            if let Some(deploy_error) = e.downcast_ref::<DeployError>() {
                eprintln!("   code: {}", deploy_error.code());
                for action in deploy_error.suggested_actions() {
                    eprintln!("   → {}", action);
                }
            }
            process::exit(1);
        }
    }
}

/// Structured logging, adjusted for GitHub Actions runners
fn init_tracing() {
    let on_github_actions = std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true");
    let step_debug = std::env::var("ACTIONS_STEP_DEBUG").is_ok_and(|v| v == "true");
    let default_level = if step_debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_ansi(!on_github_actions)
        .with_target(false)
        .init();
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let env: HashMap<String, String> = std::env::vars().collect();

    match cli.command {
        Commands::Deploy(args) => deploy_command(&args, &env).await,
        Commands::Check(args) => check_command(&args, &env).await,
    }
}

async fn deploy_command(args: &ConfigArgs, env: &HashMap<String, String>) -> Result<i32> {
    println!("\n📦 central-publisher\n");

    let settings = args.load_settings(env).await?;
    let credentials = PortalCredentials::from_vars(env)?;
    tracing::info!(
        user = %credentials.masked_username(),
        portal = %settings.portal_base_uri,
        "using Central Portal credentials"
    );

    let portal = PortalClient::new(&settings.portal_base_uri, &credentials)?;
    let probe = HttpArtifactProbe::new(&settings.maven_central_base_uri)?;
    let deployer = Deployer::new(
        &settings,
        Arc::new(portal),
        Arc::new(probe),
        Interrupt::ctrl_c(),
    );

    match deployer.deploy().await {
        Ok(DeployResult::Success) => {
            println!("\n✅ Deployment completed successfully!");
            Ok(0)
        }
        Ok(DeployResult::Failure) => {
            println!("\n❌ Deployment failed");
            Ok(1)
        }
        Err(DeployError::Api { status, body }) => Err(DeployError::Api {
            status,
            body: credentials.redact(&body),
        }
        .into()),
        Err(e) => Err(e.into()),
    }
}

async fn check_command(args: &ConfigArgs, env: &HashMap<String, String>) -> Result<i32> {
    println!("\n🔍 Checking deployment configuration...\n");

    let settings = args.load_settings(env).await?;
    DeployOptions::from(&settings).validate()?;

    println!("Directory:          {}", settings.directory.display());
    println!("Portal:             {}", settings.portal_base_uri);
    println!("Publishing type:    {}", settings.publishing_type);
    if let Some(name) = &settings.deployment_name {
        println!("Deployment name:    {}", name);
    }
    println!("Drop on failure:    {}", settings.drop_on_failure);
    println!(
        "Ignore duplicates:  {}",
        settings.ignore_already_exists_error
    );
    match &settings.await_artifact {
        Some(coordinates) => println!(
            "Await artifact:     {} (timeout {:?})",
            coordinates, settings.timeout
        ),
        None => println!("Await artifact:     -"),
    }
    let checksums: Vec<&str> = settings.checksums.iter().map(|a| a.extension()).collect();
    println!("Checksums:          {}", checksums.join(", "));
    match &settings.bundle_directory {
        Some(directory) => println!("Bundle directory:   {}", directory.display()),
        None => println!("Bundle directory:   temporary, removed after upload"),
    }

    let mut ready = true;

    let files = FileScanner::new()
        .scan(&settings.directory)
        .with_context(|| format!("Cannot scan {}", settings.directory.display()))?;
    if files.is_empty() {
        println!("\n❌ No files found in {}", settings.directory.display());
        ready = false;
    } else {
        println!("\n✅ {} files found", files.len());
    }

    match PortalCredentials::from_vars(env) {
        Ok(credentials) => {
            PortalClient::new(&settings.portal_base_uri, &credentials)?;
            println!("✅ Credentials found ({})", credentials.masked_username());
        }
        Err(e) => {
            println!("⚠️  {}", e);
            ready = false;
        }
    }
    HttpArtifactProbe::new(&settings.maven_central_base_uri)?;

    if ready {
        println!("\n✅ Ready to deploy");
        Ok(0)
    } else {
        println!("\n❌ Not ready to deploy");
        Ok(1)
    }
}
