//! Command handlers -- one module per subcommand

pub mod auto;
pub mod config;
pub mod profile;
pub mod report;
pub mod scan;
pub mod target;

use std::path::Path;

use acuctl_auto::{ApiClient, ApiResponse};
use acuctl_core::config::AcuctlConfig;
use serde_json::Value;
use tracing::warn;

use crate::cli::{Cli, Commands, DEFAULT_CONFIG_PATH};
use crate::error::CliError;
use crate::logging;
use crate::output::{ApiResult, OutputWriter};

/// Loaded configuration plus an API client built from it.
pub struct Session {
    pub config: AcuctlConfig,
    pub client: ApiClient,
}

impl Session {
    /// Loads config, initialises logging and builds the API client.
    async fn open(config_path: Option<&Path>, log_level: Option<&str>) -> Result<Self, CliError> {
        let config = load_config(config_path).await?;
        if let Err(e) = logging::init_tracing(&config.general, log_level) {
            eprintln!("warning: {e}");
        }
        acuctl_core::metrics::describe_all();
        let client = ApiClient::from_config(&config.api)?;
        Ok(Self { config, client })
    }
}

/// Loads the configuration.
///
/// An explicit path must exist; the default `acuctl.toml` is optional.
pub async fn load_config(config_path: Option<&Path>) -> Result<AcuctlConfig, CliError> {
    let config = match config_path {
        Some(path) => AcuctlConfig::load(path).await?,
        None => AcuctlConfig::load_or_default(DEFAULT_CONFIG_PATH).await?,
    };
    Ok(config)
}

/// Dispatches a parsed command line.
pub async fn run(cli: Cli, writer: &OutputWriter) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();
    let log_level = cli.log_level.as_deref();

    match cli.command {
        Commands::Config(args) => config::execute(args, config_path, writer).await,
        Commands::Auto(args) => {
            let session = Session::open(config_path, log_level).await?;
            auto::execute(args, session, writer).await
        }
        Commands::Target(args) => {
            let session = Session::open(config_path, log_level).await?;
            target::execute(args, &session, writer).await
        }
        Commands::TargetGroup(args) => {
            let session = Session::open(config_path, log_level).await?;
            target::execute_group(args, &session.client, writer).await
        }
        Commands::Profile(args) => {
            let session = Session::open(config_path, log_level).await?;
            profile::execute(args, &session.client, writer).await
        }
        Commands::Scan(args) => {
            let session = Session::open(config_path, log_level).await?;
            scan::execute(args, &session, writer).await
        }
        Commands::Report(args) => {
            let session = Session::open(config_path, log_level).await?;
            report::execute(args, &session.client, writer).await
        }
        Commands::Export(args) => {
            let session = Session::open(config_path, log_level).await?;
            report::execute_export(args, &session.client, writer).await
        }
    }
}

/// Prints a raw API response and fails the command on a non-2xx status.
pub(crate) fn emit(
    response: ApiResponse,
    operation: &str,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let status = response.status;
    let success = response.is_success();
    writer.render(&ApiResult(response.into_value()))?;

    if !success {
        warn!(operation, status, "request rejected");
        return Err(CliError::Command(format!(
            "{operation} failed with HTTP {status}"
        )));
    }
    Ok(())
}

/// Reads a JSON object from `path` for use as a request body.
pub(crate) async fn read_json_body(path: &Path) -> Result<Value, CliError> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        CliError::Command(format!("failed to read {}: {e}", path.display()))
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|e| {
        CliError::Command(format!("{} is not valid JSON: {e}", path.display()))
    })?;
    if !value.is_object() {
        return Err(CliError::Command(format!(
            "{} must contain a JSON object",
            path.display()
        )));
    }
    Ok(value)
}
