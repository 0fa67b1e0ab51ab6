//! `acuctl config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use acuctl_core::config::AcuctlConfig;

use crate::cli::{ConfigAction, ConfigArgs, DEFAULT_CONFIG_PATH};
use crate::commands::load_config;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

const REDACTED: &str = "***REDACTED***";

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: Option<&Path>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => {
            let path = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));
            let report = validate_report(path).await;
            writer.render(&report)?;
            if !report.valid {
                return Err(CliError::Config("configuration is invalid".to_owned()));
            }
            Ok(())
        }
        ConfigAction::Show { section } => {
            let report = show_report(config_path, section.as_deref()).await?;
            writer.render(&report)?;
            Ok(())
        }
    }
}

/// Loads and validates the configuration file, collecting the error if any.
///
/// The file must exist, even at the default path.
pub async fn validate_report(config_path: &Path) -> ConfigValidationReport {
    info!(path = %config_path.display(), "validating configuration");

    let errors = match AcuctlConfig::load(config_path).await {
        Ok(_) => Vec::new(),
        Err(e) => vec![e.to_string()],
    };

    ConfigValidationReport {
        source: config_path.display().to_string(),
        valid: errors.is_empty(),
        errors,
    }
}

/// Builds the effective configuration (file + env overrides + defaults).
///
/// The API key is redacted.
///
/// # Errors
///
/// Returns `CliError::Core` if loading fails or `CliError::Command` if the
/// section name is unknown.
pub async fn show_report(
    config_path: Option<&Path>,
    section: Option<&str>,
) -> Result<ConfigReport, CliError> {
    let source = config_path
        .unwrap_or(Path::new(DEFAULT_CONFIG_PATH))
        .display()
        .to_string();
    info!(path = %source, "loading configuration");

    let mut config = load_config(config_path).await?;
    redact_credentials(&mut config);

    let (config_json, config_toml) = match section {
        None => render_section(&config)?,
        Some("general") => render_section(&config.general)?,
        Some("api") => render_section(&config.api)?,
        Some("auto") => render_section(&config.auto)?,
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {other} (expected: general, api, auto)"
            )));
        }
    };

    Ok(ConfigReport {
        source,
        section: section.map(str::to_owned),
        config: config_json,
        config_toml,
    })
}

fn render_section<T: Serialize>(value: &T) -> Result<(serde_json::Value, String), CliError> {
    let json = serde_json::to_value(value)?;
    let toml = toml::to_string_pretty(value)
        .unwrap_or_else(|e| format!("(serialization error: {})", e));
    Ok((json, toml))
}

/// Replaces a non-empty API key with a placeholder.
fn redact_credentials(config: &mut AcuctlConfig) {
    if !config.api.api_key.is_empty() {
        config.api.api_key = REDACTED.to_owned();
    }
}

/// Configuration display report.
///
/// JSON output carries the settings as an object; text output prints the
/// same settings as TOML.
#[derive(Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Settings with the API key redacted
    pub config: serde_json::Value,
    /// Same settings rendered as TOML
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    /// Configuration file path
    pub source: String,
    /// Whether the configuration is valid
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}
