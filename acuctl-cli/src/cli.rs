//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use acuctl_core::config::MAX_WAIT_TIMEOUT_SECS;
use acuctl_core::types::ReportFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "acuctl.toml";

/// acuctl -- command-line client for the vulnerability scanner API.
///
/// Use `acuctl <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "acuctl", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file [default: acuctl.toml, optional].
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "json")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON, one record per step.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a URL end to end: target, scan, report, download, cleanup.
    Auto(AutoArgs),

    /// Manage scan targets.
    Target(TargetArgs),

    /// Manage target groups.
    TargetGroup(TargetGroupArgs),

    /// Manage scanning profiles.
    Profile(ProfileArgs),

    /// Manage scans.
    Scan(ScanArgs),

    /// Manage generated reports.
    Report(ReportArgs),

    /// Manage exports.
    Export(ExportArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- auto ----

/// Run the full scan workflow against one URL.
#[derive(Args, Debug)]
pub struct AutoArgs {
    /// URL to scan.
    #[arg(short = 'u', long)]
    pub url: String,

    /// Scan profile id (default: Full Scan, or `auto.scan_profile_id`).
    #[arg(short = 's', long)]
    pub scan_profile_id: Option<String>,

    /// Report template id (default: Developer, or `auto.report_template_id`).
    #[arg(short = 'r', long)]
    pub report_template_id: Option<String>,

    /// Seconds to wait for the scan and for the report (default: `auto.wait_timeout_secs`).
    #[arg(
        short = 'i',
        long,
        value_parser = clap::value_parser!(u64).range(1..=MAX_WAIT_TIMEOUT_SECS)
    )]
    pub wait_timeout: Option<u64>,

    /// Output directory, or a file name ending in .html, .csv or .json.
    #[arg(short = 'o', long)]
    pub output_path: Option<PathBuf>,

    /// Result format (html, csv).
    #[arg(short = 'f', long, default_value = "html")]
    pub format: ReportFormat,
}

// ---- target ----

/// Manage scan targets.
#[derive(Args, Debug)]
pub struct TargetArgs {
    #[command(subcommand)]
    pub action: TargetAction,
}

#[derive(Subcommand, Debug)]
pub enum TargetAction {
    /// List all targets.
    List,
    /// Show one target.
    Get {
        /// Target id.
        id: String,
    },
    /// Add a target.
    Add {
        /// URL of the target.
        url: String,
        /// Target description.
        #[arg(long, default_value = "")]
        description: String,
        /// Criticality (default: `auto.target_criticality`).
        #[arg(long)]
        criticality: Option<u32>,
        /// Add the target to this group.
        #[arg(short = 'g', long)]
        group: Option<String>,
    },
    /// Delete one or more targets.
    Remove {
        /// Target ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Show a target's scan configuration.
    Config {
        /// Target id.
        id: String,
    },
    /// Replace a target's scan configuration.
    SetConfig {
        /// Target id.
        id: String,
        /// JSON file holding the configuration object.
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
}

// ---- target-group ----

/// Inspect target groups.
#[derive(Args, Debug)]
pub struct TargetGroupArgs {
    #[command(subcommand)]
    pub action: TargetGroupAction,
}

#[derive(Subcommand, Debug)]
pub enum TargetGroupAction {
    /// List all target groups.
    List,
    /// List the targets in a group.
    Targets {
        /// Group id.
        id: String,
    },
    /// Create a target group.
    Add {
        /// Group name.
        name: String,
    },
    /// Delete one or more target groups. Their targets are kept.
    Remove {
        /// Group ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Add targets to a group.
    AddTargets {
        /// Group id.
        id: String,
        /// Target ids.
        #[arg(required = true)]
        target_ids: Vec<String>,
    },
}

// ---- profile ----

/// Inspect scanning profiles.
#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub action: ProfileAction,
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    /// List all scanning profiles.
    List,
    /// Show one scanning profile.
    Get {
        /// Profile id.
        id: String,
    },
    /// Import a scanning profile.
    Add {
        /// JSON file holding the profile, as returned by `profile get`.
        #[arg(short = 'f', long)]
        file: PathBuf,
    },
    /// Delete a scanning profile.
    Remove {
        /// Profile id.
        id: String,
    },
}

// ---- scan ----

/// Manage scans.
#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(subcommand)]
    pub action: ScanAction,
}

#[derive(Subcommand, Debug)]
pub enum ScanAction {
    /// List all scans.
    List,
    /// Show one scan.
    Get {
        /// Scan id.
        id: String,
    },
    /// Start an immediate scan of a target.
    Start {
        /// Target id.
        target_id: String,
        /// Scan profile id (default: `auto.scan_profile_id`).
        #[arg(short = 'p', long)]
        profile_id: Option<String>,
    },
    /// List the result sessions of a scan.
    Results {
        /// Scan id.
        id: String,
    },
    /// Delete a scan.
    Remove {
        /// Scan id.
        id: String,
    },
    /// List the technologies found in one result session.
    Technologies {
        /// Scan id.
        scan_id: String,
        /// Result id (see `scan results`).
        result_id: String,
    },
}

// ---- report ----

/// Manage generated reports.
#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub action: ReportAction,
}

#[derive(Subcommand, Debug)]
pub enum ReportAction {
    /// List all reports.
    List,
    /// Delete one or more reports.
    Remove {
        /// Report ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

// ---- export ----

/// Manage exports.
#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(subcommand)]
    pub action: ExportAction,
}

#[derive(Subcommand, Debug)]
pub enum ExportAction {
    /// List available export types.
    Types,
    /// Show one export.
    Get {
        /// Export id.
        id: String,
    },
    /// Delete one or more exports.
    Remove {
        /// Export ids.
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

// ---- config ----

/// Manage acuctl configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, api, auto).
        #[arg(long)]
        section: Option<String>,
    },
}
