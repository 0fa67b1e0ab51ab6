//! Output formatting abstraction for text vs JSON rendering
//!
//! All subcommand output flows through [`OutputWriter`] which handles format switching.
//! This keeps format-specific logic out of command handlers entirely.

use std::io::Write;

use acuctl_auto::{AutoSummary, CleanupOutcome, CleanupReport, FailureRecord, StepRecord};
use colored::Colorize;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Abstraction for writing CLI output in different formats.
///
/// Subcommand handlers call `writer.render(&payload)` where `payload`
/// implements both `Serialize` (for JSON) and `Render` (for text).
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    /// Create a new output writer with the specified format.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use acuctl_cli::output::OutputWriter;
    /// use acuctl_cli::cli::OutputFormat;
    ///
    /// let writer = OutputWriter::new(OutputFormat::Text);
    /// ```
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(payload, &mut handle)
    }

    /// Render a payload to an arbitrary writer.
    ///
    /// For `Text` format, delegates to `Render::render_text()`.
    /// For `Json` format, serialises via `serde_json`.
    pub fn render_to<T: Render + Serialize>(
        &self,
        payload: &T,
        w: &mut dyn Write,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => {
                payload.render_text(w)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Trait for human-readable text rendering.
///
/// Implemented by every CLI output payload alongside `serde::Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

/// Raw response of a resource command.
///
/// Serialised as-is; text output is the same JSON, pretty-printed.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct ApiResult(pub serde_json::Value);

impl Render for ApiResult {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let pretty = serde_json::to_string_pretty(&self.0).map_err(std::io::Error::other)?;
        writeln!(w, "{pretty}")
    }
}

impl Render for StepRecord {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            w,
            "{} {} {}={}",
            "✓".green(),
            self.step.bold(),
            self.resource,
            self.resource_id
        )
    }
}

impl Render for AutoSummary {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{} {}", "SUCCESS".green().bold(), self.message)?;
        writeln!(w, "  Run:    {}", self.run_id)?;
        writeln!(w, "  Target: {}", self.target_id)?;
        writeln!(w, "  Scan:   {}", self.scan_id)?;
        writeln!(w, "  {:<7} {}", format!("{}:", self.format), self.report_id)?;
        if self.files.is_empty() {
            writeln!(w, "  Files:  {}", "(none)".dimmed())?;
        } else {
            writeln!(w, "  Files:")?;
            for file in &self.files {
                writeln!(w, "    {}", file.display())?;
            }
        }
        render_cleanup(&self.cleanup, w)
    }
}

impl Render for FailureRecord {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{} at '{}'", "FAILED".red().bold(), self.step)?;
        writeln!(w, "  Error: {}", self.error.red())?;
        writeln!(w, "  Run:   {}", self.run_id)?;
        let ids = [
            ("Target", &self.target_id),
            ("Scan", &self.scan_id),
            ("Report", &self.report_id),
        ];
        for (label, id) in ids {
            if let Some(id) = id {
                writeln!(w, "  {label}: {id}")?;
            }
        }
        render_cleanup(&self.cleanup, w)
    }
}

fn render_cleanup(cleanup: &CleanupReport, w: &mut dyn Write) -> std::io::Result<()> {
    if cleanup.actions.is_empty() {
        return Ok(());
    }
    writeln!(w, "  Cleanup:")?;
    for action in &cleanup.actions {
        let outcome = match &action.outcome {
            CleanupOutcome::Deleted { status } => {
                format!("deleted ({status})").green()
            }
            CleanupOutcome::AlreadyGone => "already gone".yellow(),
            CleanupOutcome::Failed { error } => format!("failed: {error}").red(),
        };
        writeln!(w, "    {} {}: {}", action.resource, action.id, outcome)?;
    }
    Ok(())
}
