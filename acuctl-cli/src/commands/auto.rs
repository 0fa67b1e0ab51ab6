//! `acuctl auto` command handler

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use acuctl_auto::{AutoRequest, AutoWorkflow, ProgressReporter, StepRecord, WorkflowSettings};
use acuctl_core::config::AutoConfig;
use tracing::{info, warn};

use crate::cli::AutoArgs;
use crate::commands::Session;
use crate::error::CliError;
use crate::output::OutputWriter;

/// Prints every step record as soon as the step completes.
struct StepPrinter<'a> {
    writer: &'a OutputWriter,
}

impl ProgressReporter for StepPrinter<'_> {
    fn step_completed(&mut self, record: &StepRecord) {
        if let Err(e) = self.writer.render(record) {
            warn!(error = %e, step = record.step, "failed to print step record");
        }
    }
}

/// Execute the `auto` command.
///
/// Prints one record per completed step, then either the success summary or
/// the failure record. A failed run returns [`CliError::WorkflowFailed`].
pub async fn execute(
    args: AutoArgs,
    session: Session,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let request = build_request(args, &session.config.auto);
    let settings = WorkflowSettings::from_config(&session.config.auto);

    info!(
        url = %request.target_url,
        format = %request.format,
        timeout_secs = request.wait_timeout.as_secs(),
        "starting auto workflow"
    );

    let workflow = AutoWorkflow::new(Arc::new(session.client), settings);
    let mut printer = StepPrinter { writer };

    match workflow.run(&request, &mut printer).await {
        Ok(summary) => {
            writer.render(&summary)?;
            Ok(())
        }
        Err(failure) => {
            writer.render(&failure.record())?;
            Err(CliError::WorkflowFailed(failure.to_string()))
        }
    }
}

/// Builds the workflow input, falling back to the `[auto]` section.
fn build_request(args: AutoArgs, config: &AutoConfig) -> AutoRequest {
    let wait_timeout = args
        .wait_timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.wait_timeout());

    AutoRequest {
        target_url: args.url,
        scan_profile_id: args.scan_profile_id,
        report_template_id: args.report_template_id,
        wait_timeout,
        output_path: args.output_path.unwrap_or_else(PathBuf::new),
        format: args.format,
    }
}
