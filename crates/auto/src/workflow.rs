//! Auto workflow orchestrator.
//!
//! [`AutoWorkflow::run`] drives one end-to-end run: add a target, start a
//! scan, wait for it, generate an HTML report or CSV export, wait for that,
//! download the files, and delete everything it created. Every forward step
//! is a single client or poller call; each success advances the
//! [`WorkflowState`] and emits a [`StepRecord`] to the [`ProgressReporter`].
//!
//! Cleanup runs after success and after any failure. It deletes the recorded
//! report/export, then the scan, then the target, continuing past individual
//! delete failures. A failed run returns the error that stopped it, never a
//! cleanup error.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use acuctl_core::config::AutoConfig;
use acuctl_core::metrics as m;
use acuctl_core::types::{
    AddTargetsRequest, CreateRequest, NewExport, NewReport, NewScan, NewTarget, ReportFormat,
    ResourceKind,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::client::ResourceClient;
use crate::download::download_all;
use crate::error::WorkflowError;
use crate::poller::{PollSettings, TerminalStates, poll_until_terminal};

/// Progress of a run. Each successful step moves one state forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Init,
    TargetCreated,
    TargetVerified,
    ScanCreated,
    ScanVerified,
    ScanCompleted,
    ReportOrExportCreated,
    ReportOrExportCompleted,
    FilesDownloaded,
    CleanedUp,
    Done,
}

/// Forward steps of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ValidateInput,
    AddTarget,
    VerifyTarget,
    StartScan,
    VerifyScan,
    WaitForScan,
    GenerateReport,
    CreateExport,
    WaitForReport,
    WaitForExport,
    DownloadFiles,
}

impl Step {
    /// Label printed in progress records.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ValidateInput => "0. Validate input",
            Self::AddTarget => "1. Add target",
            Self::VerifyTarget => "2. Check target exists",
            Self::StartScan => "3. Start scan",
            Self::VerifyScan => "4. Check scan exists",
            Self::WaitForScan => "5. Wait for scan completion",
            Self::GenerateReport => "6. Generate report",
            Self::CreateExport => "6. Create export",
            Self::WaitForReport => "7. Wait for report generation",
            Self::WaitForExport => "7. Wait for export completion",
            Self::DownloadFiles => "8. Download files",
        }
    }

    /// Low-cardinality name for the metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidateInput => "validate_input",
            Self::AddTarget => "add_target",
            Self::VerifyTarget => "verify_target",
            Self::StartScan => "start_scan",
            Self::VerifyScan => "verify_scan",
            Self::WaitForScan => "wait_for_scan",
            Self::GenerateReport => "generate_report",
            Self::CreateExport => "create_export",
            Self::WaitForReport => "wait_for_report",
            Self::WaitForExport => "wait_for_export",
            Self::DownloadFiles => "download_files",
        }
    }

    /// State reached when this step succeeds.
    fn reached(&self) -> WorkflowState {
        match self {
            Self::ValidateInput => WorkflowState::Init,
            Self::AddTarget => WorkflowState::TargetCreated,
            Self::VerifyTarget => WorkflowState::TargetVerified,
            Self::StartScan => WorkflowState::ScanCreated,
            Self::VerifyScan => WorkflowState::ScanVerified,
            Self::WaitForScan => WorkflowState::ScanCompleted,
            Self::GenerateReport | Self::CreateExport => WorkflowState::ReportOrExportCreated,
            Self::WaitForReport | Self::WaitForExport => WorkflowState::ReportOrExportCompleted,
            Self::DownloadFiles => WorkflowState::FilesDownloaded,
        }
    }
}

/// Input of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoRequest {
    /// URL to scan
    pub target_url: String,
    /// Scan profile; falls back to the configured default when `None` or blank
    pub scan_profile_id: Option<String>,
    /// Report template; falls back to the configured default when `None` or blank
    pub report_template_id: Option<String>,
    /// Budget for each wait phase (scan, then report/export)
    pub wait_timeout: Duration,
    /// Output directory or explicit file name
    pub output_path: PathBuf,
    /// HTML report or CSV export
    pub format: ReportFormat,
}

/// Per-run settings taken from the `[auto]` config section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub default_scan_profile_id: String,
    pub default_report_template_id: String,
    pub export_type_id: String,
    pub scan_poll_interval: Duration,
    pub report_poll_interval: Duration,
    pub target_criticality: u32,
    pub report_description: String,
}

impl WorkflowSettings {
    /// Builds settings from the `[auto]` config section.
    pub fn from_config(config: &AutoConfig) -> Self {
        Self {
            default_scan_profile_id: config.scan_profile_id.clone(),
            default_report_template_id: config.report_template_id.clone(),
            export_type_id: config.export_type_id.clone(),
            scan_poll_interval: config.scan_poll_interval(),
            report_poll_interval: config.report_poll_interval(),
            target_criticality: config.target_criticality,
            report_description: config.report_description.clone(),
        }
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from_config(&AutoConfig::default())
    }
}

/// One progress record, emitted after each successful step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub run_id: Uuid,
    pub step: &'static str,
    pub resource: ResourceKind,
    pub resource_id: String,
    pub status: &'static str,
}

/// Receives progress records as the run advances.
pub trait ProgressReporter: Send {
    fn step_completed(&mut self, record: &StepRecord);
}

impl ProgressReporter for Vec<StepRecord> {
    fn step_completed(&mut self, record: &StepRecord) {
        self.push(record.clone());
    }
}

/// Result of deleting one resource during cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CleanupOutcome {
    /// The delete call returned 2xx.
    Deleted { status: u16 },
    /// The delete call returned 404.
    AlreadyGone,
    /// The delete call failed for any other reason.
    Failed { error: String },
}

impl CleanupOutcome {
    fn result_label(&self) -> &'static str {
        match self {
            Self::Deleted { .. } => "success",
            Self::AlreadyGone => "already_gone",
            Self::Failed { .. } => "failure",
        }
    }
}

/// One cleanup deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupAction {
    pub resource: ResourceKind,
    pub id: String,
    pub outcome: CleanupOutcome,
}

/// Every deletion attempted during cleanup, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CleanupReport {
    pub actions: Vec<CleanupAction>,
}

impl CleanupReport {
    /// Deletions that failed (404 is not a failure).
    pub fn failures(&self) -> impl Iterator<Item = &CleanupAction> {
        self.actions
            .iter()
            .filter(|a| matches!(a.outcome, CleanupOutcome::Failed { .. }))
    }

    /// Whether every recorded resource is gone.
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Final record of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoSummary {
    pub status: &'static str,
    pub message: &'static str,
    pub run_id: Uuid,
    pub target_id: String,
    pub scan_id: String,
    pub report_id: String,
    pub format: ReportFormat,
    /// Final state, `done` for every returned summary
    pub state: WorkflowState,
    pub files: Vec<PathBuf>,
    pub cleanup: CleanupReport,
}

/// A run that stopped before completing.
///
/// Holds the error from the step that failed and the cleanup performed
/// afterwards.
#[derive(Debug, thiserror::Error)]
#[error("auto workflow failed at '{}': {error}", .step.label())]
pub struct WorkflowFailure {
    pub run_id: Uuid,
    pub step: Step,
    /// Last state reached before the failure
    pub state: WorkflowState,
    #[source]
    pub error: WorkflowError,
    pub target_id: Option<String>,
    pub scan_id: Option<String>,
    pub report_id: Option<String>,
    pub cleanup: CleanupReport,
}

/// Serializable form of a [`WorkflowFailure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub status: &'static str,
    pub run_id: Uuid,
    pub step: &'static str,
    pub state: WorkflowState,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    pub cleanup: CleanupReport,
}

impl WorkflowFailure {
    /// Record printed for a failed run.
    pub fn record(&self) -> FailureRecord {
        FailureRecord {
            status: "failed",
            run_id: self.run_id,
            step: self.step.label(),
            state: self.state,
            error: self.error.to_string(),
            target_id: self.target_id.clone(),
            scan_id: self.scan_id.clone(),
            report_id: self.report_id.clone(),
            cleanup: self.cleanup.clone(),
        }
    }
}

/// Process-local state of one run.
#[derive(Debug)]
struct RunContext {
    run_id: Uuid,
    state: WorkflowState,
    format: ReportFormat,
    target_id: Option<String>,
    scan_id: Option<String>,
    artifact_id: Option<String>,
    files: Vec<PathBuf>,
}

impl RunContext {
    fn new(format: ReportFormat) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: WorkflowState::Init,
            format,
            target_id: None,
            scan_id: None,
            artifact_id: None,
            files: Vec::new(),
        }
    }

    /// Recorded resources in deletion order: report/export, scan, target.
    fn created_resources(&self) -> Vec<(ResourceKind, String)> {
        let artifact = self
            .artifact_id
            .clone()
            .map(|id| (self.format.artifact_kind(), id));
        let scan = self.scan_id.clone().map(|id| (ResourceKind::Scan, id));
        let target = self.target_id.clone().map(|id| (ResourceKind::Target, id));
        [artifact, scan, target].into_iter().flatten().collect()
    }

    fn enter(&mut self, state: WorkflowState) {
        self.state = state;
        debug!(run_id = %self.run_id, state = ?state, "state changed");
    }

    fn complete(
        &mut self,
        reporter: &mut dyn ProgressReporter,
        step: Step,
        resource: ResourceKind,
        resource_id: &str,
    ) {
        self.state = step.reached();
        metrics::counter!(m::AUTO_STEPS_COMPLETED_TOTAL, m::LABEL_STEP => step.as_str())
            .increment(1);
        info!(
            run_id = %self.run_id,
            step = step.label(),
            resource = %resource,
            resource_id,
            state = ?self.state,
            "step completed"
        );
        reporter.step_completed(&StepRecord {
            run_id: self.run_id,
            step: step.label(),
            resource,
            resource_id: resource_id.to_owned(),
            status: "completed",
        });
    }
}

fn at(step: Step) -> impl FnOnce(WorkflowError) -> (Step, WorkflowError) {
    move |error| (step, error)
}

fn or_default<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

fn validate_request(request: &AutoRequest) -> Result<(), WorkflowError> {
    if request.target_url.trim().is_empty() {
        return Err(WorkflowError::Validation(
            "target URL is required".to_owned(),
        ));
    }
    Ok(())
}

/// Runs the auto workflow against a [`ResourceClient`].
pub struct AutoWorkflow<C: ResourceClient> {
    client: Arc<C>,
    settings: WorkflowSettings,
}

impl<C: ResourceClient> AutoWorkflow<C> {
    pub fn new(client: Arc<C>, settings: WorkflowSettings) -> Self {
        Self { client, settings }
    }

    /// Executes one run and always cleans up what it created.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowFailure`] naming the failed step, the last state
    /// reached, the triggering error and the cleanup actions.
    pub async fn run(
        &self,
        request: &AutoRequest,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<AutoSummary, WorkflowFailure> {
        let started = Instant::now();
        let mut ctx = RunContext::new(request.format);
        info!(
            run_id = %ctx.run_id,
            target_url = %request.target_url,
            format = %request.format,
            wait_timeout_secs = request.wait_timeout.as_secs(),
            "auto workflow started"
        );

        let result = match validate_request(request) {
            Ok(()) => self.advance(request, &mut ctx, reporter).await,
            Err(e) => Err((Step::ValidateInput, e)),
        };

        let cleanup = self.cleanup(&ctx).await;
        metrics::histogram!(m::AUTO_RUN_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        match result {
            Ok(()) => {
                ctx.enter(WorkflowState::CleanedUp);
                if !cleanup.is_clean() {
                    warn!(run_id = %ctx.run_id, "some resources could not be deleted");
                }
                ctx.enter(WorkflowState::Done);
                metrics::counter!(m::AUTO_RUNS_TOTAL, m::LABEL_RESULT => "success").increment(1);
                info!(
                    run_id = %ctx.run_id,
                    files = ctx.files.len(),
                    elapsed_secs = started.elapsed().as_secs(),
                    "auto workflow completed"
                );
                Ok(AutoSummary {
                    status: "success",
                    message: "Auto process completed successfully",
                    run_id: ctx.run_id,
                    target_id: ctx.target_id.unwrap_or_default(),
                    scan_id: ctx.scan_id.unwrap_or_default(),
                    report_id: ctx.artifact_id.unwrap_or_default(),
                    format: ctx.format,
                    state: ctx.state,
                    files: ctx.files,
                    cleanup,
                })
            }
            Err((step, error)) => {
                metrics::counter!(m::AUTO_RUNS_TOTAL, m::LABEL_RESULT => "failure").increment(1);
                error!(
                    run_id = %ctx.run_id,
                    step = step.label(),
                    state = ?ctx.state,
                    error = %error,
                    "auto workflow failed"
                );
                Err(WorkflowFailure {
                    run_id: ctx.run_id,
                    step,
                    state: ctx.state,
                    error,
                    target_id: ctx.target_id,
                    scan_id: ctx.scan_id,
                    report_id: ctx.artifact_id,
                    cleanup,
                })
            }
        }
    }

    async fn advance(
        &self,
        request: &AutoRequest,
        ctx: &mut RunContext,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<(), (Step, WorkflowError)> {
        let client = self.client.as_ref();
        let settings = &self.settings;

        // target
        let target = AddTargetsRequest::single(NewTarget::new(
            request.target_url.trim(),
            settings.target_criticality,
        ));
        let target_id = client
            .create(&CreateRequest::Target(target))
            .await
            .map_err(at(Step::AddTarget))?;
        ctx.target_id = Some(target_id.clone());
        ctx.complete(reporter, Step::AddTarget, ResourceKind::Target, &target_id);

        client
            .ensure_exists(ResourceKind::Target, &target_id)
            .await
            .map_err(at(Step::VerifyTarget))?;
        ctx.complete(reporter, Step::VerifyTarget, ResourceKind::Target, &target_id);

        // scan
        let profile_id = or_default(
            request.scan_profile_id.as_deref(),
            &settings.default_scan_profile_id,
        );
        let scan_id = client
            .create(&CreateRequest::Scan(NewScan::immediate(
                target_id.as_str(),
                profile_id,
            )))
            .await
            .map_err(at(Step::StartScan))?;
        ctx.scan_id = Some(scan_id.clone());
        ctx.complete(reporter, Step::StartScan, ResourceKind::Scan, &scan_id);

        client
            .ensure_exists(ResourceKind::Scan, &scan_id)
            .await
            .map_err(at(Step::VerifyScan))?;
        ctx.complete(reporter, Step::VerifyScan, ResourceKind::Scan, &scan_id);

        poll_until_terminal(
            client,
            ResourceKind::Scan,
            &scan_id,
            TerminalStates::for_kind(ResourceKind::Scan),
            PollSettings {
                interval: settings.scan_poll_interval,
                timeout: request.wait_timeout,
            },
        )
        .await
        .and_then(|outcome| outcome.into_result(ResourceKind::Scan, &scan_id, request.wait_timeout))
        .map_err(at(Step::WaitForScan))?;
        ctx.complete(reporter, Step::WaitForScan, ResourceKind::Scan, &scan_id);

        // report or export
        let kind = request.format.artifact_kind();
        let (create_step, wait_step, create) = match request.format {
            ReportFormat::Csv => (
                Step::CreateExport,
                Step::WaitForExport,
                CreateRequest::Export(NewExport::for_scan(
                    settings.export_type_id.as_str(),
                    scan_id.as_str(),
                )),
            ),
            ReportFormat::Html => {
                let template_id = or_default(
                    request.report_template_id.as_deref(),
                    &settings.default_report_template_id,
                );
                (
                    Step::GenerateReport,
                    Step::WaitForReport,
                    CreateRequest::Report(NewReport::for_scan(
                        template_id,
                        settings.report_description.as_str(),
                        scan_id.as_str(),
                    )),
                )
            }
        };
        let artifact_id = client.create(&create).await.map_err(at(create_step))?;
        ctx.artifact_id = Some(artifact_id.clone());
        ctx.complete(reporter, create_step, kind, &artifact_id);

        let status = poll_until_terminal(
            client,
            kind,
            &artifact_id,
            TerminalStates::for_kind(kind),
            PollSettings {
                interval: settings.report_poll_interval,
                timeout: request.wait_timeout,
            },
        )
        .await
        .and_then(|outcome| outcome.into_result(kind, &artifact_id, request.wait_timeout))
        .map_err(at(wait_step))?;

        let total = status.download.len();
        let links: Vec<String> = status
            .download
            .into_iter()
            .filter(|link| request.format.matches_link(link))
            .collect();
        debug!(
            run_id = %ctx.run_id,
            total,
            kept = links.len(),
            format = %request.format,
            "filtered download links"
        );
        ctx.complete(reporter, wait_step, kind, &artifact_id);

        // download
        let files = download_all(client, &links, &request.output_path)
            .await
            .map_err(at(Step::DownloadFiles))?;
        ctx.files = files;
        ctx.complete(reporter, Step::DownloadFiles, kind, &artifact_id);

        Ok(())
    }

    /// Deletes recorded resources: report/export, scan, target.
    async fn cleanup(&self, ctx: &RunContext) -> CleanupReport {
        let mut report = CleanupReport::default();

        for (kind, id) in ctx.created_resources() {
            let outcome = match self.client.delete(kind, &id).await {
                Ok(status) => {
                    info!(run_id = %ctx.run_id, resource = %kind, id = %id, status, "resource deleted");
                    CleanupOutcome::Deleted { status }
                }
                Err(e) if e.is_already_deleted() => {
                    warn!(run_id = %ctx.run_id, resource = %kind, id = %id, "resource already gone");
                    CleanupOutcome::AlreadyGone
                }
                Err(e) => {
                    error!(
                        run_id = %ctx.run_id,
                        resource = %kind,
                        id = %id,
                        error = %e,
                        "failed to delete resource"
                    );
                    CleanupOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            metrics::counter!(
                m::AUTO_CLEANUP_DELETES_TOTAL,
                m::LABEL_RESOURCE => kind.as_str(),
                m::LABEL_RESULT => outcome.result_label()
            )
            .increment(1);
            report.actions.push(CleanupAction {
                resource: kind,
                id,
                outcome,
            });
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockCall, MockResourceClient};
    use acuctl_core::types::ResourceStatus;

    fn request(output: PathBuf, format: ReportFormat) -> AutoRequest {
        AutoRequest {
            target_url: "https://example.com".to_owned(),
            scan_profile_id: None,
            report_template_id: None,
            wait_timeout: Duration::from_secs(800),
            output_path: output,
            format,
        }
    }

    async fn run_with(
        mock: MockResourceClient,
        request: &AutoRequest,
    ) -> (
        Result<AutoSummary, WorkflowFailure>,
        Vec<StepRecord>,
        Arc<MockResourceClient>,
    ) {
        let mock = Arc::new(mock);
        let workflow = AutoWorkflow::new(Arc::clone(&mock), WorkflowSettings::default());
        let mut records = Vec::new();
        let result = workflow.run(request, &mut records).await;
        (result, records, mock)
    }

    fn ids(pairs: &[(ResourceKind, &str)]) -> Vec<(ResourceKind, String)> {
        pairs.iter().map(|(k, id)| (*k, (*id).to_owned())).collect()
    }

    #[tokio::test]
    async fn html_run_completes_and_cleans_up() {
        // Given
        let dir = tempfile::tempdir().expect("tempdir");
        let request = request(dir.path().join("out"), ReportFormat::Html);

        // When
        let (result, records, mock) = run_with(MockResourceClient::new(), &request).await;

        // Then
        let summary = result.expect("run should succeed");
        assert_eq!(summary.status, "success");
        assert_eq!(summary.target_id, "t1");
        assert_eq!(summary.scan_id, "s1");
        assert_eq!(summary.report_id, "r1");
        assert_eq!(summary.state, WorkflowState::Done);
        assert_eq!(summary.files, vec![dir.path().join("out/r1.html")]);
        assert!(summary.files[0].exists());
        assert!(summary.cleanup.is_clean());

        let steps: Vec<_> = records.iter().map(|r| r.step).collect();
        assert_eq!(
            steps,
            vec![
                "1. Add target",
                "2. Check target exists",
                "3. Start scan",
                "4. Check scan exists",
                "5. Wait for scan completion",
                "6. Generate report",
                "7. Wait for report generation",
                "8. Download files",
            ]
        );
        assert!(records.iter().all(|r| r.status == "completed"));
        assert!(records.iter().all(|r| r.run_id == summary.run_id));

        assert_eq!(
            mock.deletions(),
            ids(&[
                (ResourceKind::Report, "r1"),
                (ResourceKind::Scan, "s1"),
                (ResourceKind::Target, "t1"),
            ])
        );
    }

    #[tokio::test]
    async fn csv_run_uses_export_and_keeps_csv_links() {
        let dir = tempfile::tempdir().expect("tempdir");
        let request = request(dir.path().join("out/result.csv"), ReportFormat::Csv);

        let (result, records, mock) = run_with(MockResourceClient::new(), &request).await;

        let summary = result.expect("run should succeed");
        assert_eq!(summary.report_id, "e1");
        assert_eq!(summary.files, vec![dir.path().join("out/result.csv")]);
        assert_eq!(records[5].step, "6. Create export");
        assert_eq!(records[5].resource, ResourceKind::Export);
        assert_eq!(
            mock.deletions(),
            ids(&[
                (ResourceKind::Export, "e1"),
                (ResourceKind::Scan, "s1"),
                (ResourceKind::Target, "t1"),
            ])
        );
    }

    #[tokio::test]
    async fn run_without_matching_links_succeeds_with_no_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mock = MockResourceClient::new().with_statuses(
            ResourceKind::Report,
            vec![ResourceStatus::with_download(
                "completed",
                vec!["/reports/r1.pdf".to_owned()],
            )],
        );

        let (result, _, _) = run_with(mock, &request(dir.path().join("out"), ReportFormat::Html)).await;

        let summary = result.expect("run should succeed");
        assert!(summary.files.is_empty());
    }

    #[tokio::test]
    async fn failure_at_each_step_deletes_only_recorded_resources() {
        let report = (ResourceKind::Report, "r1");
        let scan = (ResourceKind::Scan, "s1");
        let target = (ResourceKind::Target, "t1");

        let cases = vec![
            (
                MockResourceClient::new().failing_create(ResourceKind::Target),
                Step::AddTarget,
                WorkflowState::Init,
                vec![],
            ),
            (
                MockResourceClient::new().failing_exists(ResourceKind::Target),
                Step::VerifyTarget,
                WorkflowState::TargetCreated,
                vec![target],
            ),
            (
                MockResourceClient::new().failing_create(ResourceKind::Scan),
                Step::StartScan,
                WorkflowState::TargetVerified,
                vec![target],
            ),
            (
                MockResourceClient::new().failing_exists(ResourceKind::Scan),
                Step::VerifyScan,
                WorkflowState::ScanCreated,
                vec![scan, target],
            ),
            (
                MockResourceClient::new()
                    .with_statuses(ResourceKind::Scan, vec![ResourceStatus::new("failed")]),
                Step::WaitForScan,
                WorkflowState::ScanVerified,
                vec![scan, target],
            ),
            (
                MockResourceClient::new().failing_create(ResourceKind::Report),
                Step::GenerateReport,
                WorkflowState::ScanCompleted,
                vec![scan, target],
            ),
            (
                MockResourceClient::new().failing_status(ResourceKind::Report),
                Step::WaitForReport,
                WorkflowState::ReportOrExportCreated,
                vec![report, scan, target],
            ),
            (
                MockResourceClient::new().failing_download(),
                Step::DownloadFiles,
                WorkflowState::ReportOrExportCompleted,
                vec![report, scan, target],
            ),
        ];

        for (mock, expected_step, expected_state, expected_deletions) in cases {
            let dir = tempfile::tempdir().expect("tempdir");
            let (result, _, mock) =
                run_with(mock, &request(dir.path().join("out"), ReportFormat::Html)).await;

            let failure = result.expect_err("run should fail");
            assert_eq!(failure.step, expected_step);
            assert_eq!(failure.state, expected_state, "state for {expected_step:?}");
            assert_eq!(
                mock.deletions(),
                ids(&expected_deletions),
                "deletions for {expected_step:?}"
            );
            assert!(failure.cleanup.is_clean());
        }
    }

    #[tokio::test]
    async fn csv_failure_at_export_steps_deletes_export_only_once_created() {
        let export = (ResourceKind::Export, "e1");
        let scan = (ResourceKind::Scan, "s1");
        let target = (ResourceKind::Target, "t1");

        let cases = vec![
            (
                MockResourceClient::new().failing_create(ResourceKind::Export),
                Step::CreateExport,
                WorkflowState::ScanCompleted,
                vec![scan, target],
            ),
            (
                MockResourceClient::new().failing_status(ResourceKind::Export),
                Step::WaitForExport,
                WorkflowState::ReportOrExportCreated,
                vec![export, scan, target],
            ),
        ];

        for (mock, expected_step, expected_state, expected_deletions) in cases {
            let dir = tempfile::tempdir().expect("tempdir");
            let (result, _, mock) =
                run_with(mock, &request(dir.path().join("out"), ReportFormat::Csv)).await;

            let failure = result.expect_err("run should fail");
            assert_eq!(failure.step, expected_step);
            assert_eq!(failure.state, expected_state, "state for {expected_step:?}");
            assert_eq!(
                mock.deletions(),
                ids(&expected_deletions),
                "deletions for {expected_step:?}"
            );
            assert!(failure.cleanup.is_clean());
        }
    }

    #[tokio::test]
    async fn failed_scan_reports_remote_status() {
        let mock = MockResourceClient::new()
            .with_statuses(ResourceKind::Scan, vec![ResourceStatus::new("aborted")]);

        let (result, _, _) = run_with(mock, &request(PathBuf::from("out"), ReportFormat::Html)).await;

        let failure = result.expect_err("aborted scan should fail the run");
        assert!(matches!(
            failure.error,
            WorkflowError::RemoteFailed { ref status, .. } if status == "aborted"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn scan_timeout_fails_and_cleans_up() {
        // Given: a scan that never leaves `processing`
        let mock = MockResourceClient::new()
            .with_statuses(ResourceKind::Scan, vec![ResourceStatus::new("processing")]);
        let mut request = request(PathBuf::from("out"), ReportFormat::Html);
        request.wait_timeout = Duration::from_secs(30);

        // When
        let (result, _, mock) = run_with(mock, &request).await;

        // Then
        let failure = result.expect_err("run should time out");
        assert_eq!(failure.step, Step::WaitForScan);
        assert!(matches!(failure.error, WorkflowError::TimedOut { .. }));
        assert_eq!(
            mock.deletions(),
            ids(&[(ResourceKind::Scan, "s1"), (ResourceKind::Target, "t1")])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn export_timeout_fails_and_deletes_export() {
        // Given: an export that never leaves `processing`
        let mock = MockResourceClient::new()
            .with_statuses(ResourceKind::Export, vec![ResourceStatus::new("processing")]);
        let mut request = request(PathBuf::from("out"), ReportFormat::Csv);
        request.wait_timeout = Duration::from_secs(30);

        // When
        let (result, _, mock) = run_with(mock, &request).await;

        // Then
        let failure = result.expect_err("run should time out");
        assert_eq!(failure.step, Step::WaitForExport);
        assert_eq!(failure.state, WorkflowState::ReportOrExportCreated);
        assert!(matches!(
            failure.error,
            WorkflowError::TimedOut { kind: ResourceKind::Export, .. }
        ));
        assert_eq!(
            mock.deletions(),
            ids(&[
                (ResourceKind::Export, "e1"),
                (ResourceKind::Scan, "s1"),
                (ResourceKind::Target, "t1"),
            ])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_wait_timeout_runs_to_completion() {
        // Given: a timeout too large to add to the current instant
        let mock = MockResourceClient::new().with_statuses(
            ResourceKind::Scan,
            vec![ResourceStatus::new("processing"), ResourceStatus::new("completed")],
        );
        let dir = tempfile::tempdir().expect("tempdir");
        let mut request = request(dir.path().join("out"), ReportFormat::Html);
        request.wait_timeout = Duration::from_secs(u64::MAX);

        // When
        let (result, _, mock) = run_with(mock, &request).await;

        // Then
        let summary = result.expect("run should succeed");
        assert_eq!(summary.state, WorkflowState::Done);
        assert_eq!(mock.deletions().len(), 3);
    }

    #[tokio::test]
    async fn cleanup_continues_past_404_and_failures() {
        // Given: download fails, report is already gone, scan delete is refused
        let mock = MockResourceClient::new()
            .failing_download()
            .with_delete_status(ResourceKind::Report, 404)
            .with_delete_status(ResourceKind::Scan, 500);

        let dir = tempfile::tempdir().expect("tempdir");

        // When
        let (result, _, mock) =
            run_with(mock, &request(dir.path().join("out"), ReportFormat::Html)).await;

        // Then: the download error is kept and every resource was attempted
        let failure = result.expect_err("run should fail");
        assert!(matches!(failure.error, WorkflowError::Rejected { .. }));
        assert_eq!(mock.deletions().len(), 3);

        let outcomes: Vec<_> = failure
            .cleanup
            .actions
            .iter()
            .map(|a| a.outcome.clone())
            .collect();
        assert_eq!(outcomes[0], CleanupOutcome::AlreadyGone);
        assert!(matches!(outcomes[1], CleanupOutcome::Failed { .. }));
        assert_eq!(outcomes[2], CleanupOutcome::Deleted { status: 204 });
        assert_eq!(failure.cleanup.failures().count(), 1);
    }

    #[tokio::test]
    async fn empty_target_url_fails_before_any_call() {
        let mut request = request(PathBuf::from("out"), ReportFormat::Html);
        request.target_url = "   ".to_owned();

        let (result, records, mock) = run_with(MockResourceClient::new(), &request).await;

        let failure = result.expect_err("blank url should be rejected");
        assert_eq!(failure.step, Step::ValidateInput);
        assert!(matches!(failure.error, WorkflowError::Validation(_)));
        assert!(records.is_empty());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn failure_record_serializes_cleanup() {
        let mock = MockResourceClient::new().failing_exists(ResourceKind::Scan);
        let (result, _, _) = run_with(mock, &request(PathBuf::from("out"), ReportFormat::Html)).await;

        let failure = result.expect_err("run should fail");
        let json = serde_json::to_value(failure.record()).expect("record should serialize");

        assert_eq!(json["status"], "failed");
        assert_eq!(json["step"], "4. Check scan exists");
        assert_eq!(json["state"], "scan_created");
        assert_eq!(json["scan_id"], "s1");
        assert!(json.get("report_id").is_none());
        assert_eq!(json["cleanup"][0]["resource"], "scan");
        assert_eq!(json["cleanup"][0]["outcome"]["result"], "deleted");
        assert_eq!(json["cleanup"][0]["outcome"]["status"], 204);
    }

    #[tokio::test]
    async fn verify_calls_use_created_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (_, _, mock) =
            run_with(MockResourceClient::new(), &request(dir.path().join("out"), ReportFormat::Html)).await;

        let calls = mock.calls();
        assert_eq!(calls[0], MockCall::Create(ResourceKind::Target));
        assert_eq!(calls[1], MockCall::Exists(ResourceKind::Target, "t1".to_owned()));
        assert_eq!(calls[2], MockCall::Create(ResourceKind::Scan));
        assert_eq!(calls[3], MockCall::Exists(ResourceKind::Scan, "s1".to_owned()));
    }

    #[test]
    fn blank_override_falls_back_to_default() {
        assert_eq!(or_default(Some("  "), "default"), "default");
        assert_eq!(or_default(None, "default"), "default");
        assert_eq!(or_default(Some("custom"), "default"), "custom");
    }

    #[test]
    fn settings_follow_auto_config() {
        let config = AutoConfig {
            scan_poll_interval_secs: 3,
            target_criticality: 10,
            ..AutoConfig::default()
        };
        let settings = WorkflowSettings::from_config(&config);
        assert_eq!(settings.scan_poll_interval, Duration::from_secs(3));
        assert_eq!(settings.target_criticality, 10);
    }
}
