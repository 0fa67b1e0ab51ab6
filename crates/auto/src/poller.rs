//! Status polling with a deadline.
//!
//! [`poll_until_terminal`] reads a resource's status at a fixed interval until
//! it reaches a success or failure state, or until the wait timeout elapses.
//! The deadline is checked before every read, so the call returns no earlier
//! than `timeout` and no later than roughly `timeout + interval` plus the
//! duration of the final read.

use std::time::Duration;

use acuctl_core::metrics as m;
use acuctl_core::types::{ResourceKind, ResourceStatus};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::client::ResourceClient;
use crate::error::WorkflowError;

/// Terminal-state predicates for one resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalStates {
    success: &'static [&'static str],
    failure: &'static [&'static str],
}

impl TerminalStates {
    /// Scans finish as `completed`, or fail as `failed` / `aborted`.
    pub const SCAN: Self = Self {
        success: &["completed"],
        failure: &["failed", "aborted"],
    };

    /// Reports and exports only ever finish as `completed`.
    pub const ARTIFACT: Self = Self {
        success: &["completed"],
        failure: &[],
    };

    /// Terminal states used for `kind`.
    pub fn for_kind(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Scan => Self::SCAN,
            _ => Self::ARTIFACT,
        }
    }

    /// Whether `status` means the resource finished successfully.
    pub fn is_success(&self, status: &str) -> bool {
        self.success.contains(&status)
    }

    /// Whether `status` means the resource failed.
    pub fn is_failure(&self, status: &str) -> bool {
        self.failure.contains(&status)
    }
}

/// Interval between reads and overall wait budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay between consecutive status reads
    pub interval: Duration,
    /// Maximum time to wait for a terminal state
    pub timeout: Duration,
}

/// Result of polling a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Reached a success state; carries the last status read.
    Completed(ResourceStatus),
    /// Reached a failure state; carries the failing status string.
    Failed(String),
    /// The deadline passed first.
    TimedOut,
}

impl PollOutcome {
    /// Converts a non-completed outcome into the matching [`WorkflowError`].
    pub fn into_result(
        self,
        kind: ResourceKind,
        id: &str,
        timeout: Duration,
    ) -> Result<ResourceStatus, WorkflowError> {
        match self {
            Self::Completed(status) => Ok(status),
            Self::Failed(status) => Err(WorkflowError::RemoteFailed {
                kind,
                id: id.to_owned(),
                status,
            }),
            Self::TimedOut => Err(WorkflowError::TimedOut {
                kind,
                id: id.to_owned(),
                timeout,
            }),
        }
    }
}

/// Polls `kind`/`id` until it reaches a terminal state or the timeout elapses.
///
/// # Errors
///
/// Any error from [`ResourceClient::status`] aborts polling immediately.
pub async fn poll_until_terminal<C: ResourceClient>(
    client: &C,
    kind: ResourceKind,
    id: &str,
    terminal: TerminalStates,
    settings: PollSettings,
) -> Result<PollOutcome, WorkflowError> {
    let started = Instant::now();
    // An unrepresentable deadline means no deadline.
    let deadline = started.checked_add(settings.timeout);
    let mut attempt: u32 = 0;

    loop {
        if deadline.is_some_and(|deadline| Instant::now() > deadline) {
            warn!(
                resource = %kind,
                id,
                attempts = attempt,
                timeout_secs = settings.timeout.as_secs(),
                "gave up waiting for terminal status"
            );
            return Ok(PollOutcome::TimedOut);
        }

        attempt += 1;
        metrics::counter!(m::AUTO_POLL_ATTEMPTS_TOTAL, m::LABEL_RESOURCE => kind.as_str())
            .increment(1);

        let current = client.status(kind, id).await?;
        debug!(
            resource = %kind,
            id,
            attempt,
            status = %current.status,
            elapsed_secs = started.elapsed().as_secs(),
            "polled status"
        );

        if terminal.is_success(&current.status) {
            return Ok(PollOutcome::Completed(current));
        }
        if terminal.is_failure(&current.status) {
            return Ok(PollOutcome::Failed(current.status));
        }

        tokio::time::sleep(settings.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockCall, MockResourceClient};

    fn settings(interval_secs: u64, timeout_secs: u64) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(interval_secs),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    #[test]
    fn scan_terminal_states() {
        let t = TerminalStates::SCAN;
        assert!(t.is_success("completed"));
        assert!(t.is_failure("failed"));
        assert!(t.is_failure("aborted"));
        assert!(!t.is_success("processing"));
        assert!(!t.is_failure("processing"));
    }

    #[test]
    fn artifact_has_no_failure_states() {
        let t = TerminalStates::for_kind(ResourceKind::Report);
        assert_eq!(t, TerminalStates::ARTIFACT);
        assert!(t.is_success("completed"));
        assert!(!t.is_failure("failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_completed_after_progress() {
        // Given: queued -> processing -> completed
        let mock = MockResourceClient::new().with_statuses(
            ResourceKind::Scan,
            vec![
                ResourceStatus::new("queued"),
                ResourceStatus::new("processing"),
                ResourceStatus::new("completed"),
            ],
        );

        // When
        let outcome = poll_until_terminal(
            &mock,
            ResourceKind::Scan,
            "s1",
            TerminalStates::SCAN,
            settings(10, 800),
        )
        .await
        .expect("poll should succeed");

        // Then
        assert_eq!(outcome, PollOutcome::Completed(ResourceStatus::new("completed")));
        assert_eq!(mock.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn returns_failed_on_aborted_scan() {
        let mock = MockResourceClient::new()
            .with_statuses(ResourceKind::Scan, vec![ResourceStatus::new("aborted")]);

        let outcome = poll_until_terminal(
            &mock,
            ResourceKind::Scan,
            "s1",
            TerminalStates::SCAN,
            settings(10, 800),
        )
        .await
        .expect("poll should succeed");

        assert_eq!(outcome, PollOutcome::Failed("aborted".to_owned()));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_within_one_interval_of_deadline() {
        // Given: a scan that never finishes
        let mock = MockResourceClient::new()
            .with_statuses(ResourceKind::Scan, vec![ResourceStatus::new("processing")]);
        let started = Instant::now();

        // When
        let outcome = poll_until_terminal(
            &mock,
            ResourceKind::Scan,
            "s1",
            TerminalStates::SCAN,
            settings(10, 25),
        )
        .await
        .expect("poll should not error");

        // Then: reads at 0, 10, 20; gives up at 30
        let elapsed = started.elapsed();
        assert_eq!(outcome, PollOutcome::TimedOut);
        assert!(elapsed >= Duration::from_secs(25), "returned too early: {elapsed:?}");
        assert!(elapsed <= Duration::from_secs(35), "returned too late: {elapsed:?}");
        assert_eq!(mock.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn status_error_aborts_polling() {
        let mock = MockResourceClient::new().failing_status(ResourceKind::Report);

        let err = poll_until_terminal(
            &mock,
            ResourceKind::Report,
            "r1",
            TerminalStates::ARTIFACT,
            settings(5, 300),
        )
        .await
        .expect_err("status error should propagate");

        assert!(matches!(err, WorkflowError::Request { .. }));
        assert_eq!(
            mock.calls(),
            vec![MockCall::Status(ResourceKind::Report, "r1".to_owned())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_still_reads_once() {
        let mock = MockResourceClient::new();

        let outcome = poll_until_terminal(
            &mock,
            ResourceKind::Scan,
            "s1",
            TerminalStates::SCAN,
            settings(10, 0),
        )
        .await
        .expect("poll should succeed");

        assert!(matches!(outcome, PollOutcome::Completed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_timeout_polls_until_terminal() {
        // Given: a timeout too large to add to the current instant
        let mock = MockResourceClient::new().with_statuses(
            ResourceKind::Scan,
            vec![
                ResourceStatus::new("processing"),
                ResourceStatus::new("processing"),
                ResourceStatus::new("completed"),
            ],
        );
        let settings = PollSettings {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(u64::MAX),
        };

        // When
        let outcome = poll_until_terminal(
            &mock,
            ResourceKind::Scan,
            "s1",
            TerminalStates::SCAN,
            settings,
        )
        .await
        .expect("poll should succeed");

        // Then
        assert_eq!(outcome, PollOutcome::Completed(ResourceStatus::new("completed")));
        assert_eq!(mock.calls().len(), 3);
    }

    #[test]
    fn outcome_into_result_maps_errors() {
        let timeout = Duration::from_secs(800);
        let err = PollOutcome::Failed("failed".to_owned())
            .into_result(ResourceKind::Scan, "s1", timeout)
            .expect_err("failed outcome is an error");
        assert!(matches!(err, WorkflowError::RemoteFailed { .. }));

        let err = PollOutcome::TimedOut
            .into_result(ResourceKind::Scan, "s1", timeout)
            .expect_err("timeout is an error");
        assert!(matches!(err, WorkflowError::TimedOut { .. }));

        let status = PollOutcome::Completed(ResourceStatus::new("completed"))
            .into_result(ResourceKind::Scan, "s1", timeout)
            .expect("completed outcome is ok");
        assert_eq!(status.status, "completed");
    }
}
