//! acuctl auto workflow
//!
//! Client, poller, downloader and orchestrator for the scanner's
//! target -> scan -> report -> download -> cleanup pipeline.
//!
//! # Architecture
//!
//! ```text
//! AutoWorkflow ──▶ ResourceClient (create / verify / status / delete)
//!      │                  ▲
//!      ├──▶ poll_until_terminal
//!      └──▶ download_all
//! ```
//!
//! [`ApiClient`] implements [`ResourceClient`] over HTTP; unit tests use a
//! scripted mock.

pub mod client;
pub mod download;
pub mod error;
pub mod poller;
pub mod workflow;

pub use client::{API_KEY_HEADER, ApiClient, ApiResponse, ResourceClient, validate_resource_id};
pub use download::{OutputTarget, download_all};
pub use error::WorkflowError;
pub use poller::{PollOutcome, PollSettings, TerminalStates, poll_until_terminal};
pub use workflow::{
    AutoRequest, AutoSummary, AutoWorkflow, CleanupAction, CleanupOutcome, CleanupReport,
    FailureRecord, ProgressReporter, Step, StepRecord, WorkflowFailure, WorkflowSettings,
    WorkflowState,
};
