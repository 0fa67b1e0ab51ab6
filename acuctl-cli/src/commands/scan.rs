//! `acuctl scan` command handler

use acuctl_auto::validate_resource_id;
use acuctl_core::types::{NewScan, ResourceKind};
use tracing::info;

use crate::cli::{ScanAction, ScanArgs};
use crate::commands::{Session, emit};
use crate::error::CliError;
use crate::output::OutputWriter;

/// Execute the `scan` command.
///
/// `scan start` without `--profile-id` uses `auto.scan_profile_id`.
pub async fn execute(
    args: ScanArgs,
    session: &Session,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let client = &session.client;
    match args.action {
        ScanAction::List => emit(client.get("/scans").await?, "list scans", writer),
        ScanAction::Get { id } => {
            validate_resource_id(ResourceKind::Scan, &id)?;
            emit(client.get(&format!("/scans/{id}")).await?, "get scan", writer)
        }
        ScanAction::Start {
            target_id,
            profile_id,
        } => {
            validate_resource_id(ResourceKind::Target, &target_id)?;
            let profile_id = profile_id
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| session.config.auto.scan_profile_id.clone());
            info!(target_id = %target_id, profile_id = %profile_id, "starting scan");

            let body = NewScan::immediate(target_id, profile_id);
            emit(client.post_json("/scans", &body).await?, "start scan", writer)
        }
        ScanAction::Results { id } => {
            validate_resource_id(ResourceKind::Scan, &id)?;
            let path = format!("/scans/{id}/results");
            emit(client.get(&path).await?, "list scan results", writer)
        }
        ScanAction::Remove { id } => {
            validate_resource_id(ResourceKind::Scan, &id)?;
            info!(scan_id = %id, "removing scan");
            let path = format!("/scans/{id}");
            emit(client.delete_path(&path).await?, "remove scan", writer)
        }
        ScanAction::Technologies { scan_id, result_id } => {
            validate_resource_id(ResourceKind::Scan, &scan_id)?;
            validate_resource_id("scan result", &result_id)?;
            let path = format!("/scans/{scan_id}/results/{result_id}/technologies");
            emit(client.get(&path).await?, "list scan technologies", writer)
        }
    }
}
