//! `acuctl report` and `acuctl export` command handlers

use acuctl_auto::{ApiClient, validate_resource_id};
use acuctl_core::types::ResourceKind;
use serde_json::{Value, json};
use tracing::info;

use crate::cli::{ExportAction, ExportArgs, ReportAction, ReportArgs};
use crate::commands::emit;
use crate::error::CliError;
use crate::output::OutputWriter;

/// Execute the `report` command.
pub async fn execute(
    args: ReportArgs,
    client: &ApiClient,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ReportAction::List => emit(client.get("/reports").await?, "list reports", writer),
        ReportAction::Remove { ids } => {
            let body = delete_body(ResourceKind::Report, &ids)?;
            info!(count = ids.len(), "removing reports");
            emit(client.post_json("/reports/delete", &body).await?, "remove reports", writer)
        }
    }
}

/// Execute the `export` command.
pub async fn execute_export(
    args: ExportArgs,
    client: &ApiClient,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ExportAction::Types => emit(client.get("/export_types").await?, "list export types", writer),
        ExportAction::Get { id } => {
            validate_resource_id(ResourceKind::Export, &id)?;
            emit(client.get(&format!("/exports/{id}")).await?, "get export", writer)
        }
        ExportAction::Remove { ids } => {
            let body = delete_body(ResourceKind::Export, &ids)?;
            info!(count = ids.len(), "removing exports");
            emit(client.post_json("/exports/delete", &body).await?, "remove exports", writer)
        }
    }
}

/// `{"report_id_list": [...]}` or `{"export_id_list": [...]}`
fn delete_body(kind: ResourceKind, ids: &[String]) -> Result<Value, CliError> {
    for id in ids {
        validate_resource_id(kind, id)?;
    }
    let field = format!("{}_id_list", kind.as_str());
    Ok(json!({ field: ids }))
}
