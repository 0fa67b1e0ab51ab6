//! `acuctl target` and `acuctl target-group` command handlers

use acuctl_auto::{ApiClient, validate_resource_id};
use acuctl_core::types::{AddTargetsRequest, NewTarget, ResourceKind};
use serde_json::json;
use tracing::info;

use crate::cli::{TargetAction, TargetArgs, TargetGroupAction, TargetGroupArgs};
use crate::commands::{Session, emit, read_json_body};
use crate::error::CliError;
use crate::output::OutputWriter;

/// Execute the `target` command.
pub async fn execute(
    args: TargetArgs,
    session: &Session,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let client = &session.client;
    match args.action {
        TargetAction::List => emit(client.get("/targets").await?, "list targets", writer),
        TargetAction::Get { id } => {
            validate_resource_id(ResourceKind::Target, &id)?;
            emit(client.get(&format!("/targets/{id}")).await?, "get target", writer)
        }
        TargetAction::Add {
            url,
            description,
            criticality,
            group,
        } => {
            let criticality = criticality.unwrap_or(session.config.auto.target_criticality);
            let body = add_request(url, description, criticality, group);
            info!(address = %body.targets[0].address, "adding target");
            emit(client.post_json("/targets/add", &body).await?, "add target", writer)
        }
        TargetAction::Remove { ids } => {
            for id in &ids {
                validate_resource_id(ResourceKind::Target, id)?;
            }
            info!(count = ids.len(), "removing targets");
            let body = json!({ "target_id_list": ids });
            emit(client.post_json("/targets/delete", &body).await?, "remove targets", writer)
        }
        TargetAction::Config { id } => {
            validate_resource_id(ResourceKind::Target, &id)?;
            let path = format!("/targets/{id}/configuration");
            emit(client.get(&path).await?, "get target configuration", writer)
        }
        TargetAction::SetConfig { id, file } => {
            validate_resource_id(ResourceKind::Target, &id)?;
            let body = read_json_body(&file).await?;
            info!(target_id = %id, file = %file.display(), "updating target configuration");
            let path = format!("/targets/{id}/configuration");
            emit(
                client.patch_json(&path, &body).await?,
                "set target configuration",
                writer,
            )
        }
    }
}

/// Execute the `target-group` command.
pub async fn execute_group(
    args: TargetGroupArgs,
    client: &ApiClient,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        TargetGroupAction::List => {
            emit(client.get("/target_groups").await?, "list target groups", writer)
        }
        TargetGroupAction::Targets { id } => {
            validate_resource_id("target group", &id)?;
            let path = format!("/target_groups/{id}/targets");
            emit(client.get(&path).await?, "list group targets", writer)
        }
        TargetGroupAction::Add { name } => {
            if name.trim().is_empty() {
                return Err(CliError::Command("group name must not be empty".to_owned()));
            }
            info!(name = %name, "adding target group");
            let body = json!({ "name": name });
            emit(client.post_json("/target_groups", &body).await?, "add target group", writer)
        }
        TargetGroupAction::Remove { ids } => {
            for id in &ids {
                validate_resource_id("target group", id)?;
            }
            info!(count = ids.len(), "removing target groups");
            let body = json!({ "group_id_list": ids });
            emit(
                client.post_json("/target_groups/delete", &body).await?,
                "remove target groups",
                writer,
            )
        }
        TargetGroupAction::AddTargets { id, target_ids } => {
            validate_resource_id("target group", &id)?;
            for target_id in &target_ids {
                validate_resource_id(ResourceKind::Target, target_id)?;
            }
            info!(group_id = %id, count = target_ids.len(), "adding targets to group");
            let body = json!({ "add": target_ids, "remove": [] });
            let path = format!("/target_groups/{id}/targets");
            emit(client.patch_json(&path, &body).await?, "add group targets", writer)
        }
    }
}

fn add_request(
    url: String,
    description: String,
    criticality: u32,
    group: Option<String>,
) -> AddTargetsRequest {
    let mut target = NewTarget::new(url, criticality);
    target.description = description;

    let mut request = AddTargetsRequest::single(target);
    request.groups.extend(group);
    request
}
