//! `acuctl profile` command handler

use acuctl_auto::{ApiClient, validate_resource_id};
use tracing::info;

use crate::cli::{ProfileAction, ProfileArgs};
use crate::commands::{emit, read_json_body};
use crate::error::CliError;
use crate::output::OutputWriter;

/// Execute the `profile` command.
pub async fn execute(
    args: ProfileArgs,
    client: &ApiClient,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ProfileAction::List => emit(
            client.get("/scanning_profiles").await?,
            "list scanning profiles",
            writer,
        ),
        ProfileAction::Get { id } => {
            validate_resource_id("scanning profile", &id)?;
            let path = format!("/scanning_profiles/{id}");
            emit(client.get(&path).await?, "get scanning profile", writer)
        }
        ProfileAction::Add { file } => {
            let body = read_json_body(&file).await?;
            info!(file = %file.display(), "importing scanning profile");
            emit(
                client.post_json("/scanning_profiles", &body).await?,
                "add scanning profile",
                writer,
            )
        }
        ProfileAction::Remove { id } => {
            validate_resource_id("scanning profile", &id)?;
            info!(profile_id = %id, "removing scanning profile");
            let path = format!("/scanning_profiles/{id}");
            emit(client.delete_path(&path).await?, "remove scanning profile", writer)
        }
    }
}
