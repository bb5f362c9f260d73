use super::Context;
use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use reclist_common::ListId;
use reclist_workspace::PersistenceGateway;

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Id of the list to delete
    pub id: ListId,
}

pub async fn delete(args: DeleteArgs, ctx: &Context) -> Result<()> {
    ctx.gateway()
        .delete_document(args.id)
        .await
        .with_context(|| format!("Failed to delete list {}", args.id))?;

    println!("{} Deleted list {}", "✓".green(), args.id);
    Ok(())
}
