use super::Context;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use reclist_common::{IdentityProvider, NoIdentity, StaticIdentity, UserId};
use reclist_editor::{EditCommand, ListId, Visibility};
use reclist_workspace::{ListEditor, SaveOutcome};
use tracing::debug;

#[derive(Debug, Args)]
pub struct NewArgs {
    /// List name
    #[arg(short, long)]
    pub name: String,

    /// Creator id; without one the list cannot be created
    #[arg(short, long, env = "RECLIST_USER")]
    pub user: Option<UserId>,

    /// Item to add, in order (repeatable)
    #[arg(short, long = "item")]
    pub items: Vec<String>,

    /// List emoji
    #[arg(short, long)]
    pub emoji: Option<String>,

    /// Who can see the list (global, friends, restricted)
    #[arg(long, value_parser = parse_visibility)]
    pub visibility: Option<Visibility>,
}

fn parse_visibility(value: &str) -> Result<Visibility, String> {
    match value {
        "global" => Ok(Visibility::Global),
        "friends" => Ok(Visibility::Friends),
        "restricted" => Ok(Visibility::Restricted),
        other => Err(format!(
            "unknown visibility '{}', use global, friends or restricted",
            other
        )),
    }
}

/// Commands that type the list header and items into a fresh list
fn typing_script(args: &NewArgs) -> Vec<EditCommand> {
    let mut commands = vec![EditCommand::SetListName(args.name.clone())];

    if args.emoji.is_some() {
        commands.push(EditCommand::SetListEmoji(args.emoji.clone()));
    }
    if let Some(visibility) = args.visibility {
        commands.push(EditCommand::SetVisibility(visibility));
    }

    for (index, item) in args.items.iter().enumerate() {
        if index > 0 {
            // name → description → next item
            commands.push(EditCommand::Commit);
            commands.push(EditCommand::Commit);
        }
        commands.push(EditCommand::SetText(item.clone()));
    }

    commands
}

pub async fn new(args: NewArgs, ctx: &Context) -> Result<()> {
    let identity: Box<dyn IdentityProvider> = match args.user {
        Some(user) => Box::new(StaticIdentity::new(user)),
        None => Box::new(NoIdentity),
    };

    let id = create(&args, identity.as_ref(), ctx).await?;

    match id {
        Some(id) => {
            println!("{} Created list {}", "✓".green(), args.name.bright_white());
            println!("  {}", id);
        }
        None => {
            println!(
                "{} Nothing saved: the list has no items yet",
                "⚠️".yellow()
            );
            println!("Add one with --item");
        }
    }

    Ok(())
}

/// Create and save the list, returning its id if anything was stored
async fn create(args: &NewArgs, identity: &dyn IdentityProvider, ctx: &Context) -> Result<Option<ListId>> {
    let editor = ListEditor::create(identity, ctx.gateway(), &ctx.config)?;
    let id = editor.id();

    for command in typing_script(args) {
        editor.dispatch(&command, None)?;
    }
    debug!(list_id = %id, version = editor.version(), "typed new list");

    match editor.close().await? {
        SaveOutcome::SkippedPlaceholder => Ok(None),
        _ => Ok(Some(id)),
    }
}
