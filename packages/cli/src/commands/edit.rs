use super::show::outline;
use super::Context;
use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use reclist_common::ListId;
use reclist_editor::{ContainerRef, EditCommand, FocusTarget, ItemField};
use reclist_workspace::{ListEditor, SaveOutcome, WorkspaceError};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Id of the list to edit
    pub id: ListId,

    /// JSON file holding an array of edit commands
    #[arg(short, long)]
    pub script: PathBuf,

    /// Print the list after every command
    #[arg(short, long)]
    pub verbose: bool,
}

/// Result of replaying a script
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub refused: usize,
}

pub async fn edit(args: EditArgs, ctx: &Context) -> Result<()> {
    let source = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;
    let commands = EditCommand::parse_script(&source)
        .with_context(|| format!("Invalid script {}", args.script.display()))?;

    let (summary, outcome) = replay(args.id, &commands, args.verbose, ctx).await?;

    println!();
    println!(
        "{} {} applied, {} refused",
        "✓".green(),
        summary.applied,
        summary.refused
    );
    match outcome {
        SaveOutcome::Updated => println!("  Saved"),
        SaveOutcome::Unchanged | SaveOutcome::Empty => println!("  No changes to save"),
        other => println!("  {:?}", other),
    }

    Ok(())
}

async fn replay(
    id: ListId,
    commands: &[EditCommand],
    verbose: bool,
    ctx: &Context,
) -> Result<(ReplaySummary, SaveOutcome)> {
    let gateway = ctx.gateway();
    let doc = gateway
        .load(id)
        .await
        .with_context(|| format!("Failed to load list {}", id))?;
    let editor = ListEditor::open(doc, gateway, &ctx.config);

    let mut summary = ReplaySummary::default();
    for (step, command) in commands.iter().enumerate() {
        match editor.dispatch(command, None) {
            Ok(change) => {
                summary.applied += 1;
                println!(
                    "{:>3} {:<24} → {}",
                    step + 1,
                    format!("{:?}", command),
                    describe_focus(&change.focus)
                );
                if verbose {
                    print!("{}", outline(&change.document));
                }
            }
            Err(WorkspaceError::Editor(e)) => {
                // refused commands leave the list untouched
                summary.refused += 1;
                debug!(step, error = %e, "command refused");
                println!(
                    "{:>3} {:<24} {} {}",
                    step + 1,
                    format!("{:?}", command),
                    "skipped:".yellow(),
                    e
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    let outcome = editor.close().await?;
    Ok((summary, outcome))
}

fn describe_focus(focus: &FocusTarget) -> String {
    match focus {
        FocusTarget::None => "no focus".to_string(),
        FocusTarget::SectionTitle(section) => format!("title of section {}", section + 1),
        FocusTarget::Field {
            container,
            item,
            field,
        } => {
            let field = match field {
                ItemField::Name => "name",
                ItemField::Description => "description",
            };
            match container {
                ContainerRef::Unsectioned => format!("{} of item {}", field, item + 1),
                ContainerRef::Section(section) => {
                    format!("{} of item {} in section {}", field, item + 1, section + 1)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclist_common::UserId;
    use reclist_editor::{Item, ListDocument, Section, Visibility};
    use reclist_workspace::{EditorConfig, ListPayload, PersistenceGateway};

    async fn stored_list(ctx: &Context) -> ListId {
        let doc = ListDocument::from_parts(
            ListId::new(),
            "Dim sum".to_string(),
            UserId::new(),
            None,
            Visibility::Global,
            vec![Section::with_items("Richmond", vec![Item::named("Good Luck")])],
            vec![Item::named("Yank Sing")],
        )
        .unwrap();
        ctx.gateway()
            .create_document(&ListPayload::from(&doc))
            .await
            .unwrap()
    }

    #[test]
    fn test_describe_focus() {
        assert_eq!(describe_focus(&FocusTarget::SectionTitle(0)), "title of section 1");
        assert_eq!(
            describe_focus(&FocusTarget::description(ContainerRef::Section(1), 2)),
            "description of item 3 in section 2"
        );
        assert_eq!(
            describe_focus(&FocusTarget::name(ContainerRef::Unsectioned, 0)),
            "name of item 1"
        );
    }

    #[tokio::test]
    async fn test_replay_applies_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(dir.path().to_path_buf(), EditorConfig::default());
        let id = stored_list(&ctx).await;

        let commands = EditCommand::parse_script(
            r#"["commit", {"setText": "har gow"}, "deleteEmpty", "toggleStar"]"#,
        )
        .unwrap();
        let (summary, outcome) = replay(id, &commands, false, &ctx).await.unwrap();

        assert_eq!(summary, ReplaySummary { applied: 3, refused: 1 });
        assert_eq!(outcome, SaveOutcome::Updated);

        let doc = ctx.gateway().load(id).await.unwrap();
        let item = &doc.unsectioned_items()[0];
        assert_eq!(item.description.as_deref(), Some("har gow"));
        assert!(item.is_starred);
    }

    #[tokio::test]
    async fn test_replay_unknown_list_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(dir.path().to_path_buf(), EditorConfig::default());

        let err = replay(ListId::new(), &[], false, &ctx).await.unwrap_err();
        assert!(err.to_string().contains("Failed to load list"));
    }
}
