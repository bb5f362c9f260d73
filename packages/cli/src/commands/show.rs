use super::Context;
use anyhow::{Context as _, Result};
use clap::Args;
use colored::Colorize;
use reclist_common::ListId;
use reclist_editor::{Item, ListDocument};
use std::fmt::Write;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Id of the list to print
    pub id: ListId,
}

pub async fn show(args: ShowArgs, ctx: &Context) -> Result<()> {
    let doc = ctx
        .gateway()
        .load(args.id)
        .await
        .with_context(|| format!("Failed to load list {}", args.id))?;

    print!("{}", outline(&doc));
    Ok(())
}

/// Render a list as an indented outline
pub fn outline(doc: &ListDocument) -> String {
    let mut out = String::new();

    let title = if doc.name().is_empty() {
        "(untitled)".dimmed().to_string()
    } else {
        doc.name().bold().to_string()
    };
    let _ = writeln!(
        out,
        "{}{} {}",
        doc.emoji().map(|e| format!("{} ", e)).unwrap_or_default(),
        title,
        format!("[{}]", doc.visibility().as_str()).dimmed()
    );
    let _ = writeln!(out, "  {}", doc.id().to_string().dimmed());

    for item in doc.unsectioned_items() {
        write_item(&mut out, item, "  ");
    }

    for section in doc.sections() {
        let name = if section.name.is_empty() {
            "(untitled section)".dimmed().to_string()
        } else {
            section.name.bright_blue().bold().to_string()
        };
        let _ = writeln!(
            out,
            "  {}{}",
            section.emoji.as_deref().map(|e| format!("{} ", e)).unwrap_or_default(),
            name
        );
        for item in &section.items {
            write_item(&mut out, item, "    ");
        }
    }

    out
}

fn write_item(out: &mut String, item: &Item, indent: &str) {
    let star = if item.is_starred { "★".yellow().to_string() } else { "•".to_string() };
    let name = if item.name.is_empty() { "(empty)".dimmed().to_string() } else { item.name.clone() };
    let price = item
        .price
        .map(|p| format!(" {}", p.symbol().green()))
        .unwrap_or_default();

    let _ = writeln!(out, "{}{} {}{}", indent, star, name, price);

    if let Some(description) = item.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "{}    {}", indent, description.italic());
    }
}
