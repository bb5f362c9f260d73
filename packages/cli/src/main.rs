mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{delete, edit, new, show, Context, DeleteArgs, EditArgs, NewArgs, ShowArgs};
use reclist_workspace::EditorConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Reclist CLI - Edit recommendation lists from the terminal
#[derive(Parser, Debug)]
#[command(name = "reclist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding stored lists (defaults to the configured store)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "reclist_workspace=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new list
    New(NewArgs),

    /// Print a stored list
    Show(ShowArgs),

    /// Replay a script of edit commands against a list
    Edit(EditArgs),

    /// Delete a stored list
    Delete(DeleteArgs),
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = EditorConfig::load(&cwd)?;
    let store = cli
        .store
        .unwrap_or_else(|| config.get_store_dir(&cwd));
    let ctx = Context::new(store, config);

    match cli.command {
        Command::New(args) => new(args, &ctx).await,
        Command::Show(args) => show(args, &ctx).await,
        Command::Edit(args) => edit(args, &ctx).await,
        Command::Delete(args) => delete(args, &ctx).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    if let Err(err) = run(cli).await {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
