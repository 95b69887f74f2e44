mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, init, tree, CheckArgs, InitArgs, TreeArgs};
use tracing_subscriber::EnvFilter;

/// Widgetree CLI - inspect and validate widget tree documents
#[derive(Parser, Debug)]
#[command(name = "widgetree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show debug logs (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a config file and an example document
    Init(InitArgs),

    /// Validate documents against the catalog and the shared namespace
    Check(CheckArgs),

    /// Print the widget tree of a document
    Tree(TreeArgs),
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Init(args) => init(args, &cwd),
            Command::Check(args) => check(args, &cwd),
            Command::Tree(args) => tree(args, &cwd),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
