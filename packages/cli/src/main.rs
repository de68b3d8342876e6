mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{outline, render, replay, OutlineArgs, RenderArgs, ReplayArgs};

/// Sitecanvas CLI - render, inspect and replay editable site templates
#[derive(Parser, Debug)]
#[command(name = "sitecanvas")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a template and print its clean document
    Render(RenderArgs),

    /// Print the section / layer outline of a template
    Outline(OutlineArgs),

    /// Run a scripted editing session against a template
    Replay(ReplayArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Render(args) => render(args, &cwd),
            Command::Outline(args) => outline(args, &cwd),
            Command::Replay(args) => replay(args, &cwd),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
