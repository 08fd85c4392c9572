//! strata command-line application.

mod args;
mod cli;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use renderer::TerminalRenderer;
use strata_core::{params::ListWorkflows, ProjectBuilder};
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        command,
    } = Args::parse();

    let project = ProjectBuilder::new()
        .with_database_path(database_file)
        .build()
        .await
        .context("Failed to initialize project")?;

    info!("Using database {}", project.database_path().display());

    let cli = Cli::new(project, TerminalRenderer::new(!no_color));
    match command {
        Some(Workflow { command }) => cli.handle_workflow_command(command).await,
        Some(Activity { command }) => cli.handle_activity_command(command).await,
        None => cli.list_workflows(&ListWorkflows::default()).await,
    }
}
