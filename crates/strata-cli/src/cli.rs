//! Command handlers: call the project facade and render the result.

use std::fmt;

use anyhow::{Context, Result};
use log::warn;
use strata_core::{
    display::{
        Activities, ImportResult, OperationStatus, Paths, RecordResult, RemoveResult, Workflows,
    },
    params::{Lineage, ListPaths, ListWorkflows},
    Direction, Project,
};

use crate::{
    args::{ActivityCommands, WorkflowCommands},
    renderer::TerminalRenderer,
};

pub struct Cli {
    project: Project,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(project: Project, renderer: TerminalRenderer) -> Self {
        Self { project, renderer }
    }

    fn render<T: fmt::Display>(&self, output: &T) -> Result<()> {
        self.renderer.render(&output.to_string())
    }

    pub async fn handle_workflow_command(&self, command: WorkflowCommands) -> Result<()> {
        match command {
            WorkflowCommands::Import(args) => {
                let path = args.path.display().to_string();
                let plans = self
                    .project
                    .import_workflows(&args.into())
                    .await
                    .with_context(|| format!("Failed to import workflows from {path}"))?;
                self.render(&ImportResult(plans))
            }
            WorkflowCommands::List(args) => self.list_workflows(&args.into()).await,
            WorkflowCommands::Show(args) => {
                let view = self
                    .project
                    .show_workflow(&args.into())
                    .await
                    .context("Failed to show workflow")?;
                self.render(&view)
            }
            WorkflowCommands::Remove(args) => {
                let removed = self
                    .project
                    .remove_workflow(&args.into())
                    .await
                    .context("Failed to remove workflow")?;
                self.render(&RemoveResult(removed))
            }
            WorkflowCommands::Resolve(args) => {
                let name = args.name.clone();
                let view = self
                    .project
                    .resolve_workflow(&args.into())
                    .await
                    .with_context(|| format!("Failed to resolve workflow '{name}'"))?;
                for missing in view.missing_parameters() {
                    warn!("Parameter '{missing}' does not exist in '{name}'");
                }
                self.render(&view)
            }
        }
    }

    pub async fn handle_activity_command(&self, command: ActivityCommands) -> Result<()> {
        match command {
            ActivityCommands::Record(args) => {
                let activity = self
                    .project
                    .record_activity(&args.into())
                    .await
                    .context("Failed to record activity")?;
                self.render(&RecordResult(activity))
            }
            ActivityCommands::List(args) => {
                let activities = self
                    .project
                    .list_activities(args.path.as_deref())
                    .await
                    .context("Failed to list activities")?;
                self.render(&Activities(activities))
            }
            ActivityCommands::Show(args) => {
                let details = self
                    .project
                    .show_activity(&args.into())
                    .await
                    .context("Failed to show activity")?;
                self.render(&details)
            }
            ActivityCommands::Downstream(args) => {
                self.lineage(args.into_params(Direction::Downstream)).await
            }
            ActivityCommands::Upstream(args) => {
                self.lineage(args.into_params(Direction::Upstream)).await
            }
            ActivityCommands::Inputs(args) => {
                let paths = self
                    .project
                    .list_usage_paths(&ListPaths::from(args))
                    .await
                    .context("Failed to list input paths")?;
                self.render(&Paths(paths))
            }
            ActivityCommands::Outputs(args) => {
                let paths = self
                    .project
                    .list_generation_paths(&ListPaths::from(args))
                    .await
                    .context("Failed to list output paths")?;
                self.render(&Paths(paths))
            }
        }
    }

    pub async fn list_workflows(&self, params: &ListWorkflows) -> Result<()> {
        let workflows = self
            .project
            .list_workflows(params)
            .await
            .context("Failed to list workflows")?;
        self.render(&Workflows(workflows))
    }

    async fn lineage(&self, params: Lineage) -> Result<()> {
        let result = self
            .project
            .lineage(&params)
            .await
            .with_context(|| format!("Failed to query lineage of activity {}", params.id))?;
        if result.is_empty() {
            return self.render(&OperationStatus::success(format!(
                "Activity {} has no {} activities",
                params.id, params.direction
            )));
        }
        self.render(&result)
    }
}
