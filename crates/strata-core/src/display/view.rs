//! What a workflow will run: its structure, effective values and argv.

use std::fmt;

use crate::{
    models::{AbstractPlan, CompositePlan, Plan, PlanId},
    resolver::Resolution,
    workflow::PlanArena,
};

/// A workflow loaded into its arena, optionally after a resolution pass.
#[derive(Debug, Clone)]
pub struct WorkflowView {
    arena: PlanArena,
    root: PlanId,
    resolution: Option<Resolution>,
}

impl WorkflowView {
    pub fn new(arena: PlanArena, root: PlanId, resolution: Option<Resolution>) -> Self {
        Self {
            arena,
            root,
            resolution,
        }
    }

    pub fn arena(&self) -> &PlanArena {
        &self.arena
    }

    pub fn root(&self) -> Option<&AbstractPlan> {
        self.arena.get(self.root)
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    /// Supplied names that matched nothing.
    pub fn missing_parameters(&self) -> Vec<&str> {
        self.resolution
            .iter()
            .flat_map(|r| r.missing_parameters.iter().map(String::as_str))
            .collect()
    }

    /// `(plan name, argv)` for every leaf plan, in depth-first step order.
    pub fn commands(&self) -> Vec<(&str, Vec<String>)> {
        self.arena
            .leaf_plans(self.root)
            .into_iter()
            .map(|plan| (plan.name.as_str(), plan.to_argv(true)))
            .collect()
    }

    fn fmt_composite(&self, f: &mut fmt::Formatter<'_>, composite: &CompositePlan) -> fmt::Result {
        writeln!(f, "## Steps")?;
        writeln!(f)?;
        for step in composite.steps.iter().filter_map(|id| self.arena.get(*id)) {
            writeln!(f, "- **{}** ({}, id {})", step.name(), step.kind(), step.id())?;
        }

        if !composite.mappings.is_empty() {
            writeln!(f)?;
            writeln!(f, "## Mappings")?;
            writeln!(f)?;
            for mapping in &composite.mappings {
                let targets: Vec<String> = mapping
                    .mapped_parameters
                    .iter()
                    .map(|target| self.arena.describe(target))
                    .collect();
                write!(f, "- **{}** → {}", mapping.name, targets.join(", "))?;
                match mapping.actual_value().or(mapping.default_value.as_ref()) {
                    Some(value) => writeln!(f, ": `{value}`")?,
                    None => writeln!(f)?,
                }
            }
        }

        if !composite.links.is_empty() {
            writeln!(f)?;
            writeln!(f, "## Links")?;
            writeln!(f)?;
            for link in &composite.links {
                let sinks: Vec<String> = link
                    .sinks
                    .iter()
                    .map(|sink| self.arena.describe(sink))
                    .collect();
                writeln!(
                    f,
                    "- {} → {}",
                    self.arena.describe(&link.source),
                    sinks.join(", ")
                )?;
            }
        }
        writeln!(f)
    }

    fn fmt_command(f: &mut fmt::Formatter<'_>, plan: &Plan) -> fmt::Result {
        writeln!(f, "### {}", plan.name)?;
        writeln!(f)?;
        for parameter in plan.all_parameters() {
            write!(f, "{parameter}")?;
        }
        writeln!(f)?;
        writeln!(f, "```")?;
        writeln!(f, "{}", plan.to_argv(true).join(" "))?;
        writeln!(f, "```")?;
        writeln!(f)
    }
}

impl fmt::Display for WorkflowView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(root) = self.root() else {
            return writeln!(f, "Workflow {} not found.", self.root);
        };

        writeln!(f, "# {} ({})", root.name(), root.kind())?;
        writeln!(f)?;
        if let Some(description) = root.description() {
            writeln!(f, "{description}")?;
            writeln!(f)?;
        }

        if let AbstractPlan::Composite(composite) = root {
            self.fmt_composite(f, composite)?;
        }

        writeln!(f, "## Commands")?;
        writeln!(f)?;
        for plan in self.arena.leaf_plans(self.root) {
            Self::fmt_command(f, plan)?;
        }

        let missing = self.missing_parameters();
        if !missing.is_empty() {
            writeln!(f, "## Warnings")?;
            writeln!(f)?;
            for name in missing {
                writeln!(f, "- Unknown parameter `{name}` was ignored")?;
            }
        }
        Ok(())
    }
}
