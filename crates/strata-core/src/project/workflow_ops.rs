//! Workflow operations: import, listing, removal and resolution.

use log::{debug, info};

use super::Project;
use crate::{
    definition::WorkflowDefinition,
    display::WorkflowView,
    error::{Result, StrataError},
    gateway::Gateway,
    models::{AbstractPlan, Values},
    params::{ImportWorkflows, ListWorkflows, ResolveWorkflow, WorkflowName},
};

/// Replay `definition` on top of the stored workflows and persist every plan
/// it created. Nothing is written when any part of it is rejected.
pub fn import_definition<G: Gateway + ?Sized>(
    gateway: &mut G,
    definition: &WorkflowDefinition,
) -> Result<Vec<AbstractPlan>> {
    let mut arena = gateway.load_arena()?;
    let created = definition.apply(&mut arena)?;

    let plans: Vec<AbstractPlan> = created
        .iter()
        .filter_map(|id| arena.get(*id))
        .cloned()
        .collect();
    gateway.save_all(&plans)?;

    info!("Imported {} workflows", plans.len());
    Ok(plans)
}

/// Invalidate the active workflow called `name`.
///
/// A workflow still used as a step by an active composite cannot be removed.
pub fn remove_by_name<G: Gateway + ?Sized>(gateway: &mut G, name: &str) -> Result<AbstractPlan> {
    let mut arena = gateway.load_arena()?;
    let id = arena.require_by_name(name)?.id();

    let parents: Vec<&str> = arena
        .parents_of(id)
        .into_iter()
        .map(|parent| parent.name.as_str())
        .collect();
    if !parents.is_empty() {
        return Err(StrataError::invalid_input("name").with_reason(format!(
            "'{name}' is a step of {}; remove those first",
            parents.join(", ")
        )));
    }

    arena.invalidate(id)?;
    let removed = arena.require(id)?.clone();
    gateway.save(&removed)?;

    info!("Removed workflow '{name}' ({id})");
    Ok(removed)
}

/// Load the workflow named or numbered `reference`, resolved against
/// `values` when given.
pub fn view_workflow<G: Gateway + ?Sized>(
    gateway: &G,
    reference: &str,
    values: Option<&Values>,
) -> Result<WorkflowView> {
    let mut arena = gateway.load_arena()?;
    let id = arena.find(reference)?.id();

    let resolution = match values {
        Some(values) => {
            debug!("Resolving '{reference}' against {} top-level values", values.len());
            Some(arena.resolve(id, values)?)
        }
        None => None,
    };

    Ok(WorkflowView::new(arena, id, resolution))
}

impl Project {
    /// Import every plan and composite from a JSON or YAML definition file.
    pub async fn import_workflows(&self, params: &ImportWorkflows) -> Result<Vec<AbstractPlan>> {
        let path = params.path.clone();

        self.with_gateway(move |gateway| {
            let definition = WorkflowDefinition::from_path(&path)?;
            import_definition(gateway, &definition)
        })
        .await
    }

    /// Lists active workflows by name, or every workflow ever stored.
    pub async fn list_workflows(&self, params: &ListWorkflows) -> Result<Vec<AbstractPlan>> {
        let removed = params.removed;

        self.with_gateway(move |gateway| {
            let arena = gateway.load_arena()?;
            let mut plans: Vec<AbstractPlan> = arena
                .iter()
                .filter(|plan| removed || plan.invalidated_at().is_none())
                .cloned()
                .collect();
            plans.sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
            Ok(plans)
        })
        .await
    }

    /// Show a workflow with its steps and default values.
    pub async fn show_workflow(&self, params: &WorkflowName) -> Result<WorkflowView> {
        let name = params.name.clone();

        self.with_gateway(move |gateway| view_workflow(gateway, &name, None))
            .await
    }

    /// Remove a workflow. Its record and any activities of it are kept.
    pub async fn remove_workflow(&self, params: &WorkflowName) -> Result<AbstractPlan> {
        let name = params.name.clone();

        self.with_gateway(move |gateway| remove_by_name(gateway, &name))
            .await
    }

    /// Resolve a workflow against the supplied values without running it.
    ///
    /// Unknown keys are reported on the returned view, not as errors.
    pub async fn resolve_workflow(&self, params: &ResolveWorkflow) -> Result<WorkflowView> {
        let name = params.name.clone();
        let overrides = params.overrides.clone();

        self.with_gateway(move |gateway| {
            let values = overrides.load()?;
            view_workflow(gateway, &name, Some(&values))
        })
        .await
    }
}
