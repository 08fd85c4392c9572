//! Arena storage for plans and the authoring operations that keep it valid.
//!
//! Composites reference their steps by [`PlanId`], so one step can be shared
//! by several composites without copying. Every structural mutation goes
//! through [`PlanArena`], which rejects duplicate names, step cycles, link
//! cycles and links flowing the wrong way at the moment they are made.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use jiff::Timestamp;
use log::debug;

use crate::{
    error::{Result, StrataError},
    models::{
        validate_name, AbstractPlan, CommandParameter, CompositePlan, ParameterKind,
        ParameterLink, ParameterMapping, ParameterRef, Plan, PlanId, Value, Values,
    },
    resolver::{Resolution, ValueResolver},
};

mod graph;

#[cfg(test)]
mod tests;

/// Owner of every plan known to a project, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct PlanArena {
    plans: BTreeMap<PlanId, AbstractPlan>,
    /// Active (not invalidated) plans by name
    names: HashMap<String, PlanId>,
    next_id: u64,
}

impl PlanArena {
    pub fn new() -> Self {
        Self {
            plans: BTreeMap::new(),
            names: HashMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild an arena from plans that already carry ids, as loaded from
    /// storage. Structure is trusted; names of invalidated plans stay free.
    pub fn from_plans(plans: impl IntoIterator<Item = AbstractPlan>) -> Self {
        let mut arena = Self::new();
        for plan in plans {
            let id = plan.id();
            if plan.invalidated_at().is_none() {
                arena.names.insert(plan.name().to_string(), id);
            }
            arena.next_id = arena.next_id.max(id.0 + 1);
            arena.plans.insert(id, plan);
        }
        arena
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// All plans in id order, invalidated ones included.
    pub fn iter(&self) -> impl Iterator<Item = &AbstractPlan> {
        self.plans.values()
    }

    pub fn get(&self, id: PlanId) -> Option<&AbstractPlan> {
        self.plans.get(&id)
    }

    /// Look up an active plan by name.
    pub fn get_by_name(&self, name: &str) -> Option<&AbstractPlan> {
        self.names.get(name).and_then(|id| self.plans.get(id))
    }

    pub fn require(&self, id: PlanId) -> Result<&AbstractPlan> {
        self.get(id).ok_or_else(|| StrataError::plan_not_found(id))
    }

    pub fn require_by_name(&self, name: &str) -> Result<&AbstractPlan> {
        self.get_by_name(name)
            .ok_or_else(|| StrataError::plan_not_found(name))
    }

    /// Look up a plan by active name, falling back to its numeric id. A
    /// removed plan is only reachable by id.
    pub fn find(&self, reference: &str) -> Result<&AbstractPlan> {
        self.get_by_name(reference)
            .or_else(|| {
                reference
                    .parse::<u64>()
                    .ok()
                    .and_then(|id| self.get(PlanId(id)))
            })
            .ok_or_else(|| StrataError::plan_not_found(reference))
    }

    fn require_mut(&mut self, id: PlanId) -> Result<&mut AbstractPlan> {
        self.plans
            .get_mut(&id)
            .ok_or_else(|| StrataError::plan_not_found(id))
    }

    fn require_composite(&self, id: PlanId) -> Result<&CompositePlan> {
        match self.require(id)? {
            AbstractPlan::Composite(composite) => Ok(composite),
            AbstractPlan::Plan(plan) => Err(StrataError::invalid_input("workflow")
                .with_reason(format!("'{}' is not a composite workflow", plan.name))),
        }
    }

    fn require_composite_mut(&mut self, id: PlanId) -> Result<&mut CompositePlan> {
        match self.require_mut(id)? {
            AbstractPlan::Composite(composite) => Ok(composite),
            AbstractPlan::Plan(plan) => Err(StrataError::invalid_input("workflow")
                .with_reason(format!("'{}' is not a composite workflow", plan.name))),
        }
    }

    /// Register an atomic plan and return its id.
    pub fn add_plan(&mut self, plan: Plan) -> Result<PlanId> {
        self.insert(AbstractPlan::Plan(plan))
    }

    /// Register an empty composite and return its id. Steps, mappings and
    /// links are added afterwards so that each one is validated.
    pub fn add_composite(&mut self, composite: CompositePlan) -> Result<PlanId> {
        if !composite.steps.is_empty()
            || !composite.mappings.is_empty()
            || !composite.links.is_empty()
        {
            return Err(StrataError::invalid_input("composite").with_reason(
                "new composites must be empty; use add_step, add_mapping and add_link",
            ));
        }
        self.insert(AbstractPlan::Composite(composite))
    }

    fn insert(&mut self, mut plan: AbstractPlan) -> Result<PlanId> {
        validate_name(plan.name())?;
        if self.names.contains_key(plan.name()) {
            return Err(StrataError::invalid_input("name")
                .with_reason(format!("a workflow named '{}' already exists", plan.name())));
        }
        if let AbstractPlan::Plan(atomic) = &plan {
            let mut seen = BTreeSet::new();
            for parameter in atomic.all_parameters() {
                if !seen.insert(parameter.name.as_str()) {
                    return Err(StrataError::DuplicateParameterName {
                        owner: atomic.name.clone(),
                        name: parameter.name.clone(),
                    });
                }
            }
        }

        let id = PlanId(self.next_id);
        self.next_id += 1;
        plan.set_id(id);

        debug!("Registered {} '{}' as {}", plan.kind(), plan.name(), id);
        self.names.insert(plan.name().to_string(), id);
        self.plans.insert(id, plan);
        Ok(id)
    }

    /// Add an input, output or parameter to an atomic plan.
    ///
    /// # Errors
    ///
    /// - `DuplicateParameterName` if the plan already has an entity with the
    ///   same name
    /// - `InvalidInput` if `owner` is a composite (composites expose values
    ///   through mappings)
    pub fn create_parameter(
        &mut self,
        owner: PlanId,
        parameter: CommandParameter,
    ) -> Result<ParameterRef> {
        let reference = ParameterRef::parameter(owner, parameter.name.clone());
        match self.require_mut(owner)? {
            AbstractPlan::Plan(plan) => plan.add_parameter(parameter)?,
            AbstractPlan::Composite(composite) => {
                return Err(StrataError::invalid_input("owner").with_reason(format!(
                    "'{}' is a composite; expose values with a mapping instead",
                    composite.name
                )))
            }
        }
        Ok(reference)
    }

    /// Append `step` to the steps of `composite`.
    ///
    /// # Errors
    ///
    /// - `CyclicWorkflow` if `step` is `composite` or transitively contains
    ///   it
    /// - `InvalidInput` if the step is already part of the composite or has
    ///   been removed
    pub fn add_step(&mut self, composite: PlanId, step: PlanId) -> Result<()> {
        let parent = self.require_composite(composite)?;
        let child = self.require(step)?;

        if step == composite || self.contains(step, composite) {
            return Err(StrataError::CyclicWorkflow {
                workflow: parent.name.clone(),
                reason: format!("'{}' contains '{}'", child.name(), parent.name),
            });
        }
        if parent.has_step(step) {
            return Err(StrataError::invalid_input("step").with_reason(format!(
                "'{}' is already a step of '{}'",
                child.name(),
                parent.name
            )));
        }
        if child.invalidated_at().is_some() {
            return Err(StrataError::invalid_input("step")
                .with_reason(format!("'{}' has been removed", child.name())));
        }

        self.require_composite_mut(composite)?.steps.push(step);
        Ok(())
    }

    /// Whether `target` is reachable from `ancestor` through steps. A plan
    /// does not contain itself.
    pub fn contains(&self, ancestor: PlanId, target: PlanId) -> bool {
        let mut stack = vec![ancestor];
        let mut visited = BTreeSet::new();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(AbstractPlan::Composite(composite)) = self.plans.get(&id) {
                for step in &composite.steps {
                    if *step == target {
                        return true;
                    }
                    stack.push(*step);
                }
            }
        }
        false
    }

    /// Add a mapping to `composite` fanning out to `mapped_parameters`.
    ///
    /// # Errors
    ///
    /// - `DuplicateParameterName` if the composite already has a mapping
    ///   named `name`
    /// - `ParameterNotFound` if a target is not on a direct child
    pub fn add_mapping(
        &mut self,
        composite: PlanId,
        name: &str,
        mapped_parameters: Vec<ParameterRef>,
        default_value: Option<Value>,
    ) -> Result<ParameterRef> {
        let parent = self.require_composite(composite)?;
        if parent.mapping(name).is_some() {
            return Err(StrataError::DuplicateParameterName {
                owner: parent.name.clone(),
                name: name.to_string(),
            });
        }
        if mapped_parameters.is_empty() {
            return Err(StrataError::invalid_input("mapped_parameters")
                .with_reason(format!("mapping '{name}' must map at least one parameter")));
        }
        for target in &mapped_parameters {
            self.check_child_endpoint(parent, target)?;
        }

        debug!(
            "Added mapping '{}' to '{}' with {} target(s)",
            name,
            parent.name,
            mapped_parameters.len()
        );
        self.require_composite_mut(composite)?
            .mappings
            .push(ParameterMapping::new(name, mapped_parameters, default_value));
        Ok(ParameterRef::mapping(composite, name))
    }

    /// Attach a description to an existing mapping.
    pub fn set_mapping_description(
        &mut self,
        composite: PlanId,
        name: &str,
        description: &str,
    ) -> Result<()> {
        let parent = self.require_composite_mut(composite)?;
        let workflow = parent.name.clone();
        let mapping = parent
            .mapping_mut(name)
            .ok_or_else(|| StrataError::ParameterNotFound {
                workflow,
                name: name.to_string(),
            })?;
        mapping.description = Some(description.to_string());
        Ok(())
    }

    /// Wire `source` to every sink in `sinks` inside `composite`.
    ///
    /// # Errors
    ///
    /// - `ParameterNotFound` if an endpoint is not on a direct child
    /// - `InvalidLinkDirection` if the source is not output-class or a sink
    ///   is
    /// - `CyclicWorkflow` if the link closes a cycle through existing links
    pub fn add_link(
        &mut self,
        composite: PlanId,
        source: ParameterRef,
        sinks: Vec<ParameterRef>,
    ) -> Result<()> {
        let parent = self.require_composite(composite)?;

        self.check_child_endpoint(parent, &source)?;
        for sink in &sinks {
            self.check_child_endpoint(parent, sink)?;
        }

        if sinks.is_empty() {
            return Err(StrataError::InvalidLinkDirection {
                workflow: parent.name.clone(),
                reason: format!("link from '{}' has no sinks", self.describe(&source)),
            });
        }
        if !self.is_output_class(&source)? {
            return Err(StrataError::InvalidLinkDirection {
                workflow: parent.name.clone(),
                reason: format!("source '{}' is not an output", self.describe(&source)),
            });
        }
        for sink in &sinks {
            if self.has_output_leaf(sink)? {
                return Err(StrataError::InvalidLinkDirection {
                    workflow: parent.name.clone(),
                    reason: format!("sink '{}' is an output", self.describe(sink)),
                });
            }
        }

        let link = ParameterLink::new(source, sinks);
        if let Some(step) = graph::first_link_cycle(parent.links.iter().chain([&link])) {
            let step_name = self
                .get(step)
                .map_or_else(|| step.to_string(), |p| p.name().to_string());
            return Err(StrataError::CyclicWorkflow {
                workflow: parent.name.clone(),
                reason: format!("links form a cycle through step '{step_name}'"),
            });
        }

        debug!(
            "Linked '{}' to {} sink(s) in '{}'",
            self.describe(&link.source),
            link.sinks.len(),
            parent.name
        );
        self.require_composite_mut(composite)?.links.push(link);
        Ok(())
    }

    /// Mark a plan as removed. It keeps its id so activities and composites
    /// that reference it still resolve, but its name becomes free.
    pub fn invalidate(&mut self, id: PlanId) -> Result<()> {
        let plan = self.require_mut(id)?;
        if plan.invalidated_at().is_none() {
            plan.invalidate(Timestamp::now());
            let name = plan.name().to_string();
            self.names.remove(&name);
        }
        Ok(())
    }

    /// Active composites that use `id` as a direct step.
    pub fn parents_of(&self, id: PlanId) -> Vec<&CompositePlan> {
        self.plans
            .values()
            .filter_map(AbstractPlan::as_composite)
            .filter(|c| c.invalidated_at.is_none() && c.has_step(id))
            .collect()
    }

    /// Direct step of `composite` called `name`.
    pub fn find_step(&self, composite: &CompositePlan, name: &str) -> Option<PlanId> {
        composite
            .steps
            .iter()
            .copied()
            .find(|id| self.get(*id).is_some_and(|p| p.name() == name))
    }

    pub fn parameter(&self, reference: &ParameterRef) -> Option<&CommandParameter> {
        match reference {
            ParameterRef::Parameter { plan, name } => self
                .get(*plan)
                .and_then(AbstractPlan::as_plan)
                .and_then(|p| p.parameter(name)),
            ParameterRef::Mapping { .. } => None,
        }
    }

    pub fn mapping(&self, reference: &ParameterRef) -> Option<&ParameterMapping> {
        match reference {
            ParameterRef::Mapping { plan, name } => self
                .get(*plan)
                .and_then(AbstractPlan::as_composite)
                .and_then(|c| c.mapping(name)),
            ParameterRef::Parameter { .. } => None,
        }
    }

    /// Whether `reference` names an existing parameter or mapping.
    pub fn exists(&self, reference: &ParameterRef) -> bool {
        self.parameter(reference).is_some() || self.mapping(reference).is_some()
    }

    /// Current runtime value of a parameter or mapping.
    pub fn actual_value(&self, reference: &ParameterRef) -> Option<&Value> {
        match reference {
            ParameterRef::Parameter { .. } => {
                self.parameter(reference).and_then(|p| p.actual_value())
            }
            ParameterRef::Mapping { .. } => self.mapping(reference).and_then(|m| m.actual_value()),
        }
    }

    /// Default value of a parameter or mapping.
    pub fn default_value(&self, reference: &ParameterRef) -> Option<&Value> {
        match reference {
            ParameterRef::Parameter { .. } => self
                .parameter(reference)
                .and_then(|p| p.default_value.as_ref()),
            ParameterRef::Mapping { .. } => self
                .mapping(reference)
                .and_then(|m| m.default_value.as_ref()),
        }
    }

    /// Leaf parameters reached from `reference`, expanding mappings.
    pub fn leaves(&self, reference: &ParameterRef) -> Result<Vec<&CommandParameter>> {
        let mut leaves = Vec::new();
        let mut stack = vec![reference];
        while let Some(current) = stack.pop() {
            match current {
                ParameterRef::Parameter { .. } => {
                    leaves.push(self.parameter(current).ok_or_else(|| {
                        self.parameter_not_found(current)
                    })?);
                }
                ParameterRef::Mapping { .. } => {
                    let mapping = self
                        .mapping(current)
                        .ok_or_else(|| self.parameter_not_found(current))?;
                    stack.extend(mapping.mapped_parameters.iter().rev());
                }
            }
        }
        Ok(leaves)
    }

    /// Atomic plans under `id`, each once, in step order.
    pub fn leaf_plans(&self, id: PlanId) -> Vec<&Plan> {
        let mut plans = Vec::new();
        let mut seen = BTreeSet::new();
        self.collect_leaf_plans(id, &mut seen, &mut plans);
        plans
    }

    fn collect_leaf_plans<'a>(
        &'a self,
        id: PlanId,
        seen: &mut BTreeSet<PlanId>,
        plans: &mut Vec<&'a Plan>,
    ) {
        if !seen.insert(id) {
            return;
        }
        match self.plans.get(&id) {
            Some(AbstractPlan::Plan(plan)) => plans.push(plan),
            Some(AbstractPlan::Composite(composite)) => {
                for step in &composite.steps {
                    self.collect_leaf_plans(*step, seen, plans);
                }
            }
            None => {}
        }
    }

    /// Every leaf parameter under `id` with the plan that owns it.
    pub fn leaf_parameters(&self, id: PlanId) -> Vec<(&Plan, &CommandParameter)> {
        self.leaf_plans(id)
            .into_iter()
            .flat_map(|plan| plan.all_parameters().map(move |p| (plan, p)))
            .collect()
    }

    /// Resolve `values` against plan `id` and store the resulting values in
    /// the arena, so every composite sharing a step sees them.
    pub fn resolve(&mut self, id: PlanId, values: &Values) -> Result<Resolution> {
        let resolution = ValueResolver::new(self).resolve(id, values)?;
        self.apply_resolution(&resolution);
        Ok(resolution)
    }

    /// Re-run link propagation for the tree under `id` and store the result.
    pub fn propagate_links(&mut self, id: PlanId) -> Result<Resolution> {
        let resolution = ValueResolver::new(self).propagate_links(id)?;
        self.apply_resolution(&resolution);
        Ok(resolution)
    }

    /// Write resolved values onto the referenced parameters and mappings.
    /// References that no longer exist are skipped.
    pub fn apply_resolution(&mut self, resolution: &Resolution) {
        for (reference, value) in &resolution.values {
            match reference {
                ParameterRef::Parameter { plan, name } => {
                    if let Some(AbstractPlan::Plan(plan)) = self.plans.get_mut(plan) {
                        if let Some(parameter) = plan.parameter_mut(name) {
                            parameter.set_actual_value(value.clone());
                        }
                    }
                }
                ParameterRef::Mapping { plan, name } => {
                    if let Some(AbstractPlan::Composite(composite)) = self.plans.get_mut(plan) {
                        if let Some(mapping) = composite.mapping_mut(name) {
                            mapping.set_actual_value(value.clone());
                        }
                    }
                }
            }
        }
    }

    /// Human-readable `step.entity` form of a reference.
    pub fn describe(&self, reference: &ParameterRef) -> String {
        let owner = self
            .get(reference.plan_id())
            .map_or_else(|| reference.plan_id().to_string(), |p| p.name().to_string());
        format!("{owner}.{}", reference.name())
    }

    fn parameter_not_found(&self, reference: &ParameterRef) -> StrataError {
        StrataError::ParameterNotFound {
            workflow: self
                .get(reference.plan_id())
                .map_or_else(|| reference.plan_id().to_string(), |p| p.name().to_string()),
            name: reference.name().to_string(),
        }
    }

    fn check_child_endpoint(&self, parent: &CompositePlan, reference: &ParameterRef) -> Result<()> {
        if parent.has_step(reference.plan_id()) && self.exists(reference) {
            Ok(())
        } else {
            Err(StrataError::ParameterNotFound {
                workflow: parent.name.clone(),
                name: self.describe(reference),
            })
        }
    }

    /// An output, or a mapping whose leaves are all outputs.
    fn is_output_class(&self, reference: &ParameterRef) -> Result<bool> {
        let leaves = self.leaves(reference)?;
        Ok(!leaves.is_empty() && leaves.iter().all(|p| p.kind == ParameterKind::Output))
    }

    fn has_output_leaf(&self, reference: &ParameterRef) -> Result<bool> {
        Ok(self
            .leaves(reference)?
            .iter()
            .any(|p| p.kind == ParameterKind::Output))
    }
}
