//! Runtime value resolution for plans.
//!
//! Resolution merges user-supplied [`Values`] with the static defaults of a
//! plan tree. Precedence, from lowest to highest:
//!
//! 1. default value of a parameter
//! 2. default value of a mapping that reaches the parameter
//! 3. value supplied to such a mapping
//! 4. value supplied to the parameter itself
//! 5. value propagated from the source of a link
//!
//! The resolver never mutates the arena. It reads the arena and records
//! every assignment in an accumulating map keyed by [`ParameterRef`]; the
//! finished [`Resolution`] is merged back with
//! [`PlanArena::apply_resolution`](crate::workflow::PlanArena::apply_resolution).

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::{
    error::{Result, StrataError},
    models::{
        AbstractPlan, CompositePlan, ParameterRef, Plan, PlanId, Value, ValueEntry, Values,
    },
    workflow::PlanArena,
};

mod links;


/// Values assigned by one resolution pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Root of the resolved tree
    pub plan_id: PlanId,

    /// Every parameter and mapping that received a value
    pub values: BTreeMap<ParameterRef, Value>,

    /// Supplied names that matched nothing, dotted by step
    pub missing_parameters: BTreeSet<String>,
}

impl Resolution {
    pub fn value(&self, reference: &ParameterRef) -> Option<&Value> {
        self.values.get(reference)
    }

    /// Whether every supplied value found a target.
    pub fn is_complete(&self) -> bool {
        self.missing_parameters.is_empty()
    }
}

/// Resolves a plan tree against supplied values.
pub struct ValueResolver<'a> {
    arena: &'a PlanArena,
    resolved: BTreeMap<ParameterRef, Value>,
}

impl<'a> ValueResolver<'a> {
    pub fn new(arena: &'a PlanArena) -> Self {
        Self {
            arena,
            resolved: BTreeMap::new(),
        }
    }

    /// Resolve plan `id` with `values`, then apply links across the tree.
    ///
    /// # Errors
    ///
    /// - `PlanNotFound` if `id` is not in the arena
    /// - `ChildWorkflowNotFound` if a nested block names a step that does
    ///   not exist
    pub fn resolve(mut self, id: PlanId, values: &Values) -> Result<Resolution> {
        let missing = self.resolve_plan(id, values)?;
        self.apply_links(id)?;

        if !missing.is_empty() {
            debug!(
                "Values did not match any parameter: {}",
                missing.iter().cloned().collect::<Vec<_>>().join(", ")
            );
        }
        Ok(self.finish(id, missing))
    }

    /// Apply only the links of the tree under `id`, on top of the values the
    /// arena already holds.
    pub fn propagate_links(mut self, id: PlanId) -> Result<Resolution> {
        self.apply_links(id)?;
        Ok(self.finish(id, BTreeSet::new()))
    }

    fn finish(self, plan_id: PlanId, missing_parameters: BTreeSet<String>) -> Resolution {
        Resolution {
            plan_id,
            values: self.resolved,
            missing_parameters,
        }
    }

    fn resolve_plan(&mut self, id: PlanId, values: &Values) -> Result<BTreeSet<String>> {
        let arena = self.arena;
        match arena.require(id)? {
            AbstractPlan::Plan(plan) => Ok(self.resolve_leaf(plan, values)),
            AbstractPlan::Composite(composite) => self.resolve_composite(composite, values),
        }
    }

    /// Set every entity named in `values`; anything else is missing.
    /// Defaults are left alone.
    fn resolve_leaf(&mut self, plan: &Plan, values: &Values) -> BTreeSet<String> {
        let mut missing = BTreeSet::new();
        for key in values.keys() {
            match values.get(key) {
                Some(ValueEntry::Literal(value)) if plan.parameter(key).is_some() => {
                    self.set(ParameterRef::parameter(plan.id, key.as_str()), value.clone());
                }
                _ => {
                    missing.insert(key.clone());
                }
            }
        }
        missing
    }

    fn resolve_composite(
        &mut self,
        composite: &CompositePlan,
        values: &Values,
    ) -> Result<BTreeSet<String>> {
        let arena = self.arena;
        let mut missing = BTreeSet::new();

        debug!("Resolving composite '{}'", composite.name);

        // Values addressed to this composite's mappings
        for (key, value) in values.literals() {
            if composite.mapping(key).is_some() {
                self.assign(&ParameterRef::mapping(composite.id, key.as_str()), value);
            } else {
                missing.insert(key.clone());
            }
        }

        // Blocks addressed to child steps
        let mut addressed = BTreeSet::new();
        for (key, block) in values.nested() {
            let step = arena.find_step(composite, key).ok_or_else(|| {
                StrataError::ChildWorkflowNotFound {
                    name: key.clone(),
                    parent: composite.name.clone(),
                }
            })?;
            let child_missing = self.resolve_plan(step, block)?;
            missing.extend(child_missing.into_iter().map(|name| format!("{key}.{name}")));
            addressed.insert(step);
        }

        // Nested composites still need their own mapping defaults
        for step in &composite.steps {
            if addressed.contains(step) {
                continue;
            }
            if let Some(AbstractPlan::Composite(_)) = arena.get(*step) {
                self.resolve_plan(*step, &Values::new())?;
            }
        }

        for mapping in &composite.mappings {
            let reference = ParameterRef::mapping(composite.id, mapping.name.as_str());
            if self.actual(&reference).is_some() {
                continue;
            }
            if let Some(default) = &mapping.default_value {
                self.push_default(&reference, default);
            }
        }

        Ok(missing)
    }

    /// Set a parameter or mapping; a mapping forwards the value to all of
    /// its targets, overwriting them.
    fn assign(&mut self, reference: &ParameterRef, value: &Value) {
        self.set(reference.clone(), value.clone());

        let arena = self.arena;
        if let Some(mapping) = arena.mapping(reference) {
            for target in &mapping.mapped_parameters {
                self.assign(target, value);
            }
        }
    }

    /// Push a mapping default down its targets. Mappings on the way are set
    /// when unset and always traversed; leaves keep any value they have.
    fn push_default(&mut self, reference: &ParameterRef, default: &Value) {
        if self.actual(reference).is_none() {
            self.set(reference.clone(), default.clone());
        }

        let arena = self.arena;
        let Some(mapping) = arena.mapping(reference) else {
            return;
        };
        for target in &mapping.mapped_parameters {
            if target.is_mapping() {
                self.push_default(target, default);
            } else if self.actual(target).is_none() {
                self.set(target.clone(), default.clone());
            }
        }
    }

    /// Current actual value: this pass first, then whatever the arena holds.
    fn actual(&self, reference: &ParameterRef) -> Option<&Value> {
        self.resolved
            .get(reference)
            .or_else(|| self.arena.actual_value(reference))
    }

    fn set(&mut self, reference: ParameterRef, value: Value) {
        self.resolved.insert(reference, value);
    }
}
