//! Link propagation: the last and strongest resolution tier.

use log::debug;

use super::ValueResolver;
use crate::{
    error::Result,
    models::{AbstractPlan, ParameterRef, PlanId, Value},
};

impl ValueResolver<'_> {
    /// Copy each link source's value onto its sinks, nested composites
    /// first. A source without any value leaves its sinks alone.
    pub(super) fn apply_links(&mut self, id: PlanId) -> Result<()> {
        let arena = self.arena;
        let AbstractPlan::Composite(composite) = arena.require(id)? else {
            return Ok(());
        };

        for step in &composite.steps {
            self.apply_links(*step)?;
        }

        for link in &composite.links {
            let Some(value) = self.effective(&link.source) else {
                debug!(
                    "Link source '{}' has no value; sinks left unchanged",
                    arena.describe(&link.source)
                );
                continue;
            };
            for sink in &link.sinks {
                self.assign(sink, &value);
            }
        }
        Ok(())
    }

    /// Actual value, else default. A mapping with neither reads through to
    /// its first target.
    fn effective(&self, reference: &ParameterRef) -> Option<Value> {
        if let Some(value) = self
            .actual(reference)
            .or_else(|| self.arena.default_value(reference))
        {
            return Some(value.clone());
        }

        self.arena
            .mapping(reference)
            .and_then(|m| m.mapped_parameters.first())
            .and_then(|target| self.effective(target))
    }
}
