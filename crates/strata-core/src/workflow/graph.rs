use std::collections::{BTreeMap, BTreeSet};

use crate::models::{ParameterLink, PlanId};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Find a cycle in the step graph induced by `links` (source step to sink
/// step). Returns a step on the cycle. A link whose source and sink share a
/// step is a cycle on its own.
pub(super) fn first_link_cycle<'a>(
    links: impl IntoIterator<Item = &'a ParameterLink>,
) -> Option<PlanId> {
    let mut edges: BTreeMap<PlanId, BTreeSet<PlanId>> = BTreeMap::new();
    for link in links {
        let from = link.source.plan_id();
        for sink in &link.sinks {
            edges.entry(from).or_default().insert(sink.plan_id());
        }
    }

    let mut marks: BTreeMap<PlanId, Mark> = BTreeMap::new();
    for start in edges.keys() {
        if let Some(step) = visit(*start, &edges, &mut marks) {
            return Some(step);
        }
    }
    None
}

fn visit(
    node: PlanId,
    edges: &BTreeMap<PlanId, BTreeSet<PlanId>>,
    marks: &mut BTreeMap<PlanId, Mark>,
) -> Option<PlanId> {
    match marks.get(&node) {
        Some(Mark::Visiting) => return Some(node),
        Some(Mark::Done) => return None,
        None => {}
    }

    marks.insert(node, Mark::Visiting);
    if let Some(next) = edges.get(&node) {
        for target in next {
            if let Some(step) = visit(*target, edges, marks) {
                return Some(step);
            }
        }
    }
    marks.insert(node, Mark::Done);
    None
}
