//! In-memory activity repository and the lineage graph derived from it.
//!
//! No edges are stored. Activity A precedes activity B when a path generated
//! by A is related to a path used by B: the same path, or one a directory
//! containing the other (`some/` feeds `some/data`, `other/data/file` feeds
//! `other/data`). The store keeps a path index in both directions so that
//! neighbours are found without scanning every activity.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::models::{Activity, ActivityId};

#[cfg(test)]
mod tests;

/// Direction of a lineage query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Follow generated paths to the activities that use them
    Downstream,
    /// Follow used paths back to the activities that generated them
    Upstream,
}

/// A sequence of activities ordered from nearest to farthest.
pub type ActivityChain = Vec<ActivityId>;

#[derive(Debug, Clone, Default)]
pub struct ActivityStore {
    activities: BTreeMap<ActivityId, Activity>,
    /// path → activities that used it
    consumers: HashMap<String, BTreeSet<ActivityId>>,
    /// path → activities that generated it
    producers: HashMap<String, BTreeSet<ActivityId>>,
}

impl ActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_activities(activities: impl IntoIterator<Item = Activity>) -> Self {
        let mut store = Self::new();
        for activity in activities {
            store.add(activity);
        }
        store
    }

    /// Insert an activity and index its paths. Activities are immutable, so
    /// an id that is already present is ignored and `false` returned.
    pub fn add(&mut self, activity: Activity) -> bool {
        if self.activities.contains_key(&activity.id) {
            warn!("Activity {} is already recorded", activity.id);
            return false;
        }

        for path in &activity.usages {
            self.consumers
                .entry(path.clone())
                .or_default()
                .insert(activity.id);
        }
        for path in &activity.generations {
            self.producers
                .entry(path.clone())
                .or_default()
                .insert(activity.id);
        }
        self.activities.insert(activity.id, activity);
        true
    }

    pub fn get(&self, id: ActivityId) -> Option<&Activity> {
        self.activities.get(&id)
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Activities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.activities.values()
    }

    /// Activities that used a path generated by `id`.
    pub fn get_downstream_activities(&self, id: ActivityId) -> Vec<&Activity> {
        self.lookup(self.neighbours(id, Direction::Downstream))
    }

    /// Activities that generated a path used by `id`.
    pub fn get_upstream_activities(&self, id: ActivityId) -> Vec<&Activity> {
        self.lookup(self.neighbours(id, Direction::Upstream))
    }

    /// Every chain of activities reachable downstream of `id`, one per
    /// reachable prefix: A→B→C yields `[B]` and `[B, C]`.
    pub fn get_downstream_activity_chains(&self, id: ActivityId) -> Vec<ActivityChain> {
        self.chains(id, Direction::Downstream)
    }

    /// Upstream counterpart of
    /// [`get_downstream_activity_chains`](Self::get_downstream_activity_chains).
    pub fn get_upstream_activity_chains(&self, id: ActivityId) -> Vec<ActivityChain> {
        self.chains(id, Direction::Upstream)
    }

    /// Immediate neighbours of `id` in `direction`, excluding `id` itself.
    /// Unknown ids have no neighbours.
    pub fn neighbours(&self, id: ActivityId, direction: Direction) -> BTreeSet<ActivityId> {
        let Some(activity) = self.activities.get(&id) else {
            return BTreeSet::new();
        };

        let (paths, index) = match direction {
            Direction::Downstream => (&activity.generations, &self.consumers),
            Direction::Upstream => (&activity.usages, &self.producers),
        };

        paths
            .iter()
            .flat_map(|path| related_ids(index, path))
            .filter(|other| *other != id)
            .collect()
    }

    /// Depth-first enumeration of chains starting next to `id`. Each chain
    /// keeps its own visited set, so a cycle ends the chain instead of
    /// looping while diamonds still report every distinct chain.
    pub fn chains(&self, id: ActivityId, direction: Direction) -> Vec<ActivityChain> {
        let mut chains = Vec::new();
        if !self.activities.contains_key(&id) {
            return chains;
        }

        let mut current = Vec::new();
        let mut on_path = BTreeSet::from([id]);
        self.walk(id, direction, &mut current, &mut on_path, &mut chains);
        chains
    }

    fn walk(
        &self,
        id: ActivityId,
        direction: Direction,
        current: &mut ActivityChain,
        on_path: &mut BTreeSet<ActivityId>,
        chains: &mut Vec<ActivityChain>,
    ) {
        for next in self.neighbours(id, direction) {
            if !on_path.insert(next) {
                continue;
            }
            current.push(next);
            chains.push(current.clone());

            self.walk(next, direction, current, on_path, chains);

            current.pop();
            on_path.remove(&next);
        }
    }

    /// Every path used by some activity, sorted.
    pub fn get_all_usage_paths(&self) -> Vec<&str> {
        sorted_keys(&self.consumers)
    }

    /// Every path generated by some activity, sorted.
    pub fn get_all_generation_paths(&self) -> Vec<&str> {
        sorted_keys(&self.producers)
    }

    /// Activities that used or generated `path` or a path related to it, in
    /// id order.
    pub fn get_activities_by_path(&self, path: &str) -> Vec<&Activity> {
        let ids: BTreeSet<ActivityId> = [&self.consumers, &self.producers]
            .into_iter()
            .flat_map(|index| related_ids(index, path))
            .collect();
        self.lookup(ids)
    }

    fn lookup(&self, ids: BTreeSet<ActivityId>) -> Vec<&Activity> {
        ids.into_iter()
            .filter_map(|id| self.activities.get(&id))
            .collect()
    }
}

/// Ids indexed under `path` or under any path related to it.
fn related_ids<'a>(
    index: &'a HashMap<String, BTreeSet<ActivityId>>,
    path: &'a str,
) -> impl Iterator<Item = ActivityId> + 'a {
    index
        .iter()
        .filter(move |(other, _)| are_paths_related(path, other))
        .flat_map(|(_, ids)| ids.iter().copied())
}

fn sorted_keys(index: &HashMap<String, BTreeSet<ActivityId>>) -> Vec<&str> {
    let mut keys: Vec<&str> = index.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

/// Whether two paths are equal or one lies inside the other as a directory.
pub fn are_paths_related(a: &str, b: &str) -> bool {
    let (a, b) = (Path::new(a), Path::new(b));
    a.starts_with(b) || b.starts_with(a)
}

/// Keep the paths related to at least one of `filters`. No filters keeps
/// everything.
pub fn filter_related_paths<'a>(paths: Vec<&'a str>, filters: &[String]) -> Vec<&'a str> {
    if filters.is_empty() {
        return paths;
    }
    paths
        .into_iter()
        .filter(|path| filters.iter().any(|f| are_paths_related(path, f)))
        .collect()
}
