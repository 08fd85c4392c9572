//! Activity recording and lineage queries.

use std::collections::BTreeSet;

use jiff::Timestamp;
use log::info;

use super::Project;
use crate::{
    activity::{filter_related_paths, Direction},
    display::{ActivityDetails, LineageResult},
    error::{Result, StrataError},
    gateway::Gateway,
    models::{Activity, ActivityId, NewActivity, PlanId, Values},
    params::{Id, Lineage, ListPaths, RecordActivity},
    workflow::PlanArena,
};

/// Union of the resolved paths of every leaf plan under `id`. Paths generated
/// inside the workflow are intermediate and not counted as usages.
fn resolved_activity(
    arena: &PlanArena,
    id: PlanId,
    started_at: Timestamp,
    ended_at: Timestamp,
) -> NewActivity {
    let mut usages = BTreeSet::new();
    let mut generations = BTreeSet::new();
    for plan in arena.leaf_plans(id) {
        let leaf = NewActivity::from_resolved(plan, started_at, ended_at);
        usages.extend(leaf.usages);
        generations.extend(leaf.generations);
    }
    usages.retain(|path| !generations.contains(path));

    NewActivity::new(id, started_at, ended_at)
        .with_usages(usages)
        .with_generations(generations)
}

/// Store an execution of the workflow `params.plan`.
pub fn record<G: Gateway + ?Sized>(
    gateway: &mut G,
    params: &RecordActivity,
    values: &Values,
) -> Result<Activity> {
    let now = Timestamp::now();
    let started_at = params.started_at.unwrap_or(now);
    let ended_at = params.ended_at.unwrap_or(now);
    if ended_at < started_at {
        return Err(StrataError::invalid_input("ended_at")
            .with_reason(format!("{ended_at} is before the start time {started_at}")));
    }

    let mut arena = gateway.load_arena()?;
    let id = arena.require_by_name(&params.plan)?.id();

    let activity = if params.has_explicit_paths() {
        NewActivity::new(id, started_at, ended_at)
            .with_usages(params.usages.iter().map(String::as_str))
            .with_generations(params.generations.iter().map(String::as_str))
    } else {
        arena.resolve(id, values)?;
        resolved_activity(&arena, id, started_at, ended_at)
    };

    let activity = gateway.add_activity(&activity)?;
    info!(
        "Recorded activity {} of '{}' ({} used, {} generated)",
        activity.id,
        params.plan,
        activity.usages.len(),
        activity.generations.len()
    );
    Ok(activity)
}

/// Direct neighbours or full chains from one activity.
///
/// Unlike the store queries, an unknown id is an `ActivityNotFound` error so
/// that interfaces can tell it apart from an activity without lineage.
pub fn lineage<G: Gateway + ?Sized>(gateway: &G, params: &Lineage) -> Result<LineageResult> {
    let store = gateway.load_activities()?;
    let id = ActivityId(params.id);
    if store.get(id).is_none() {
        return Err(StrataError::ActivityNotFound { id: params.id });
    }

    let result = if params.chains {
        LineageResult::Chains {
            direction: params.direction,
            origin: id,
            chains: store.chains(id, params.direction),
        }
    } else {
        let neighbours = match params.direction {
            Direction::Downstream => store.get_downstream_activities(id),
            Direction::Upstream => store.get_upstream_activities(id),
        };
        LineageResult::Neighbours {
            direction: params.direction,
            origin: id,
            activities: neighbours.into_iter().cloned().collect(),
        }
    };
    Ok(result)
}

impl Project {
    /// Record a finished execution of a workflow.
    pub async fn record_activity(&self, params: &RecordActivity) -> Result<Activity> {
        let params = params.clone();

        self.with_gateway(move |gateway| {
            let values = params.overrides.load()?;
            record(gateway, &params, &values)
        })
        .await
    }

    /// Show one activity with the name of its workflow.
    pub async fn show_activity(&self, params: &Id) -> Result<ActivityDetails> {
        let id = params.id;

        self.with_gateway(move |gateway| {
            let store = gateway.load_activities()?;
            let activity = store
                .get(ActivityId(id))
                .cloned()
                .ok_or(StrataError::ActivityNotFound { id })?;
            let plan = gateway.get_by_id(activity.plan_id)?;
            Ok(ActivityDetails::new(activity, plan))
        })
        .await
    }

    /// Activities that used or generated `path`, or every activity.
    pub async fn list_activities(&self, path: Option<&str>) -> Result<Vec<Activity>> {
        let path = path.map(ToString::to_string);

        self.with_gateway(move |gateway| match path {
            Some(path) => gateway.get_activities_by_path(&path),
            None => Ok(gateway.load_activities()?.iter().cloned().collect()),
        })
        .await
    }

    pub async fn lineage(&self, params: &Lineage) -> Result<LineageResult> {
        let params = params.clone();

        self.with_gateway(move |gateway| lineage(gateway, &params))
            .await
    }

    /// Every path some activity used, optionally restricted to related paths.
    pub async fn list_usage_paths(&self, params: &ListPaths) -> Result<Vec<String>> {
        self.list_paths(params, false).await
    }

    /// Every path some activity generated, optionally restricted to related
    /// paths.
    pub async fn list_generation_paths(&self, params: &ListPaths) -> Result<Vec<String>> {
        self.list_paths(params, true).await
    }

    async fn list_paths(&self, params: &ListPaths, generated: bool) -> Result<Vec<String>> {
        let filters = params.paths.clone();

        self.with_gateway(move |gateway| {
            let store = gateway.load_activities()?;
            let paths = if generated {
                store.get_all_generation_paths()
            } else {
                store.get_all_usage_paths()
            };
            Ok(filter_related_paths(paths, &filters)
                .into_iter()
                .map(ToString::to_string)
                .collect())
        })
        .await
    }
}
