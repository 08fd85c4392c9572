//! Execution records.

use std::{collections::BTreeSet, fmt};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{CommandParameter, Plan, PlanId};

/// Sequence number of a recorded activity. Ordering follows recording order.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(transparent)]
pub struct ActivityId(pub u64);

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One past execution of a plan and the paths it touched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: ActivityId,

    /// Plan that was executed
    pub plan_id: PlanId,

    /// Paths consumed by the run
    pub usages: BTreeSet<String>,

    /// Paths produced by the run
    pub generations: BTreeSet<String>,

    pub started_at: Timestamp,

    pub ended_at: Timestamp,
}

impl Activity {
    /// Whether the activity used or generated `path`.
    pub fn touches(&self, path: &str) -> bool {
        self.usages.contains(path) || self.generations.contains(path)
    }
}

/// An activity that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub plan_id: PlanId,
    pub usages: BTreeSet<String>,
    pub generations: BTreeSet<String>,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
}

impl NewActivity {
    pub fn new(plan_id: PlanId, started_at: Timestamp, ended_at: Timestamp) -> Self {
        Self {
            plan_id,
            usages: BTreeSet::new(),
            generations: BTreeSet::new(),
            started_at,
            ended_at,
        }
    }

    /// Derive usages and generations from the effective values of a resolved
    /// plan's inputs and outputs.
    pub fn from_resolved(plan: &Plan, started_at: Timestamp, ended_at: Timestamp) -> Self {
        let paths = |entities: &[CommandParameter]| {
            entities
                .iter()
                .filter_map(|p| p.effective_value())
                .map(ToString::to_string)
                .filter(|path| !path.is_empty())
                .collect::<BTreeSet<_>>()
        };

        Self {
            plan_id: plan.id,
            usages: paths(&plan.inputs),
            generations: paths(&plan.outputs),
            started_at,
            ended_at,
        }
    }

    pub fn with_usages<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.usages.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_generations<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generations.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn into_activity(self, id: ActivityId) -> Activity {
        Activity {
            id,
            plan_id: self.plan_id,
            usages: self.usages,
            generations: self.generations,
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }
}
