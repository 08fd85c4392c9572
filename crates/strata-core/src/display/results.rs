//! Result wrapper types for displaying operation outcomes.

use std::fmt;

use super::collections::{Activities, ActivityChains};
use crate::{
    activity::{ActivityChain, Direction},
    models::{AbstractPlan, Activity, ActivityId},
};

/// Workflows created by an import.
pub struct ImportResult(pub Vec<AbstractPlan>);

impl fmt::Display for ImportResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(AbstractPlan::name).collect();
        writeln!(f, "Imported {} workflows: {}", names.len(), names.join(", "))?;
        writeln!(f)?;
        self.0.iter().try_for_each(|plan| write!(f, "{plan}"))
    }
}

pub struct RemoveResult(pub AbstractPlan);

impl fmt::Display for RemoveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Removed workflow '{}' (ID: {})",
            self.0.name(),
            self.0.id()
        )
    }
}

pub struct RecordResult(pub Activity);

impl fmt::Display for RecordResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Recorded activity with ID: {}", self.0.id)?;
        writeln!(f)?;
        write!(f, "{}", self.0)
    }
}

/// An activity together with the workflow it ran, when still known.
pub struct ActivityDetails {
    pub activity: Activity,
    pub plan: Option<AbstractPlan>,
}

impl ActivityDetails {
    pub fn new(activity: Activity, plan: Option<AbstractPlan>) -> Self {
        Self { activity, plan }
    }
}

impl fmt::Display for ActivityDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.activity)?;
        if let Some(plan) = &self.plan {
            let removed = if plan.invalidated_at().is_some() {
                ", removed"
            } else {
                ""
            };
            writeln!(f, "Workflow: **{}** ({}{removed})", plan.name(), plan.kind())?;
        }
        Ok(())
    }
}

/// Answer to a lineage query.
pub enum LineageResult {
    /// Activities one step away
    Neighbours {
        direction: Direction,
        origin: ActivityId,
        activities: Vec<Activity>,
    },
    /// Every chain reachable from the origin
    Chains {
        direction: Direction,
        origin: ActivityId,
        chains: Vec<ActivityChain>,
    },
}

impl LineageResult {
    pub fn is_empty(&self) -> bool {
        match self {
            LineageResult::Neighbours { activities, .. } => activities.is_empty(),
            LineageResult::Chains { chains, .. } => chains.is_empty(),
        }
    }
}

impl fmt::Display for LineageResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineageResult::Neighbours {
                direction,
                origin,
                activities,
            } => {
                writeln!(f, "## Activities {direction} of {origin}")?;
                writeln!(f)?;
                write!(f, "{}", Activities(activities.clone()))
            }
            LineageResult::Chains {
                direction,
                origin,
                chains,
            } => {
                writeln!(f, "## Chains {direction} of {origin}")?;
                writeln!(f)?;
                write!(f, "{}", ActivityChains(chains.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;
    use crate::models::{CompositePlan, NewActivity, PlanId};

    #[test]
    fn test_lineage_result_headings() {
        let chains = LineageResult::Chains {
            direction: Direction::Upstream,
            origin: ActivityId(6),
            chains: vec![vec![ActivityId(4)], vec![ActivityId(4), ActivityId(2)]],
        };
        let output = chains.to_string();

        assert!(output.starts_with("## Chains upstream of 6"));
        assert!(output.contains("2. 4 → 2"));
        assert!(!chains.is_empty());
    }

    #[test]
    fn test_activity_details_names_workflow() {
        let at = Timestamp::now();
        let activity = NewActivity::new(PlanId(1), at, at).into_activity(ActivityId(3));
        let mut plan = AbstractPlan::from(CompositePlan::new("pipeline"));
        plan.invalidate(at);

        let output = ActivityDetails::new(activity, Some(plan)).to_string();

        assert!(output.contains("Workflow: **pipeline** (composite, removed)"));
    }
}
