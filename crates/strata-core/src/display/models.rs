//! Display implementations for domain models.
//!
//! Output is markdown meant for the terminal renderer: a heading per
//! resource, metadata as a bullet list and paths in code spans.

use std::fmt;

use super::datetime::{Elapsed, LocalDateTime};
use crate::{
    activity::Direction,
    models::{AbstractPlan, Activity, CommandParameter, ParameterKind},
};

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Downstream => "downstream",
            Direction::Upstream => "upstream",
        })
    }
}

impl fmt::Display for AbstractPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "### {} ({}, id {})", self.name(), self.kind(), self.id())?;
        writeln!(f)?;

        if let Some(description) = self.description() {
            writeln!(f, "{description}")?;
            writeln!(f)?;
        }

        match self {
            AbstractPlan::Plan(plan) => writeln!(f, "- Command: `{}`", plan.command)?,
            AbstractPlan::Composite(composite) => {
                writeln!(f, "- Steps: {}", composite.steps.len())?;
            }
        }
        if !self.keywords().is_empty() {
            writeln!(f, "- Keywords: {}", self.keywords().join(", "))?;
        }
        writeln!(f, "- Created: {}", LocalDateTime(self.created_at()))?;
        if let Some(at) = self.invalidated_at() {
            writeln!(f, "- Removed: {}", LocalDateTime(at))?;
        }
        writeln!(f)
    }
}

/// Bullet line: name, kind, effective value and where it goes on the
/// command line.
impl fmt::Display for CommandParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- **{}** ({})", self.name, self.kind)?;
        match self.effective_value() {
            Some(value) => write!(f, ": `{value}`")?,
            None => write!(f, ": *unset*")?,
        }
        if self.actual_value_set() {
            write!(f, " (resolved)")?;
        }
        if let Some(stream) = self.mapped_to {
            write!(f, " via `{}`", stream.redirection())?;
        }
        if let Some(description) = &self.description {
            write!(f, " - {description}")?;
        }
        writeln!(f)
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "### Activity {}", self.id)?;
        writeln!(f)?;
        writeln!(f, "- Plan: {}", self.plan_id)?;
        writeln!(f, "- Started: {}", LocalDateTime(&self.started_at))?;
        writeln!(
            f,
            "- Ended: {} (took {})",
            LocalDateTime(&self.ended_at),
            Elapsed(&self.started_at, &self.ended_at)
        )?;

        for (title, paths) in [("Used", &self.usages), ("Generated", &self.generations)] {
            if paths.is_empty() {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{title}:")?;
            for path in paths {
                writeln!(f, "- `{path}`")?;
            }
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;
    use crate::models::{ActivityId, NewActivity, Plan, PlanId, Value};

    #[test]
    fn test_plan_display() {
        let mut plan = Plan::new("train", "python train.py").with_description("Fit the model");
        plan.id = PlanId(7);
        let output = AbstractPlan::from(plan).to_string();

        assert!(output.starts_with("### train (plan, id 7)"));
        assert!(output.contains("Fit the model"));
        assert!(output.contains("- Command: `python train.py`"));
        assert!(!output.contains("Removed"));
    }

    #[test]
    fn test_parameter_display_marks_resolved_values() {
        let mut parameter = CommandParameter::input("data", "a.csv");
        assert_eq!(parameter.to_string(), "- **data** (input): `a.csv`\n");

        parameter.set_actual_value(Value::from("b.csv"));
        assert_eq!(
            parameter.to_string(),
            "- **data** (input): `b.csv` (resolved)\n"
        );
    }

    #[test]
    fn test_activity_display_lists_paths() {
        let at = Timestamp::now();
        let activity = NewActivity::new(PlanId(2), at, at)
            .with_usages(["raw.csv"])
            .with_generations(["clean.csv"])
            .into_activity(ActivityId(5));

        let output = activity.to_string();
        assert!(output.starts_with("### Activity 5"));
        assert!(output.contains("Used:\n- `raw.csv`"));
        assert!(output.contains("Generated:\n- `clean.csv`"));
    }
}
