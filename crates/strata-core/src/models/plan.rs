//! Atomic and composite plan definitions.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{CommandParameter, ParameterKind, ParameterLink, ParameterMapping};
use crate::error::{Result, StrataError};

/// Stable identifier of a plan. `0` marks a plan not yet registered in an
/// arena.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(transparent)]
pub struct PlanId(pub u64);

impl PlanId {
    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An atomic, executable workflow step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    pub id: PlanId,

    /// Human name, unique within a project
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Base command, e.g. `python train.py`
    pub command: String,

    /// Exit codes treated as success (empty means only 0)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub success_codes: Vec<i32>,

    #[serde(default)]
    pub inputs: Vec<CommandParameter>,

    #[serde(default)]
    pub outputs: Vec<CommandParameter>,

    #[serde(default)]
    pub parameters: Vec<CommandParameter>,

    /// Timestamp when the plan was created (UTC)
    pub created_at: Timestamp,

    /// Set when the workflow was removed; activities keep referencing it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalidated_at: Option<Timestamp>,
}

impl Plan {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: PlanId::default(),
            name: name.into(),
            description: None,
            keywords: Vec::new(),
            command: command.into(),
            success_codes: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            parameters: Vec::new(),
            created_at: Timestamp::now(),
            invalidated_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an entity to the sequence matching its kind.
    ///
    /// # Errors
    ///
    /// Returns `StrataError::DuplicateParameterName` if any input, output or
    /// parameter of this plan already uses the name.
    pub fn add_parameter(&mut self, parameter: CommandParameter) -> Result<()> {
        if self.parameter(&parameter.name).is_some() {
            return Err(StrataError::DuplicateParameterName {
                owner: self.name.clone(),
                name: parameter.name,
            });
        }

        match parameter.kind {
            ParameterKind::Input => self.inputs.push(parameter),
            ParameterKind::Output => self.outputs.push(parameter),
            ParameterKind::Parameter => self.parameters.push(parameter),
        }
        Ok(())
    }

    /// Builder-style variant of [`Plan::add_parameter`].
    pub fn with_parameter(mut self, parameter: CommandParameter) -> Result<Self> {
        self.add_parameter(parameter)?;
        Ok(self)
    }

    /// Inputs, outputs and parameters, in that order.
    pub fn all_parameters(&self) -> impl Iterator<Item = &CommandParameter> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .chain(self.parameters.iter())
    }

    pub fn parameter(&self, name: &str) -> Option<&CommandParameter> {
        self.all_parameters().find(|p| p.name == name)
    }

    pub fn parameter_mut(&mut self, name: &str) -> Option<&mut CommandParameter> {
        self.inputs
            .iter_mut()
            .chain(self.outputs.iter_mut())
            .chain(self.parameters.iter_mut())
            .find(|p| p.name == name)
    }

    /// Command line this plan runs with its current values.
    ///
    /// Positional entities are ordered by position; stream-bound entities are
    /// left out of argv and, with `with_streams`, appended as redirections.
    pub fn to_argv(&self, with_streams: bool) -> Vec<String> {
        let mut positional: Vec<&CommandParameter> = self
            .all_parameters()
            .filter(|p| p.position.is_some() && p.mapped_to.is_none())
            .collect();
        positional.sort_by_key(|p| p.position);

        let mut argv: Vec<String> = self.command.split_whitespace().map(String::from).collect();
        argv.extend(positional.iter().flat_map(|p| p.to_argv()));

        if with_streams {
            argv.extend(
                self.all_parameters()
                    .filter_map(CommandParameter::to_stream_representation),
            );
        }

        argv
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated_at.is_some()
    }
}

/// A named group of steps with mappings and links between them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositePlan {
    pub id: PlanId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Child plans, referenced by id and shared with other composites
    #[serde(default)]
    pub steps: Vec<PlanId>,

    #[serde(default)]
    pub mappings: Vec<ParameterMapping>,

    #[serde(default)]
    pub links: Vec<ParameterLink>,

    pub created_at: Timestamp,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalidated_at: Option<Timestamp>,
}

impl CompositePlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlanId::default(),
            name: name.into(),
            description: None,
            keywords: Vec::new(),
            steps: Vec::new(),
            mappings: Vec::new(),
            links: Vec::new(),
            created_at: Timestamp::now(),
            invalidated_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn mapping(&self, name: &str) -> Option<&ParameterMapping> {
        self.mappings.iter().find(|m| m.name == name)
    }

    pub fn mapping_mut(&mut self, name: &str) -> Option<&mut ParameterMapping> {
        self.mappings.iter_mut().find(|m| m.name == name)
    }

    pub fn has_step(&self, id: PlanId) -> bool {
        self.steps.contains(&id)
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated_at.is_some()
    }
}

/// Either kind of plan. Resolution dispatches on this tag exactly once per
/// plan visited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbstractPlan {
    Plan(Plan),
    Composite(CompositePlan),
}

impl AbstractPlan {
    pub fn id(&self) -> PlanId {
        match self {
            AbstractPlan::Plan(p) => p.id,
            AbstractPlan::Composite(c) => c.id,
        }
    }

    pub(crate) fn set_id(&mut self, id: PlanId) {
        match self {
            AbstractPlan::Plan(p) => p.id = id,
            AbstractPlan::Composite(c) => c.id = id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AbstractPlan::Plan(p) => &p.name,
            AbstractPlan::Composite(c) => &c.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            AbstractPlan::Plan(p) => p.description.as_deref(),
            AbstractPlan::Composite(c) => c.description.as_deref(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        match self {
            AbstractPlan::Plan(p) => &p.keywords,
            AbstractPlan::Composite(c) => &c.keywords,
        }
    }

    pub fn created_at(&self) -> &Timestamp {
        match self {
            AbstractPlan::Plan(p) => &p.created_at,
            AbstractPlan::Composite(c) => &c.created_at,
        }
    }

    pub fn invalidated_at(&self) -> Option<&Timestamp> {
        match self {
            AbstractPlan::Plan(p) => p.invalidated_at.as_ref(),
            AbstractPlan::Composite(c) => c.invalidated_at.as_ref(),
        }
    }

    pub(crate) fn invalidate(&mut self, at: Timestamp) {
        match self {
            AbstractPlan::Plan(p) => p.invalidated_at = Some(at),
            AbstractPlan::Composite(c) => c.invalidated_at = Some(at),
        }
    }

    /// Lowercase kind tag, matching the serialized form.
    pub fn kind(&self) -> &'static str {
        match self {
            AbstractPlan::Plan(_) => "plan",
            AbstractPlan::Composite(_) => "composite",
        }
    }

    pub fn as_plan(&self) -> Option<&Plan> {
        match self {
            AbstractPlan::Plan(p) => Some(p),
            AbstractPlan::Composite(_) => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositePlan> {
        match self {
            AbstractPlan::Plan(_) => None,
            AbstractPlan::Composite(c) => Some(c),
        }
    }
}

impl From<Plan> for AbstractPlan {
    fn from(plan: Plan) -> Self {
        AbstractPlan::Plan(plan)
    }
}

impl From<CompositePlan> for AbstractPlan {
    fn from(plan: CompositePlan) -> Self {
        AbstractPlan::Composite(plan)
    }
}

/// Check a plan name for illegal characters.
///
/// Names may only contain ASCII letters, digits, `-` and `_`.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(StrataError::invalid_input("name").with_reason("must not be empty"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(StrataError::invalid_input("name").with_reason(format!(
            "'{name}' contains illegal characters; only letters, numbers, _ and - are allowed"
        )));
    }
    Ok(())
}
