//! Cross-step references: parameter mappings and data-flow links.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{PlanId, Value};

/// Handle to a parameter entity or a mapping owned by a plan in the arena.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterRef {
    /// Input, output or parameter of an atomic plan
    Parameter { plan: PlanId, name: String },

    /// Mapping of a composite plan
    Mapping { plan: PlanId, name: String },
}

impl ParameterRef {
    pub fn parameter(plan: PlanId, name: impl Into<String>) -> Self {
        ParameterRef::Parameter {
            plan,
            name: name.into(),
        }
    }

    pub fn mapping(plan: PlanId, name: impl Into<String>) -> Self {
        ParameterRef::Mapping {
            plan,
            name: name.into(),
        }
    }

    /// The plan that owns the referenced entity.
    pub fn plan_id(&self) -> PlanId {
        match self {
            ParameterRef::Parameter { plan, .. } | ParameterRef::Mapping { plan, .. } => *plan,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ParameterRef::Parameter { name, .. } | ParameterRef::Mapping { name, .. } => name,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, ParameterRef::Mapping { .. })
    }
}

impl fmt::Display for ParameterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterRef::Parameter { plan, name } => write!(f, "{plan}:{name}"),
            ParameterRef::Mapping { plan, name } => write!(f, "{plan}:@{name}"),
        }
    }
}

/// A composite-level parameter that fans out to child parameters or to
/// mappings of child composites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterMapping {
    /// Name, unique among the composite's mappings
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    /// Entities this mapping writes to
    pub mapped_parameters: Vec<ParameterRef>,

    #[serde(skip)]
    actual_value: Option<Value>,
}

impl ParameterMapping {
    pub fn new(
        name: impl Into<String>,
        mapped_parameters: Vec<ParameterRef>,
        default_value: Option<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            default_value,
            mapped_parameters,
            actual_value: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn actual_value(&self) -> Option<&Value> {
        self.actual_value.as_ref()
    }

    pub fn actual_value_set(&self) -> bool {
        self.actual_value.is_some()
    }

    pub fn set_actual_value(&mut self, value: Value) {
        self.actual_value = Some(value);
    }
}

/// Mandatory data-flow wiring: after resolution every sink takes the value of
/// the source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterLink {
    /// An output, or a mapping whose leaves are all outputs
    pub source: ParameterRef,

    /// Inputs, parameters, or mappings without output leaves
    pub sinks: Vec<ParameterRef>,
}

impl ParameterLink {
    pub fn new(source: ParameterRef, sinks: Vec<ParameterRef>) -> Self {
        Self { source, sinks }
    }
}
