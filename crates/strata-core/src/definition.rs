//! Serializable workflow definitions.
//!
//! A definition lists atomic plans and composites by name. Importing replays
//! it through the [`PlanArena`] authoring operations, so every structural
//! check applies. A YAML example:
//!
//! ```yaml
//! plans:
//!   - name: prepare
//!     command: python prepare.py
//!     inputs:
//!       - { name: raw, default: data/raw.csv, position: 1 }
//!     outputs:
//!       - { name: clean, default: data/clean.csv, position: 2 }
//!   - name: train
//!     command: python train.py
//!     inputs:
//!       - { name: data, default: data/clean.csv, prefix: "--data=" }
//! composites:
//!   - name: pipeline
//!     steps: [prepare, train]
//!     mappings:
//!       - name: dataset
//!         targets: [{ step: prepare, parameter: raw }]
//!     links:
//!       - source: { step: prepare, parameter: clean }
//!         sinks: [{ step: train, parameter: data }]
//! ```

use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::Path,
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::{FileSystemResultExt, Result, StrataError},
    models::{
        CommandParameter, CompositePlan, IoStream, ParameterKind, ParameterRef, Plan, PlanId,
        Value,
    },
    workflow::PlanArena,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub plans: Vec<PlanDefinition>,

    #[serde(default)]
    pub composites: Vec<CompositeDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanDefinition {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub success_codes: Vec<i32>,
    #[serde(default)]
    pub inputs: Vec<ParameterDefinition>,
    #[serde(default)]
    pub outputs: Vec<ParameterDefinition>,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub stream: Option<IoStream>,
}

impl ParameterDefinition {
    fn to_parameter(&self, kind: ParameterKind) -> CommandParameter {
        let mut parameter = CommandParameter::new(kind, self.name.clone(), self.default.clone());
        parameter.description = self.description.clone();
        parameter.position = self.position;
        parameter.prefix = self.prefix.clone();
        parameter.mapped_to = self.stream;
        parameter
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositeDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Step names; either plans in this definition or already imported
    pub steps: Vec<String>,
    #[serde(default)]
    pub mappings: Vec<MappingDefinition>,
    #[serde(default)]
    pub links: Vec<LinkDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappingDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: Option<Value>,
    pub targets: Vec<EndpointDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkDefinition {
    pub source: EndpointDefinition,
    pub sinks: Vec<EndpointDefinition>,
}

/// A parameter or mapping on a direct step, addressed by names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointDefinition {
    pub step: String,
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub mapping: Option<String>,
}

impl EndpointDefinition {
    fn resolve(&self, arena: &PlanArena, composite: &str) -> Result<ParameterRef> {
        let parent = arena
            .get_by_name(composite)
            .and_then(|p| p.as_composite())
            .ok_or_else(|| StrataError::plan_not_found(composite))?;
        let step = arena.find_step(parent, &self.step).ok_or_else(|| {
            StrataError::ChildWorkflowNotFound {
                name: self.step.clone(),
                parent: composite.to_string(),
            }
        })?;

        match (&self.parameter, &self.mapping) {
            (Some(name), None) => Ok(ParameterRef::parameter(step, name.as_str())),
            (None, Some(name)) => Ok(ParameterRef::mapping(step, name.as_str())),
            _ => Err(StrataError::invalid_input("endpoint").with_reason(format!(
                "endpoint on step '{}' must name exactly one of parameter or mapping",
                self.step
            ))),
        }
    }
}

/// Read a JSON or YAML document, picking the format from the extension.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).fs_context(path)?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    if is_yaml {
        Ok(serde_yaml::from_str(&content)?)
    } else {
        Ok(serde_json::from_str(&content)?)
    }
}

impl WorkflowDefinition {
    pub fn from_path(path: &Path) -> Result<Self> {
        load_document(path)
    }

    /// Replay the definition into `arena` and return the ids of the plans it
    /// created or changed. On error the arena may be partially updated, so
    /// callers apply definitions to a copy.
    pub fn apply(&self, arena: &mut PlanArena) -> Result<Vec<PlanId>> {
        let mut touched = Vec::new();

        for definition in &self.plans {
            let mut plan = Plan::new(definition.name.clone(), definition.command.clone());
            plan.description = definition.description.clone();
            plan.keywords = definition.keywords.clone();
            plan.success_codes = definition.success_codes.clone();
            let id = arena.add_plan(plan)?;

            let entities = [
                (ParameterKind::Input, &definition.inputs),
                (ParameterKind::Output, &definition.outputs),
                (ParameterKind::Parameter, &definition.parameters),
            ];
            for (kind, parameters) in entities {
                for parameter in parameters {
                    arena.create_parameter(id, parameter.to_parameter(kind))?;
                }
            }
            touched.push(id);
        }

        let mut composite_ids = HashMap::new();
        for definition in &self.composites {
            let mut composite = CompositePlan::new(definition.name.clone());
            composite.description = definition.description.clone();
            composite.keywords = definition.keywords.clone();
            let id = arena.add_composite(composite)?;
            composite_ids.insert(definition.name.as_str(), id);
            touched.push(id);
        }

        for definition in &self.composites {
            let id = composite_ids[definition.name.as_str()];
            for step_name in &definition.steps {
                let step = arena.require_by_name(step_name)?.id();
                arena.add_step(id, step)?;
            }
        }

        // Mappings and links may point at mappings of nested composites, so
        // children are wired before their parents.
        for definition in self.composites_children_first() {
            let id = composite_ids[definition.name.as_str()];

            for mapping in &definition.mappings {
                let targets = mapping
                    .targets
                    .iter()
                    .map(|t| t.resolve(arena, &definition.name))
                    .collect::<Result<Vec<_>>>()?;
                arena.add_mapping(id, &mapping.name, targets, mapping.default.clone())?;
                if let Some(description) = &mapping.description {
                    arena.set_mapping_description(id, &mapping.name, description)?;
                }
            }

            for link in &definition.links {
                let source = link.source.resolve(arena, &definition.name)?;
                let sinks = link
                    .sinks
                    .iter()
                    .map(|s| s.resolve(arena, &definition.name))
                    .collect::<Result<Vec<_>>>()?;
                arena.add_link(id, source, sinks)?;
            }
        }

        Ok(touched)
    }

    fn composites_children_first(&self) -> Vec<&CompositeDefinition> {
        let by_name: HashMap<&str, &CompositeDefinition> = self
            .composites
            .iter()
            .map(|c| (c.name.as_str(), c))
            .collect();

        let mut ordered = Vec::with_capacity(self.composites.len());
        let mut visited = BTreeSet::new();
        for composite in &self.composites {
            visit_composite(composite, &by_name, &mut visited, &mut ordered);
        }
        ordered
    }
}

fn visit_composite<'a>(
    composite: &'a CompositeDefinition,
    by_name: &HashMap<&str, &'a CompositeDefinition>,
    visited: &mut BTreeSet<&'a str>,
    ordered: &mut Vec<&'a CompositeDefinition>,
) {
    if !visited.insert(composite.name.as_str()) {
        return;
    }
    for step in &composite.steps {
        if let Some(child) = by_name.get(step.as_str()) {
            visit_composite(child, by_name, visited, ordered);
        }
    }
    ordered.push(composite);
}
