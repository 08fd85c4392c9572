//! Parameter structures for project operations.
//!
//! These are the interface-neutral inputs of the [`crate::Project`] facade.
//! Interfaces such as the CLI define their own argument types with
//! framework-specific derives and convert into these:
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │   CLI Args      │    │  Core Params    │
//! │  (clap derives) │───▶│ (serde only)    │
//! └─────────────────┘    └─────────────────┘
//! ```

use std::path::PathBuf;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    activity::Direction,
    definition::load_document,
    error::Result,
    models::Values,
};

/// Parameters for importing a workflow definition file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportWorkflows {
    /// JSON or YAML definition, chosen by extension
    pub path: PathBuf,
}

/// Parameters addressing one workflow by name. Showing also accepts a
/// numeric id, as does resolving.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowName {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListWorkflows {
    /// Include removed workflows
    #[serde(default)]
    pub removed: bool,
}

/// Values supplied for a resolution: an optional file deep-merged with
/// `a.b.c=value` assignments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValueOverrides {
    pub values_file: Option<PathBuf>,
    #[serde(default)]
    pub assignments: Vec<String>,
}

impl ValueOverrides {
    /// Build the nested value map. Assignments are applied after the file, so
    /// they win on conflicts.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use strata_core::{models::Value, params::ValueOverrides};
    ///
    /// let overrides = ValueOverrides {
    ///     values_file: None,
    ///     assignments: vec!["step1.x=data.csv".to_string(), "epochs=3".to_string()],
    /// };
    /// let values = overrides.load()?;
    /// assert_eq!(values.literal("epochs"), Some(&Value::from("3")));
    /// assert!(values.nested_block("step1").is_some());
    /// # strata_core::Result::<()>::Ok(())
    /// ```
    pub fn load(&self) -> Result<Values> {
        let mut values = match &self.values_file {
            Some(path) => load_document::<Values>(path)?,
            None => Values::new(),
        };
        for assignment in &self.assignments {
            values.apply_assignment(assignment)?;
        }
        Ok(values)
    }
}

/// Parameters for resolving a workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveWorkflow {
    pub name: String,
    #[serde(flatten)]
    pub overrides: ValueOverrides,
}

/// Parameters for recording a finished execution.
///
/// When neither `usages` nor `generations` is given, paths are taken from the
/// plan's resolved inputs and outputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordActivity {
    /// Name of the executed plan
    pub plan: String,
    #[serde(default)]
    pub usages: Vec<String>,
    #[serde(default)]
    pub generations: Vec<String>,
    #[serde(flatten)]
    pub overrides: ValueOverrides,
    /// Defaults to now
    pub started_at: Option<Timestamp>,
    /// Defaults to now
    pub ended_at: Option<Timestamp>,
}

impl RecordActivity {
    pub fn has_explicit_paths(&self) -> bool {
        !self.usages.is_empty() || !self.generations.is_empty()
    }
}

/// Generic parameters for operations requiring just an activity id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Id {
    pub id: u64,
}

/// Parameters for a lineage query starting at one activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lineage {
    pub id: u64,
    pub direction: Direction,
    /// Report every chain instead of direct neighbours
    #[serde(default)]
    pub chains: bool,
}

/// Parameters for listing used or generated paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPaths {
    /// Restrict to paths equal to, inside or containing one of these
    #[serde(default)]
    pub paths: Vec<String>,
}
