//! Runtime values and user-supplied value maps.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};

/// A scalar value carried by a parameter or mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Value {
    /// Borrow the value as a string slice when it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

/// One entry of a [`Values`] map: either a literal for a parameter or mapping
/// of the current workflow, or a nested block addressed to a child step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueEntry {
    Nested(Values),
    Literal(Value),
}

/// User-supplied runtime values, keyed by parameter, mapping or step name.
///
/// ```rust
/// use strata_core::models::{Value, Values};
///
/// let mut values = Values::new();
/// values.set_path("preprocess.input", Value::from("raw.csv"));
/// values.insert("epochs", 10);
///
/// assert!(values.nested_block("preprocess").is_some());
/// assert_eq!(values.literal("epochs"), Some(&Value::Int(10)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(BTreeMap<String, ValueEntry>);

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&ValueEntry> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Insert a literal value, replacing whatever was stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0
            .insert(key.into(), ValueEntry::Literal(value.into()));
        self
    }

    /// Insert a nested block for the child step `key`.
    pub fn insert_nested(&mut self, key: impl Into<String>, values: Values) -> &mut Self {
        self.0.insert(key.into(), ValueEntry::Nested(values));
        self
    }

    /// The literal stored under `key`, if any.
    pub fn literal(&self, key: &str) -> Option<&Value> {
        match self.0.get(key) {
            Some(ValueEntry::Literal(value)) => Some(value),
            _ => None,
        }
    }

    /// The nested block stored under `key`, if any.
    pub fn nested_block(&self, key: &str) -> Option<&Values> {
        match self.0.get(key) {
            Some(ValueEntry::Nested(values)) => Some(values),
            _ => None,
        }
    }

    /// Iterate over literal entries in key order.
    pub fn literals(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter().filter_map(|(key, entry)| match entry {
            ValueEntry::Literal(value) => Some((key, value)),
            ValueEntry::Nested(_) => None,
        })
    }

    /// Iterate over nested entries in key order.
    pub fn nested(&self) -> impl Iterator<Item = (&String, &Values)> {
        self.0.iter().filter_map(|(key, entry)| match entry {
            ValueEntry::Nested(values) => Some((key, values)),
            ValueEntry::Literal(_) => None,
        })
    }

    /// Set a value under a dotted path, creating nested blocks on the way.
    ///
    /// `step1.step2.param` becomes `{step1: {step2: {param: value}}}`. A
    /// literal found where a block is needed is replaced by the block.
    pub fn set_path(&mut self, path: &str, value: Value) {
        match path.split_once('.') {
            None => {
                self.0.insert(path.to_string(), ValueEntry::Literal(value));
            }
            Some((head, rest)) => {
                let entry = self
                    .0
                    .entry(head.to_string())
                    .or_insert_with(|| ValueEntry::Nested(Values::new()));
                if let ValueEntry::Literal(_) = entry {
                    *entry = ValueEntry::Nested(Values::new());
                }
                if let ValueEntry::Nested(nested) = entry {
                    nested.set_path(rest, value);
                }
            }
        }
    }

    /// Parse and apply a `dotted.name=value` assignment.
    ///
    /// The value is kept as a string; typing is up to the executing engine.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<()> {
        let (name, value) = assignment.split_once('=').ok_or_else(|| {
            StrataError::invalid_input("set")
                .with_reason(format!("'{assignment}' is not of the form name=value"))
        })?;
        let name = name.trim();
        if name.is_empty() || name.split('.').any(str::is_empty) {
            return Err(StrataError::invalid_input("set")
                .with_reason(format!("'{assignment}' has an empty parameter name")));
        }
        self.set_path(name, Value::from(value));
        Ok(())
    }

    /// Deep-merge `other` into `self`. Nested blocks merge key by key; any
    /// other collision is won by `other`.
    pub fn merge(&mut self, other: Values) {
        for (key, incoming) in other.0 {
            match (self.0.get_mut(&key), incoming) {
                (Some(ValueEntry::Nested(existing)), ValueEntry::Nested(incoming)) => {
                    existing.merge(incoming);
                }
                (_, incoming) => {
                    self.0.insert(key, incoming);
                }
            }
        }
    }
}

impl FromIterator<(String, Value)> for Values {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key, ValueEntry::Literal(value)))
                .collect(),
        )
    }
}
