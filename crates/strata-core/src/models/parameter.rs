//! Command parameter entities: inputs, outputs and plain parameters.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Value;

/// Which of a plan's three parameter sequences an entity belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// A path consumed by the command
    Input,

    /// A path produced by the command
    Output,

    /// A non-path argument (string, flag, number)
    Parameter,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::Input => "input",
            ParameterKind::Output => "output",
            ParameterKind::Parameter => "parameter",
        }
    }
}

impl FromStr for ParameterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "input" => Ok(ParameterKind::Input),
            "output" => Ok(ParameterKind::Output),
            "parameter" | "param" => Ok(ParameterKind::Parameter),
            _ => Err(format!("Invalid parameter kind: {s}")),
        }
    }
}

/// Standard stream an entity is bound to instead of appearing in argv.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IoStream {
    Stdin,
    Stdout,
    Stderr,
}

impl IoStream {
    /// Shell redirection operator for this stream.
    pub fn redirection(&self) -> &'static str {
        match self {
            IoStream::Stdin => "<",
            IoStream::Stdout => ">",
            IoStream::Stderr => "2>",
        }
    }
}

/// An input, output or parameter of an atomic plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandParameter {
    /// Name, unique within the owning plan
    pub name: String,

    pub kind: ParameterKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Value used when nothing else resolves the parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    /// Position on the command line; `None` means not positional
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,

    /// Prefix such as `--out=` or `-n ` written before the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Stream the value is consumed from or produced on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapped_to: Option<IoStream>,

    /// Runtime value; never persisted
    #[serde(skip)]
    actual_value: Option<Value>,
}

impl CommandParameter {
    pub fn new(kind: ParameterKind, name: impl Into<String>, default_value: Option<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            default_value,
            position: None,
            prefix: None,
            mapped_to: None,
            actual_value: None,
        }
    }

    pub fn input(name: impl Into<String>, default_value: impl Into<Value>) -> Self {
        Self::new(ParameterKind::Input, name, Some(default_value.into()))
    }

    pub fn output(name: impl Into<String>, default_value: impl Into<Value>) -> Self {
        Self::new(ParameterKind::Output, name, Some(default_value.into()))
    }

    pub fn parameter(name: impl Into<String>, default_value: impl Into<Value>) -> Self {
        Self::new(ParameterKind::Parameter, name, Some(default_value.into()))
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_stream(mut self, stream: IoStream) -> Self {
        self.mapped_to = Some(stream);
        self
    }

    pub fn actual_value(&self) -> Option<&Value> {
        self.actual_value.as_ref()
    }

    /// Whether resolution has assigned a value. Stays true once set.
    pub fn actual_value_set(&self) -> bool {
        self.actual_value.is_some()
    }

    pub fn set_actual_value(&mut self, value: Value) {
        self.actual_value = Some(value);
    }

    /// The value the command will see: the resolved value, else the default.
    pub fn effective_value(&self) -> Option<&Value> {
        self.actual_value.as_ref().or(self.default_value.as_ref())
    }

    /// Argv words for this entity. A prefix ending in a space is emitted as
    /// its own word; any other prefix is glued to the value.
    pub fn to_argv(&self) -> Vec<String> {
        let value = self
            .effective_value()
            .map(ToString::to_string)
            .unwrap_or_default();

        match self.prefix.as_deref() {
            Some(prefix) if prefix.ends_with(' ') => vec![prefix.trim_end().to_string(), value],
            Some(prefix) => vec![format!("{prefix}{value}")],
            None => vec![value],
        }
    }

    /// Shell redirection for stream-bound entities, e.g. `> out.txt`.
    pub fn to_stream_representation(&self) -> Option<String> {
        let stream = self.mapped_to?;
        let value = self.effective_value()?;
        Some(format!("{} {value}", stream.redirection()))
    }
}
