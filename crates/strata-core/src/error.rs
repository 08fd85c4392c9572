//! Error types for the strata library.

use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for all strata operations.
#[derive(Error, Debug)]
pub enum StrataError {
    /// A parameter or mapping with the same name already exists on the owner
    #[error("Parameter '{name}' already exists on workflow '{owner}'")]
    DuplicateParameterName { owner: String, name: String },
    /// The requested step or link would make the workflow graph cyclic
    #[error("Workflow '{workflow}' would become cyclic: {reason}")]
    CyclicWorkflow { workflow: String, reason: String },
    /// A link does not flow from an output to inputs or parameters
    #[error("Invalid link in workflow '{workflow}': {reason}")]
    InvalidLinkDirection { workflow: String, reason: String },
    /// A nested value block names a step that does not exist
    #[error("Workflow '{parent}' has no step named '{name}'")]
    ChildWorkflowNotFound { name: String, parent: String },
    /// A parameter or mapping reference does not resolve
    #[error("Parameter '{name}' not found on workflow '{workflow}'")]
    ParameterNotFound { workflow: String, name: String },
    /// Plan not found for the given ID or name
    #[error("Workflow '{reference}' not found")]
    PlanNotFound { reference: String },
    /// Activity not found for the given ID
    #[error("Activity with ID {id} not found")]
    ActivityNotFound { id: u64 },
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// YAML documents that fail to parse
    #[error("YAML error: {source}")]
    Yaml {
        #[from]
        source: serde_yaml::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> StrataError {
        StrataError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> StrataError {
        StrataError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl StrataError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Shorthand for a missing workflow, by name or id.
    pub fn plan_not_found(reference: impl ToString) -> Self {
        Self::PlanNotFound {
            reference: reference.to_string(),
        }
    }

    /// Whether the error stems from a structural authoring mistake.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::DuplicateParameterName { .. }
                | Self::CyclicWorkflow { .. }
                | Self::InvalidLinkDirection { .. }
                | Self::ParameterNotFound { .. }
        )
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| StrataError::database(message).with_source(e))
    }
}

/// Extension trait for filesystem Results that remembers the offending path.
pub trait FileSystemResultExt<T> {
    /// Map I/O errors to [`StrataError::FileSystem`] for `path`.
    fn fs_context(self, path: &std::path::Path) -> Result<T>;
}

impl<T> FileSystemResultExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, path: &std::path::Path) -> Result<T> {
        self.map_err(|source| StrataError::FileSystem {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Result type alias for strata operations
pub type Result<T> = std::result::Result<T, StrataError>;
