//! Builder for creating and configuring Project instances.

use std::path::{Path, PathBuf};

use log::debug;
use tokio::task;

use super::Project;
use crate::{
    db::Database,
    error::{FileSystemResultExt, Result, StrataError},
};

#[derive(Debug, Clone, Default)]
pub struct ProjectBuilder {
    database_path: Option<PathBuf>,
}

impl ProjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses the XDG Base Directory specification:
    /// `$XDG_DATA_HOME/strata/strata.db` or `~/.local/share/strata/strata.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Builds the project, creating the database and its schema if needed.
    ///
    /// # Errors
    ///
    /// Returns `StrataError::FileSystem` if the database directory cannot be
    /// created, `StrataError::XdgDirectory` if no default location is
    /// available and `StrataError::Database` if initialization fails.
    pub async fn build(self) -> Result<Project> {
        let db_path = match self.database_path {
            Some(path) => path,
            None => Self::default_database_path()?,
        };

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).fs_context(parent)?;
        }

        debug!("Opening project database at {}", db_path.display());
        let init_path = db_path.clone();
        task::spawn_blocking(move || Database::new(&init_path).map(drop))
            .await
            .map_err(|e| StrataError::Configuration {
                message: format!("Task join error: {e}"),
            })??;

        Ok(Project::new(db_path))
    }

    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("strata")
            .place_data_file("strata.db")
            .map_err(|e| StrataError::XdgDirectory(e.to_string()))
    }
}
