//! Async facade used by the interfaces.
//!
//! A [`Project`] owns nothing but the location of its database. Every
//! operation opens a fresh connection on a blocking thread, loads what it
//! needs into the in-memory [`PlanArena`](crate::workflow::PlanArena) or
//! [`ActivityStore`](crate::activity::ActivityStore), and writes mutations
//! back through the [`Gateway`] trait.
//!
//! ```rust,no_run
//! use strata_core::{params::ResolveWorkflow, ProjectBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let project = ProjectBuilder::new()
//!     .with_database_path(Some("/tmp/strata.db"))
//!     .build()
//!     .await?;
//!
//! let view = project
//!     .resolve_workflow(&ResolveWorkflow {
//!         name: "pipeline".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("{view}");
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use tokio::task;

use crate::{
    db::Database,
    error::{Result, StrataError},
    gateway::Gateway,
};

pub mod activity_ops;
pub mod builder;
pub mod workflow_ops;


pub use builder::ProjectBuilder;

/// Main entry point for workflow and provenance operations.
#[derive(Debug, Clone)]
pub struct Project {
    pub(crate) db_path: PathBuf,
}

impl Project {
    pub(crate) fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    /// Run `work` against a fresh connection on the blocking thread pool.
    async fn with_gateway<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Gateway) -> Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();

        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            work(&mut db)
        })
        .await
        .map_err(|e| StrataError::Configuration {
            message: format!("Task join error: {e}"),
        })?
    }
}
