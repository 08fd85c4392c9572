//! Core library for strata: composable command-line workflows, value
//! resolution and provenance.
//!
//! A workflow is either an atomic [`Plan`](models::Plan) wrapping one command
//! or a [`CompositePlan`](models::CompositePlan) grouping other workflows.
//! Workflows live in a [`PlanArena`]; the [`ValueResolver`] turns user
//! supplied values, mappings, defaults and links into the concrete argv of
//! every step. Executions are recorded as [`Activity`](models::Activity)
//! records whose used and generated paths form the lineage graph held by the
//! [`ActivityStore`].
//!
//! # Layers
//!
//! ```text
//! ┌──────────────┐    ┌──────────────────────┐    ┌──────────────┐
//! │   Project    │───▶│ PlanArena / Resolver │    │   Database   │
//! │ (async API)  │    │    ActivityStore     │◀──▶│  (Gateway)   │
//! └──────────────┘    └──────────────────────┘    └──────────────┘
//! ```
//!
//! The in-memory layer is synchronous and can be used on its own:
//!
//! ```rust
//! use strata_core::{
//!     models::{CommandParameter, CompositePlan, ParameterRef, Plan, Values},
//!     PlanArena,
//! };
//!
//! let mut arena = PlanArena::new();
//! let clean = arena.add_plan(
//!     Plan::new("clean", "python clean.py")
//!         .with_parameter(CommandParameter::input("raw", "raw.csv").with_position(1))?,
//! )?;
//! let pipeline = arena.add_composite(CompositePlan::new("pipeline"))?;
//! arena.add_step(pipeline, clean)?;
//! arena.add_mapping(pipeline, "dataset", vec![ParameterRef::parameter(clean, "raw")], None)?;
//!
//! let mut values = Values::new();
//! values.insert("dataset", "data/v2.csv");
//! let resolution = arena.resolve(pipeline, &values)?;
//!
//! assert!(resolution.is_complete());
//! let plan = arena.get(clean).and_then(|p| p.as_plan()).unwrap();
//! assert_eq!(plan.to_argv(false), vec!["python", "clean.py", "data/v2.csv"]);
//! # Ok::<(), strata_core::StrataError>(())
//! ```
//!
//! Persistent use goes through [`Project`], built with [`ProjectBuilder`].

pub mod activity;
pub mod db;
pub mod definition;
pub mod display;
pub mod error;
pub mod gateway;
pub mod models;
pub mod params;
pub mod project;
pub mod resolver;
pub mod workflow;

// Re-export commonly used types
pub use activity::{ActivityChain, ActivityStore, Direction};
pub use db::Database;
pub use definition::WorkflowDefinition;
pub use display::{OperationStatus, WorkflowView};
pub use error::{Result, StrataError};
pub use gateway::Gateway;
pub use project::{Project, ProjectBuilder};
pub use resolver::{Resolution, ValueResolver};
pub use workflow::PlanArena;
