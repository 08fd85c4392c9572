//! Markdown formatting for domain models and operation results.
//!
//! Domain models implement [`std::fmt::Display`] directly (see [`models`]);
//! this module adds newtype wrappers for collections, results of operations
//! and the resolved [`WorkflowView`]. Every formatter produces markdown so
//! the CLI can render it with rich styling or print it as is.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │ Wrappers, Views │    │    Markdown     │
//! │ (Plan, Activity)│───▶│ & Result Types  │───▶│     Output      │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ```rust
//! use strata_core::display::{OperationStatus, Paths};
//!
//! let status = OperationStatus::success("Workflow removed");
//! assert_eq!(status.to_string(), "Success: Workflow removed\n");
//!
//! let paths = Paths(vec!["data/clean.csv".to_string()]);
//! assert!(paths.to_string().contains("`data/clean.csv`"));
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;
pub mod view;

pub use collections::{Activities, ActivityChains, Paths, Workflows};
pub use datetime::{Elapsed, LocalDateTime};
pub use results::{ActivityDetails, ImportResult, LineageResult, RecordResult, RemoveResult};
pub use status::OperationStatus;
pub use view::WorkflowView;
