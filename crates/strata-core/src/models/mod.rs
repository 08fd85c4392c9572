//! Data models for plans, parameters and activities.
//!
//! Plans come in two shapes, held together by [`AbstractPlan`]:
//!
//! - [`Plan`]: an atomic step with a command and its inputs, outputs and
//!   parameters ([`CommandParameter`])
//! - [`CompositePlan`]: a group of steps, referenced by [`PlanId`], with
//!   [`ParameterMapping`]s exposing child parameters and [`ParameterLink`]s
//!   wiring outputs to inputs
//!
//! Runtime values are [`Value`] scalars supplied through a nested [`Values`]
//! map. Display implementations live in [`crate::display::models`].
//!
//! # Examples
//!
//! ```rust
//! use strata_core::models::{CommandParameter, Plan};
//!
//! let plan = Plan::new("train", "python train.py")
//!     .with_parameter(CommandParameter::input("data", "data.csv").with_position(1))?
//!     .with_parameter(CommandParameter::parameter("epochs", 10).with_prefix("--epochs="))?;
//!
//! assert_eq!(
//!     plan.to_argv(false),
//!     vec!["python", "train.py", "data.csv"]
//! );
//! # Ok::<(), strata_core::StrataError>(())
//! ```

pub mod activity;
pub mod mapping;
pub mod parameter;
pub mod plan;
pub mod value;


pub use activity::{Activity, ActivityId, NewActivity};
pub use mapping::{ParameterLink, ParameterMapping, ParameterRef};
pub use parameter::{CommandParameter, IoStream, ParameterKind};
pub use plan::{validate_name, AbstractPlan, CompositePlan, Plan, PlanId};
pub use value::{Value, ValueEntry, Values};
