//! Command-line arguments.
//!
//! Each subcommand has a clap argument struct that converts into the matching
//! interface-neutral type from [`strata_core::params`]:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Project
//! ```

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use jiff::Timestamp;
use strata_core::{params::*, Direction};

/// Compose command-line workflows, preview what they will run and trace
/// the lineage of the files they produce
#[derive(Parser)]
#[command(version, about, name = "strata")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/strata/strata.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import, inspect and resolve workflows
    #[command(alias = "w")]
    Workflow {
        #[command(subcommand)]
        command: WorkflowCommands,
    },
    /// Record executions and query lineage
    #[command(alias = "a")]
    Activity {
        #[command(subcommand)]
        command: ActivityCommands,
    },
}

#[derive(Subcommand)]
pub enum WorkflowCommands {
    /// Import plans and composites from a JSON or YAML definition
    #[command(alias = "i")]
    Import(ImportArgs),
    /// List workflows
    #[command(alias = "ls")]
    List(ListArgs),
    /// Show a workflow with its steps and default values
    #[command(alias = "s")]
    Show(NameArgs),
    /// Remove a workflow; its history is kept
    #[command(alias = "rm")]
    Remove(NameArgs),
    /// Resolve values and print the commands that would run
    #[command(alias = "r")]
    Resolve(ResolveArgs),
}

#[derive(Subcommand)]
pub enum ActivityCommands {
    /// Record a finished execution of a workflow
    Record(RecordArgs),
    /// List activities, optionally only those touching a path
    #[command(alias = "ls")]
    List(ListActivitiesArgs),
    /// Show one activity
    #[command(alias = "s")]
    Show(ActivityIdArgs),
    /// Activities that consumed what this one generated
    Downstream(LineageArgs),
    /// Activities that generated what this one consumed
    Upstream(LineageArgs),
    /// Every path used as an input
    Inputs(PathsArgs),
    /// Every path generated as an output
    Outputs(PathsArgs),
}

#[derive(ClapArgs)]
pub struct ImportArgs {
    #[arg(help = "Definition file; .yaml/.yml is read as YAML, anything else as JSON")]
    pub path: PathBuf,
}

impl From<ImportArgs> for ImportWorkflows {
    fn from(val: ImportArgs) -> Self {
        ImportWorkflows { path: val.path }
    }
}

#[derive(ClapArgs)]
pub struct ListArgs {
    /// Include removed workflows
    #[arg(long)]
    pub removed: bool,
}

impl From<ListArgs> for ListWorkflows {
    fn from(val: ListArgs) -> Self {
        ListWorkflows {
            removed: val.removed,
        }
    }
}

#[derive(ClapArgs)]
pub struct NameArgs {
    /// Workflow name (`show` and `resolve` also accept an id)
    pub name: String,
}

impl From<NameArgs> for WorkflowName {
    fn from(val: NameArgs) -> Self {
        WorkflowName { name: val.name }
    }
}

/// Values for a resolution, shared by `resolve` and `record`
#[derive(ClapArgs)]
pub struct OverrideArgs {
    /// JSON or YAML file with nested values keyed by step name
    #[arg(long)]
    pub values: Option<PathBuf>,

    /// Set one value, e.g. `--set step1.input=data.csv`; repeatable
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub assignments: Vec<String>,
}

impl From<OverrideArgs> for ValueOverrides {
    fn from(val: OverrideArgs) -> Self {
        ValueOverrides {
            values_file: val.values,
            assignments: val.assignments,
        }
    }
}

#[derive(ClapArgs)]
pub struct ResolveArgs {
    /// Workflow name (`show` and `resolve` also accept an id)
    pub name: String,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

impl From<ResolveArgs> for ResolveWorkflow {
    fn from(val: ResolveArgs) -> Self {
        ResolveWorkflow {
            name: val.name,
            overrides: val.overrides.into(),
        }
    }
}

#[derive(ClapArgs)]
pub struct RecordArgs {
    /// Name of the executed workflow
    pub plan: String,

    /// Path the run consumed; repeatable
    #[arg(long = "usage", value_name = "PATH")]
    pub usages: Vec<String>,

    /// Path the run produced; repeatable
    #[arg(long = "generation", value_name = "PATH")]
    pub generations: Vec<String>,

    /// Start time in RFC 3339, defaults to now
    #[arg(long)]
    pub started_at: Option<Timestamp>,

    /// End time in RFC 3339, defaults to now
    #[arg(long)]
    pub ended_at: Option<Timestamp>,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

impl From<RecordArgs> for RecordActivity {
    fn from(val: RecordArgs) -> Self {
        RecordActivity {
            plan: val.plan,
            usages: val.usages,
            generations: val.generations,
            overrides: val.overrides.into(),
            started_at: val.started_at,
            ended_at: val.ended_at,
        }
    }
}

#[derive(ClapArgs)]
pub struct ListActivitiesArgs {
    /// Only activities that used or generated this exact path
    #[arg(long)]
    pub path: Option<String>,
}

#[derive(ClapArgs)]
pub struct ActivityIdArgs {
    /// Activity id
    pub id: u64,
}

impl From<ActivityIdArgs> for Id {
    fn from(val: ActivityIdArgs) -> Self {
        Id { id: val.id }
    }
}

#[derive(ClapArgs)]
pub struct LineageArgs {
    /// Activity id
    pub id: u64,

    /// Print every chain of activities instead of direct neighbours
    #[arg(long)]
    pub chains: bool,
}

impl LineageArgs {
    pub fn into_params(self, direction: Direction) -> Lineage {
        Lineage {
            id: self.id,
            direction,
            chains: self.chains,
        }
    }
}

#[derive(ClapArgs)]
pub struct PathsArgs {
    /// Only paths equal to, inside or containing one of these
    pub paths: Vec<String>,
}

impl From<PathsArgs> for ListPaths {
    fn from(val: PathsArgs) -> Self {
        ListPaths { paths: val.paths }
    }
}
