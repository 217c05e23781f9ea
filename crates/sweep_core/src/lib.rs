//! Deterministic building blocks for density-matching parameter sweeps.
//!
//! This crate turns a shared configuration bag and a grid of (dataset, flow depth)
//! pairs into an ordered plan of training-program invocations. Each pair yields a
//! boosted invocation and a baseline single-flow invocation with identical shared
//! parameters. Nothing here spawns processes; see `sweep_runner` for execution.
//!
//! # Quick Start
//!
//! ```no_run
//! use sweep_core::{SweepConfig, SweepGrid, SweepPlan};
//!
//! let config = SweepConfig::load(Some("experiment_config_density.sh".as_ref()))?;
//! let plan = SweepPlan::build(&config, &SweepGrid::default())?;
//!
//! for invocation in plan.invocations() {
//!     println!("{}", invocation.command_line());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! - [`config`]: configuration bag, defaults-file and environment loading
//! - [`grid`]: sweep axes and their Cartesian product
//! - [`flow`]: flow kinds and dataset identifiers understood by the trainer
//! - [`invocation`]: command-line construction for boosted and baseline runs
//! - [`snapshot`]: snapshot directory naming used by the trainer
//! - [`plan`]: the ordered, fingerprinted sweep plan
//! - [`export`]: plan export to JSON/CSV

pub mod config;
pub mod error;
pub mod export;
pub mod flow;
pub mod grid;
pub mod invocation;
pub mod plan;
pub mod snapshot;

pub use config::SweepConfig;
pub use error::{ConfigError, ExportError, ValidationError};
pub use flow::{Dataset, FlowKind};
pub use grid::{GridPoint, SweepGrid};
pub use invocation::{Invocation, JobVariant};
pub use plan::{PairPlan, SweepPlan};
