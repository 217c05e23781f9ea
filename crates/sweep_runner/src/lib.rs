//! Execution side of density-matching sweeps.
//!
//! Takes a [`sweep_core::SweepPlan`] and launches its invocations through a
//! [`launcher::Launcher`]: boosted runs in the background, baseline runs in the
//! foreground, pair by pair. The outcome of every launch is collected in a
//! [`report::SweepReport`].

pub mod driver;
pub mod launcher;
pub mod logging;
pub mod report;

pub use driver::{run_sweep, SweepOptions};
pub use launcher::{BackgroundJob, DryRunLauncher, ExitSummary, LaunchError, Launcher, ProcessLauncher};
pub use report::{run_signature, JobOutcome, JobRecord, SweepReport};
