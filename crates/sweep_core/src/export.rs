//! Plan export to JSON and CSV.
//!
//! The writer helpers are shared with the run report in `sweep_runner`.

use std::path::Path;

use serde::Serialize;

use crate::error::ExportError;
use crate::plan::SweepPlan;

mod csv;
mod writer_utils;

pub use writer_utils::{create_output_file, ensure_not_empty};

/// Serialize any value as pretty JSON at `path`.
pub fn write_json<T>(value: &T, path: impl AsRef<Path>) -> Result<(), ExportError>
where
    T: Serialize + ?Sized,
{
    let file = create_output_file(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}

/// Export the whole plan (pairs and fingerprint) as JSON.
pub fn export_plan_to_json(plan: &SweepPlan, path: impl AsRef<Path>) -> Result<(), ExportError> {
    ensure_not_empty(&plan.pairs)?;
    write_json(plan, path)
}

/// Export one CSV row per invocation, in launch order.
///
/// Columns: `pair_index, dataset, flow_depth, variant, snapshot_prefix, command_line`.
pub fn export_plan_to_csv(plan: &SweepPlan, path: impl AsRef<Path>) -> Result<(), ExportError> {
    ensure_not_empty(&plan.pairs)?;
    let file = create_output_file(path)?;
    csv::export_plan_to_csv_impl(plan, file)
}
