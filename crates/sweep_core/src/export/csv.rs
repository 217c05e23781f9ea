use crate::error::ExportError;
use crate::plan::SweepPlan;

pub(crate) fn export_plan_to_csv_impl(
    plan: &SweepPlan,
    file: std::fs::File,
) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "pair_index",
        "dataset",
        "flow_depth",
        "variant",
        "snapshot_prefix",
        "command_line",
    ])?;

    for pair in &plan.pairs {
        for invocation in [&pair.boosted, &pair.baseline] {
            wtr.write_record(&[
                pair.index.to_string(),
                pair.dataset.to_string(),
                pair.flow_depth.to_string(),
                invocation.variant.to_string(),
                invocation.snapshot_prefix.clone(),
                invocation.command_line(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
