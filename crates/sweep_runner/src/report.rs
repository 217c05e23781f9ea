//! What happened to every invocation of a sweep.

use std::path::Path;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use sweep_core::export::{create_output_file, ensure_not_empty, write_json};
use sweep_core::{ExportError, Invocation, JobVariant};

use crate::launcher::ExitSummary;

/// Launch signature in the trainer's `YYYY_MM_DD_HH_MM_SS` format.
pub fn run_signature(now: DateTime<Local>) -> String {
    now.format("%Y_%m_%d_%H_%M_%S").to_string()
}

pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Running,
    Exited { code: Option<i32>, success: bool },
    LaunchFailed { message: String },
    WaitFailed { message: String },
    /// Still running when the sweep returned without waiting for it.
    Detached,
}

impl JobOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            JobOutcome::Exited { success: false, .. }
                | JobOutcome::LaunchFailed { .. }
                | JobOutcome::WaitFailed { .. }
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Exited { success: true, .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobOutcome::Running => "running",
            JobOutcome::Exited { .. } => "exited",
            JobOutcome::LaunchFailed { .. } => "launch_failed",
            JobOutcome::WaitFailed { .. } => "wait_failed",
            JobOutcome::Detached => "detached",
        }
    }
}

impl From<ExitSummary> for JobOutcome {
    fn from(summary: ExitSummary) -> Self {
        JobOutcome::Exited {
            code: summary.code,
            success: summary.success,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub pair_index: usize,
    pub dataset: String,
    pub flow_depth: u32,
    pub variant: JobVariant,
    pub pid: Option<u32>,
    pub command_line: String,
    pub snapshot_prefix: String,
    pub launched_at: String,
    pub finished_at: Option<String>,
    pub outcome: JobOutcome,
}

impl JobRecord {
    pub(crate) fn launched(pair_index: usize, invocation: &Invocation) -> Self {
        Self {
            pair_index,
            dataset: invocation.dataset.to_string(),
            flow_depth: invocation.flow_depth,
            variant: invocation.variant,
            pid: None,
            command_line: invocation.command_line(),
            snapshot_prefix: invocation.snapshot_prefix.clone(),
            launched_at: timestamp(),
            finished_at: None,
            outcome: JobOutcome::Running,
        }
    }

    pub(crate) fn finish(&mut self, outcome: JobOutcome) {
        self.finished_at = Some(timestamp());
        self.outcome = outcome;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub run_signature: String,
    pub plan_fingerprint: String,
    pub started_at: String,
    pub finished_at: String,
    pub records: Vec<JobRecord>,
}

impl SweepReport {
    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_failure()).count()
    }

    /// Jobs whose end was never observed.
    pub fn outstanding(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Running | JobOutcome::Detached))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn records_for(&self, variant: JobVariant) -> impl Iterator<Item = &JobRecord> + '_ {
        self.records.iter().filter(move |r| r.variant == variant)
    }
}

pub fn export_report_to_json(
    report: &SweepReport,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    write_json(report, path)
}

/// One CSV row per job record.
pub fn export_report_to_csv(
    report: &SweepReport,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    ensure_not_empty(&report.records)?;
    let file = create_output_file(path)?;
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "run_signature",
        "pair_index",
        "dataset",
        "flow_depth",
        "variant",
        "pid",
        "status",
        "exit_code",
        "message",
        "launched_at",
        "finished_at",
        "snapshot_prefix",
        "command_line",
    ])?;

    for record in &report.records {
        let (exit_code, message) = match &record.outcome {
            JobOutcome::Exited { code, .. } => (
                code.map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                String::new(),
            ),
            JobOutcome::LaunchFailed { message } | JobOutcome::WaitFailed { message } => {
                (String::new(), message.clone())
            }
            JobOutcome::Running | JobOutcome::Detached => (String::new(), String::new()),
        };

        wtr.write_record(&[
            report.run_signature.clone(),
            record.pair_index.to_string(),
            record.dataset.clone(),
            record.flow_depth.to_string(),
            record.variant.to_string(),
            record.pid.map(|p| p.to_string()).unwrap_or_default(),
            record.outcome.as_str().to_string(),
            exit_code,
            message,
            record.launched_at.clone(),
            record.finished_at.clone().unwrap_or_default(),
            record.snapshot_prefix.clone(),
            record.command_line.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
