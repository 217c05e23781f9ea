//! Sweep execution with the per-pair ordering guarantee.
//!
//! For every pair the boosted invocation is launched in the background, then
//! the baseline invocation runs to completion before the next pair starts.
//! Background jobs from earlier pairs keep running; by default nothing bounds
//! how many accumulate and nothing waits for them. Failures are recorded and
//! the sweep carries on.

use std::collections::VecDeque;

use indicatif::{ProgressBar, ProgressStyle};
use sweep_core::SweepPlan;
use tracing::{error, info, info_span, warn};

use crate::launcher::{BackgroundJob, LaunchError, Launcher};
use crate::report::{timestamp, JobOutcome, JobRecord, SweepReport};

#[derive(Debug, Clone, Default)]
pub struct SweepOptions {
    /// Block on the oldest background job while this many are alive.
    /// `None` keeps accumulation unbounded.
    pub max_background: Option<usize>,
    /// Wait for every background job after the last pair.
    pub wait_for_background: bool,
    pub show_progress: bool,
}

struct LiveJob {
    record: usize,
    job: Box<dyn BackgroundJob>,
}

pub fn run_sweep(
    plan: &SweepPlan,
    launcher: &dyn Launcher,
    options: &SweepOptions,
    run_signature: impl Into<String>,
) -> SweepReport {
    let run_signature = run_signature.into();
    let started_at = timestamp();
    let mut records: Vec<JobRecord> = Vec::with_capacity(plan.len() * 2);
    let mut live: VecDeque<LiveJob> = VecDeque::new();

    info!(
        pairs = plan.len(),
        fingerprint = %plan.fingerprint,
        signature = %run_signature,
        "starting sweep"
    );

    let pb = progress_bar(plan.len(), options.show_progress);

    for pair in &plan.pairs {
        let _span = info_span!(
            "pair",
            index = pair.index,
            dataset = %pair.dataset,
            flow_depth = pair.flow_depth
        )
        .entered();

        reap_finished(&mut live, &mut records);
        if let Some(max) = options.max_background {
            while !live.is_empty() && live.len() >= max {
                if let Some(oldest) = live.pop_front() {
                    info!(alive = live.len() + 1, max, "background limit reached, waiting for oldest job");
                    wait_job(oldest, &mut records);
                }
            }
        }

        let mut boosted = JobRecord::launched(pair.index, &pair.boosted);
        match launcher.spawn_background(&pair.boosted) {
            Ok(job) => {
                boosted.pid = job.pid();
                info!(pid = ?boosted.pid, "launched boosted run in background");
                live.push_back(LiveJob {
                    record: records.len(),
                    job,
                });
            }
            Err(err) => {
                error!(error = %err, "boosted run failed to launch");
                boosted.finish(failure_outcome(&err));
            }
        }
        records.push(boosted);

        let mut baseline = JobRecord::launched(pair.index, &pair.baseline);
        info!(flow = pair.baseline.flag_value("--flow").unwrap_or_default(), "running baseline");
        match launcher.run_foreground(&pair.baseline) {
            Ok(summary) => {
                if summary.success {
                    info!("baseline run finished");
                } else {
                    warn!(code = ?summary.code, "baseline run exited unsuccessfully");
                }
                baseline.finish(summary.into());
            }
            Err(err) => {
                error!(error = %err, "baseline run failed");
                baseline.finish(failure_outcome(&err));
            }
        }
        records.push(baseline);

        if let Some(ref progress_bar) = pb {
            progress_bar.inc(1);
        }
    }

    if let Some(ref progress_bar) = pb {
        progress_bar.finish_with_message("Completed");
    }

    if options.wait_for_background {
        if !live.is_empty() {
            info!(outstanding = live.len(), "waiting for background runs");
        }
        while let Some(job) = live.pop_front() {
            wait_job(job, &mut records);
        }
    } else {
        reap_finished(&mut live, &mut records);
        if !live.is_empty() {
            info!(
                outstanding = live.len(),
                "leaving background runs detached"
            );
        }
        for job in live.drain(..) {
            records[job.record].outcome = JobOutcome::Detached;
        }
    }

    let report = SweepReport {
        run_signature,
        plan_fingerprint: plan.fingerprint.clone(),
        started_at,
        finished_at: timestamp(),
        records,
    };
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        outstanding = report.outstanding(),
        "sweep finished"
    );
    report
}

fn failure_outcome(err: &LaunchError) -> JobOutcome {
    let message = err.to_string();
    match err {
        LaunchError::Spawn { .. } => JobOutcome::LaunchFailed { message },
        LaunchError::Wait { .. } => JobOutcome::WaitFailed { message },
    }
}

/// Record every background job that has already exited.
fn reap_finished(live: &mut VecDeque<LiveJob>, records: &mut [JobRecord]) {
    live.retain_mut(|entry| match entry.job.try_wait() {
        Ok(None) => true,
        Ok(Some(summary)) => {
            log_background_exit(&records[entry.record], summary.success, summary.code);
            records[entry.record].finish(summary.into());
            false
        }
        Err(err) => {
            warn!(error = %err, "lost track of background run");
            records[entry.record].finish(failure_outcome(&err));
            false
        }
    });
}

fn wait_job(mut entry: LiveJob, records: &mut [JobRecord]) {
    match entry.job.wait() {
        Ok(summary) => {
            log_background_exit(&records[entry.record], summary.success, summary.code);
            records[entry.record].finish(summary.into());
        }
        Err(err) => {
            warn!(error = %err, "lost track of background run");
            records[entry.record].finish(failure_outcome(&err));
        }
    }
}

fn log_background_exit(record: &JobRecord, success: bool, code: Option<i32>) {
    if success {
        info!(pair = record.pair_index, dataset = %record.dataset, flow_depth = record.flow_depth, "boosted run finished");
    } else {
        warn!(pair = record.pair_index, dataset = %record.dataset, flow_depth = record.flow_depth, code = ?code, "boosted run exited unsuccessfully");
    }
}

fn progress_bar(total: usize, show: bool) -> Option<ProgressBar> {
    if !show || total == 0 {
        return None;
    }
    let bar = ProgressBar::new(total as u64);
    match ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pairs ({eta})")
    {
        Ok(style) => bar.set_style(style.progress_chars("#>-")),
        Err(err) => warn!(error = %err, "invalid progress template, using default style"),
    }
    Some(bar)
}
