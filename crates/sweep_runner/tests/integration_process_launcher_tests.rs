#![cfg(unix)]

use std::fs;
use std::path::Path;

use sweep_core::{Dataset, SweepConfig, SweepGrid, SweepPlan};
use sweep_runner::{run_sweep, JobOutcome, ProcessLauncher, SweepOptions};

const FAKE_TRAINER: &str = r#"#!/bin/sh
dataset=""
flow=""
depth=""
while [ $# -gt 0 ]; do
  case "$1" in
    --dataset) dataset="$2"; shift 2 ;;
    --flow) flow="$2"; shift 2 ;;
    --num_flows) depth="$2"; shift 2 ;;
    *) shift ;;
  esac
done
echo "$flow" > "${dataset}_${depth}_${flow}.out"
if [ "$flow" = "boosted" ] && [ "$dataset" = "u3" ]; then
  exit 3
fi
exit 0
"#;

fn plan_with_fake_trainer(dir: &Path) -> SweepPlan {
    let script = dir.join("fake_density.sh");
    fs::write(&script, FAKE_TRAINER).expect("write fake trainer");

    let config = SweepConfig {
        interpreter: "sh".to_string(),
        script: script.to_string_lossy().into_owned(),
        ..SweepConfig::default()
    };
    let grid = SweepGrid::new()
        .datasets(vec![Dataset::new(2), Dataset::new(3)])
        .flow_depths(vec![8]);
    SweepPlan::build(&config, &grid).expect("plan")
}

#[test]
fn runs_real_processes_and_collects_exit_codes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let plan = plan_with_fake_trainer(dir.path());

    let launcher = ProcessLauncher::with_workdir(dir.path());
    let options = SweepOptions {
        wait_for_background: true,
        ..SweepOptions::default()
    };
    let report = run_sweep(&plan, &launcher, &options, "sig");

    for name in ["u2_8_boosted.out", "u2_8_planar.out", "u3_8_boosted.out", "u3_8_planar.out"] {
        assert!(dir.path().join(name).exists(), "{name} was not written");
    }

    assert_eq!(report.records.len(), 4);
    assert_eq!(report.outstanding(), 0);
    assert_eq!(report.failed(), 1);
    assert_eq!(
        report.records[2].outcome,
        JobOutcome::Exited {
            code: Some(3),
            success: false
        }
    );
    assert!(report.records[2].pid.is_some());
}

#[test]
fn missing_interpreter_is_recorded_not_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = SweepConfig {
        interpreter: dir.path().join("no-such-python").to_string_lossy().into_owned(),
        ..SweepConfig::default()
    };
    let grid = SweepGrid::new()
        .datasets(vec![Dataset::new(0)])
        .flow_depths(vec![8, 16]);
    let plan = SweepPlan::build(&config, &grid).expect("plan");

    let report = run_sweep(&plan, &ProcessLauncher::new(), &SweepOptions::default(), "sig");

    assert_eq!(report.records.len(), 4);
    assert!(report
        .records
        .iter()
        .all(|r| matches!(r.outcome, JobOutcome::LaunchFailed { .. })));
}
