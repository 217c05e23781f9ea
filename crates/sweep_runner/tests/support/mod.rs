#![allow(dead_code)]

pub mod launcher;

use sweep_core::{Dataset, SweepConfig, SweepGrid, SweepPlan};

pub fn default_plan() -> SweepPlan {
    SweepPlan::build(&SweepConfig::default(), &SweepGrid::default()).expect("default plan")
}

pub fn small_plan(datasets: &[u32], depths: &[u32]) -> SweepPlan {
    let grid = SweepGrid::new()
        .datasets(datasets.iter().copied().map(Dataset::new).collect())
        .flow_depths(depths.to_vec());
    SweepPlan::build(&SweepConfig::default(), &grid).expect("small plan")
}
