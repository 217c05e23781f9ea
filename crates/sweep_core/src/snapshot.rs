//! Snapshot directory names as the training program derives them.
//!
//! The trainer writes each run to
//! `<root>/<prefix>_<signature>/` where the signature is its own launch time
//! (`YYYY_MM_DD_HH_MM_SS`). The prefix is fully determined by the run's
//! flags, so the sweep can record where every run's output will land.

use std::path::PathBuf;

use crate::config::SweepConfig;
use crate::flow::{FlowKind, TRAINER_DEFAULT_COMPONENT};
use crate::grid::GridPoint;
use crate::invocation::JobVariant;

pub const SNAPSHOT_ROOT: &str = "./results/snapshots";

// Trainer defaults for options the sweep never passes.
const DEFAULT_BASE_NETWORK: &str = "relu";
const DEFAULT_NUM_BASE_LAYERS: u32 = 1;
const DEFAULT_H_SIZE: u32 = 16;
const DEFAULT_NUM_ORTHO_VECS: u32 = 8;
const DEFAULT_NUM_HOUSEHOLDER: u32 = 8;

pub fn snapshot_prefix(config: &SweepConfig, variant: JobVariant, point: GridPoint) -> String {
    let flow = match variant {
        JobVariant::Boosted => FlowKind::Boosted,
        JobVariant::Baseline => config.component_type,
    };

    let mut prefix = format!("{}_{}_", config.experiment_name, flow);
    if flow != FlowKind::NoFlow {
        prefix.push_str(&format!("K{}", point.flow_depth));
    }

    match flow {
        FlowKind::Orthogonal => prefix.push_str(&format!("_vectors{DEFAULT_NUM_ORTHO_VECS}")),
        FlowKind::Householder => {
            prefix.push_str(&format!("_householder{DEFAULT_NUM_HOUSEHOLDER}"))
        }
        FlowKind::Iaf => prefix.push_str(&format!("_hsize{DEFAULT_H_SIZE}")),
        _ => {}
    }

    let component = if flow.is_boosted() {
        // Truncates toward zero like the trainer's int().
        let reg = (100.0 * config.regularization_rate) as i64;
        prefix.push_str(&format!(
            "_{}_C{}_reg{}",
            TRAINER_DEFAULT_COMPONENT, config.num_components, reg
        ));
        TRAINER_DEFAULT_COMPONENT
    } else {
        flow
    };

    if component == FlowKind::Realnvp {
        prefix.push_str(&format!(
            "_{DEFAULT_BASE_NETWORK}{DEFAULT_NUM_BASE_LAYERS}_hsize{DEFAULT_H_SIZE}"
        ));
    }

    prefix.push_str("_lr_scheduling");
    if config.min_beta < 1.0 {
        prefix.push_str("_annealed");
    }
    prefix.push_str("_on_");
    prefix.push_str(&point.dataset.to_string());
    prefix
}

/// Full snapshot directory once the trainer's launch signature is known.
pub fn snapshot_dir(prefix: &str, signature: &str) -> PathBuf {
    PathBuf::from(SNAPSHOT_ROOT).join(format!("{prefix}_{signature}"))
}
