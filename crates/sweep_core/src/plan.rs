//! The ordered sweep plan: two invocations per grid point.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::SweepConfig;
use crate::error::ValidationError;
use crate::flow::Dataset;
use crate::grid::SweepGrid;
use crate::invocation::Invocation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairPlan {
    pub index: usize,
    pub dataset: Dataset,
    pub flow_depth: u32,
    pub boosted: Invocation,
    pub baseline: Invocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepPlan {
    pub pairs: Vec<PairPlan>,
    pub fingerprint: String,
}

impl SweepPlan {
    /// Validate `config` and `grid`, then lay out every pair in launch order.
    pub fn build(config: &SweepConfig, grid: &SweepGrid) -> Result<Self, ValidationError> {
        config.validate()?;
        grid.validate()?;

        let pairs: Vec<PairPlan> = grid
            .points()
            .into_iter()
            .enumerate()
            .map(|(index, point)| PairPlan {
                index,
                dataset: point.dataset,
                flow_depth: point.flow_depth,
                boosted: Invocation::boosted(config, point),
                baseline: Invocation::baseline(config, point),
            })
            .collect();

        let fingerprint = plan_fingerprint(&pairs);
        Ok(Self { pairs, fingerprint })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Every invocation in launch order (boosted before baseline per pair).
    pub fn invocations(&self) -> impl Iterator<Item = &Invocation> + '_ {
        self.pairs
            .iter()
            .flat_map(|pair| [&pair.boosted, &pair.baseline])
    }
}

/// SHA-256 over the rendered command lines in launch order.
fn plan_fingerprint(pairs: &[PairPlan]) -> String {
    let mut hasher = Sha256::new();
    for pair in pairs {
        for invocation in [&pair.boosted, &pair.baseline] {
            hasher.update(invocation.variant.as_str());
            hasher.update(b"\t");
            hasher.update(invocation.command_line());
            hasher.update(b"\n");
        }
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::{JobVariant, BOOSTING_FLAGS};

    const SHARED_FLAGS: [&str; 11] = [
        "--experiment_name",
        "--num_steps",
        "--plot_resolution",
        "--min_beta",
        "--num_workers",
        "--num_flows",
        "--z_size",
        "--batch_size",
        "--manual_seed",
        "--log_interval",
        "--plot_interval",
    ];

    #[test]
    fn default_plan_issues_one_boosted_and_one_baseline_per_pair() {
        let plan = SweepPlan::build(&SweepConfig::default(), &SweepGrid::default()).unwrap();
        assert_eq!(plan.len(), 10);

        let variants: Vec<JobVariant> = plan.invocations().map(|inv| inv.variant).collect();
        assert_eq!(variants.len(), 20);
        for chunk in variants.chunks(2) {
            assert_eq!(chunk, [JobVariant::Boosted, JobVariant::Baseline]);
        }
    }

    #[test]
    fn pairs_share_every_common_value() {
        let config = SweepConfig {
            seed: 9,
            batch_size: 256,
            ..SweepConfig::default()
        };
        let plan = SweepPlan::build(&config, &SweepGrid::default()).unwrap();

        for pair in &plan.pairs {
            for flag in SHARED_FLAGS {
                assert_eq!(
                    pair.boosted.flag_value(flag),
                    pair.baseline.flag_value(flag),
                    "{flag} differs for pair {}",
                    pair.index
                );
            }
            assert_eq!(
                pair.boosted.flag_value("--dataset"),
                Some(pair.dataset.to_string().as_str())
            );
            for flag in BOOSTING_FLAGS.iter().filter(|f| **f != "--iters_per_component") {
                assert!(pair.boosted.has_flag(flag));
                assert!(!pair.baseline.has_flag(flag));
            }
        }
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive() {
        let grid = SweepGrid::default();
        let a = SweepPlan::build(&SweepConfig::default(), &grid).unwrap();
        let b = SweepPlan::build(&SweepConfig::default(), &grid).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.fingerprint.len(), 64);

        let changed = SweepConfig {
            seed: 1,
            ..SweepConfig::default()
        };
        let c = SweepPlan::build(&changed, &grid).unwrap();
        assert_ne!(a.fingerprint, c.fingerprint);
    }

    #[test]
    fn invalid_config_produces_no_plan() {
        let config = SweepConfig {
            regularization_rate: -1.0,
            ..SweepConfig::default()
        };
        assert!(SweepPlan::build(&config, &SweepGrid::default()).is_err());
    }
}
