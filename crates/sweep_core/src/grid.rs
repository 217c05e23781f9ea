//! Sweep axes and their Cartesian product.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::flow::Dataset;

pub const MAX_GRID_POINTS: usize = 10_000;

/// Launch order of the density-matching datasets.
pub const DEFAULT_DATASETS: [Dataset; 5] = [
    Dataset::new(2),
    Dataset::new(3),
    Dataset::new(4),
    Dataset::new(1),
    Dataset::new(0),
];

pub const DEFAULT_FLOW_DEPTHS: [u32; 2] = [8, 16];

/// One (dataset, flow depth) combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub dataset: Dataset,
    pub flow_depth: u32,
}

/// Ordered sweep axes. Pairs are enumerated dataset-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepGrid {
    datasets: Vec<Dataset>,
    flow_depths: Vec<u32>,
}

impl SweepGrid {
    pub fn new() -> Self {
        Self {
            datasets: DEFAULT_DATASETS.to_vec(),
            flow_depths: DEFAULT_FLOW_DEPTHS.to_vec(),
        }
    }

    /// Replace the dataset axis.
    pub fn datasets(mut self, datasets: Vec<Dataset>) -> Self {
        self.datasets = datasets;
        self
    }

    /// Replace the flow-depth axis.
    pub fn flow_depths(mut self, depths: Vec<u32>) -> Self {
        self.flow_depths = depths;
        self
    }

    pub fn dataset_axis(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn flow_depth_axis(&self) -> &[u32] {
        &self.flow_depths
    }

    pub fn len(&self) -> usize {
        self.datasets.len().saturating_mul(self.flow_depths.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All pairs in launch order: every depth of the first dataset, then the
    /// next dataset.
    pub fn points(&self) -> Vec<GridPoint> {
        self.datasets
            .iter()
            .flat_map(|&dataset| {
                self.flow_depths
                    .iter()
                    .map(move |&flow_depth| GridPoint {
                        dataset,
                        flow_depth,
                    })
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.datasets.is_empty() {
            return Err(ValidationError::new("dataset axis cannot be empty"));
        }
        if self.flow_depths.is_empty() {
            return Err(ValidationError::new("flow depth axis cannot be empty"));
        }
        if let Some(dup) = first_duplicate(&self.datasets) {
            return Err(ValidationError::new(format!(
                "dataset {dup} appears more than once"
            )));
        }
        if let Some(dup) = first_duplicate(&self.flow_depths) {
            return Err(ValidationError::new(format!(
                "flow depth {dup} appears more than once"
            )));
        }
        if self.flow_depths.contains(&0) {
            return Err(ValidationError::new(
                "flow depths must be positive integers",
            ));
        }
        if self.len() > MAX_GRID_POINTS {
            return Err(ValidationError::new(format!(
                "sweep grid is too large (>{MAX_GRID_POINTS} points)"
            )));
        }
        Ok(())
    }
}

impl Default for SweepGrid {
    fn default() -> Self {
        Self::new()
    }
}

fn first_duplicate<T>(values: &[T]) -> Option<T>
where
    T: Copy + Eq + std::hash::Hash,
{
    let mut seen = HashSet::new();
    values.iter().copied().find(|value| !seen.insert(*value))
}
