//! Identifiers understood by the training program: flow kinds and datasets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Component the trainer uses for boosted runs when `--component_type` is not
/// passed on its command line.
pub const TRAINER_DEFAULT_COMPONENT: FlowKind = FlowKind::Affine;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("unknown flow kind `{0}`")]
    UnknownFlow(String),
    #[error("dataset must look like `u<N>`, got `{0}`")]
    BadDataset(String),
}

/// Flow families accepted by the trainer's `--flow` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Planar,
    Radial,
    Iaf,
    Liniaf,
    Affine,
    Nlsq,
    Realnvp,
    Householder,
    Orthogonal,
    Triangular,
    NoFlow,
    Boosted,
}

impl FlowKind {
    pub const ALL: [FlowKind; 12] = [
        FlowKind::Planar,
        FlowKind::Radial,
        FlowKind::Iaf,
        FlowKind::Liniaf,
        FlowKind::Affine,
        FlowKind::Nlsq,
        FlowKind::Realnvp,
        FlowKind::Householder,
        FlowKind::Orthogonal,
        FlowKind::Triangular,
        FlowKind::NoFlow,
        FlowKind::Boosted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FlowKind::Planar => "planar",
            FlowKind::Radial => "radial",
            FlowKind::Iaf => "iaf",
            FlowKind::Liniaf => "liniaf",
            FlowKind::Affine => "affine",
            FlowKind::Nlsq => "nlsq",
            FlowKind::Realnvp => "realnvp",
            FlowKind::Householder => "householder",
            FlowKind::Orthogonal => "orthogonal",
            FlowKind::Triangular => "triangular",
            FlowKind::NoFlow => "no_flow",
            FlowKind::Boosted => "boosted",
        }
    }

    pub fn is_boosted(self) -> bool {
        self == FlowKind::Boosted
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowKind {
    type Err = IdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        FlowKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| IdentifierError::UnknownFlow(value.to_string()))
    }
}

/// Toy 2D target density, rendered as `u<N>` on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Dataset(u32);

impl Dataset {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

impl FromStr for Dataset {
    type Err = IdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .strip_prefix('u')
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u32>().ok())
            .map(Dataset)
            .ok_or_else(|| IdentifierError::BadDataset(value.to_string()))
    }
}

impl From<Dataset> for String {
    fn from(dataset: Dataset) -> Self {
        dataset.to_string()
    }
}

impl TryFrom<String> for Dataset {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
