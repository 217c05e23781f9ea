//! Shared configuration bag for every invocation in a sweep.
//!
//! Values are layered, lowest precedence first: built-in defaults, a shell-style
//! defaults file, `DENSITY_SWEEP_*` environment variables, then explicit
//! overrides (usually command-line flags). Every layer goes through the same
//! key table in [`SweepConfig::apply_setting`].

use std::ffi::OsString;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, ValidationError};
use crate::flow::FlowKind;

mod defaults_file;

pub use defaults_file::{parse_defaults, Assignment};

/// Prefix for environment overrides, e.g. `DENSITY_SWEEP_SEED=42`.
pub const ENV_PREFIX: &str = "DENSITY_SWEEP_";

/// Number of components in every boosted run.
pub const BOOSTED_NUM_COMPONENTS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub experiment_name: String,
    pub num_steps: u64,
    pub log_interval: u64,
    pub plot_interval: u64,
    pub plot_resolution: u32,
    pub min_beta: f64,
    pub regularization_rate: f64,
    pub iters_per_component: Option<u64>,
    pub num_components: u32,
    pub num_workers: u32,
    pub component_type: FlowKind,
    pub z_size: u32,
    pub batch_size: u32,
    pub seed: u64,
    pub no_cuda: bool,
    pub interpreter: String,
    pub script: String,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            experiment_name: "density_matching".to_string(),
            num_steps: 100_001,
            log_interval: 5_000,
            plot_interval: 5_000,
            plot_resolution: 500,
            min_beta: 1.0,
            regularization_rate: 0.4,
            iters_per_component: None,
            num_components: BOOSTED_NUM_COMPONENTS,
            num_workers: 1,
            component_type: FlowKind::Planar,
            z_size: 2,
            batch_size: 64,
            seed: 123,
            no_cuda: true,
            interpreter: "python".to_string(),
            script: "density.py".to_string(),
        }
    }
}

impl SweepConfig {
    /// Build a configuration from defaults, an optional defaults file and the
    /// process environment.
    pub fn load(defaults_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = defaults_file {
            config.apply_defaults_file(path)?;
        }
        config.apply_env(std::env::vars_os())?;
        Ok(config)
    }

    pub fn apply_defaults_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        for assignment in parse_defaults(&text, path)? {
            let origin = format!("{}:{}", path.display(), assignment.line);
            self.apply_one(&origin, &assignment.key, &assignment.value)?;
        }
        Ok(())
    }

    /// Apply `DENSITY_SWEEP_<KEY>` variables; anything else is ignored,
    /// including variables that are not valid Unicode.
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        for (name, value) in vars {
            let name: OsString = name.into();
            let lossy_name = name.to_string_lossy();
            let Some(suffix) = lossy_name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let origin = format!("environment variable {lossy_name}");
            let key = suffix.to_ascii_lowercase();

            let value: OsString = value.into();
            if name.to_str().is_none() {
                return Err(ConfigError::InvalidValue {
                    origin,
                    key,
                    value: value.to_string_lossy().into_owned(),
                    reason: "variable name is not valid UTF-8".to_string(),
                });
            }
            let value = value
                .into_string()
                .map_err(|raw| ConfigError::InvalidValue {
                    origin: origin.clone(),
                    key: key.clone(),
                    value: raw.to_string_lossy().into_owned(),
                    reason: "value is not valid UTF-8".to_string(),
                })?;
            self.apply_one(&origin, &key, &value)?;
        }
        Ok(())
    }

    pub fn apply_overrides<'a, I>(&mut self, origin: &str, overrides: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        for (key, value) in overrides {
            self.apply_one(origin, key, &value)?;
        }
        Ok(())
    }

    fn apply_one(&mut self, origin: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        match self.apply_setting(key, value) {
            Ok(true) => Ok(()),
            Ok(false) => {
                debug!(origin, key, "ignoring unknown configuration key");
                Ok(())
            }
            Err(reason) => Err(ConfigError::InvalidValue {
                origin: origin.to_string(),
                key: key.to_string(),
                value: value.to_string(),
                reason,
            }),
        }
    }

    /// Set one field by its source name. Returns `Ok(false)` for keys that do
    /// not belong to the configuration bag.
    pub fn apply_setting(&mut self, key: &str, value: &str) -> Result<bool, String> {
        let value = value.trim();
        match key {
            "exp_name" | "experiment_name" => self.experiment_name = value.to_string(),
            "num_steps" => self.num_steps = parse_number(value)?,
            "logging" => {
                let interval = parse_number(value)?;
                self.log_interval = interval;
                self.plot_interval = interval;
            }
            "log_interval" => self.log_interval = parse_number(value)?,
            "plot_interval" => self.plot_interval = parse_number(value)?,
            "plot_resolution" => self.plot_resolution = parse_number(value)?,
            "min_beta" => self.min_beta = parse_number(value)?,
            "regularization_rate" => self.regularization_rate = parse_number(value)?,
            "iters_per_component" => {
                self.iters_per_component = if value.is_empty() {
                    None
                } else {
                    Some(parse_number(value)?)
                }
            }
            "num_components" => self.num_components = parse_number(value)?,
            "num_workers" => self.num_workers = parse_number(value)?,
            "component_type" => {
                self.component_type = value.parse().map_err(|error| format!("{error}"))?
            }
            "z_size" => self.z_size = parse_number(value)?,
            "batch_size" => self.batch_size = parse_number(value)?,
            "seed" | "manual_seed" => self.seed = parse_number(value)?,
            "no_cuda" => self.no_cuda = parse_bool(value)?,
            "interpreter" | "python" => self.interpreter = value.to_string(),
            "script" => self.script = value.to_string(),
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.experiment_name.trim().is_empty() {
            return Err(ValidationError::new("experiment_name cannot be empty"));
        }
        if self.interpreter.trim().is_empty() || self.script.trim().is_empty() {
            return Err(ValidationError::new(
                "interpreter and script must both be set",
            ));
        }
        if self.component_type.is_boosted() {
            return Err(ValidationError::new(
                "component_type must name a single flow, not `boosted`",
            ));
        }
        if !self.regularization_rate.is_finite() || self.regularization_rate < 0.0 {
            return Err(ValidationError::new(
                "For boosting the regularization rate should be greater than or equal to zero",
            ));
        }
        if !self.min_beta.is_finite() {
            return Err(ValidationError::new("min_beta must be a finite number"));
        }
        if self.num_components == 0 {
            return Err(ValidationError::new(
                "num_components must be a positive integer",
            ));
        }

        let positive = [
            ("num_steps", self.num_steps),
            ("log_interval", self.log_interval),
            ("plot_interval", self.plot_interval),
            ("plot_resolution", u64::from(self.plot_resolution)),
            ("z_size", u64::from(self.z_size)),
            ("batch_size", u64::from(self.batch_size)),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ValidationError::new(format!(
                "{name} must be a positive integer"
            )));
        }

        Ok(())
    }
}

fn parse_number<T>(value: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|error| error.to_string())
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err("expected true/false, yes/no or 1/0".to_string()),
    }
}
