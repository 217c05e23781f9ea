//! Command-line construction for the two runs issued per grid point.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SweepConfig;
use crate::flow::{Dataset, FlowKind};
use crate::grid::GridPoint;
use crate::snapshot::snapshot_prefix;

/// Flags that only the boosted run may carry.
pub const BOOSTING_FLAGS: [&str; 3] = [
    "--num_components",
    "--iters_per_component",
    "--regularization_rate",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobVariant {
    /// Launched in the background; the sweep does not wait for it.
    Boosted,
    /// Single-flow control run; the sweep blocks until it exits.
    Baseline,
}

impl JobVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            JobVariant::Boosted => "boosted",
            JobVariant::Baseline => "baseline",
        }
    }
}

impl fmt::Display for JobVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully parameterised call of the training program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub variant: JobVariant,
    pub dataset: Dataset,
    pub flow_depth: u32,
    pub interpreter: String,
    pub script: String,
    pub args: Vec<String>,
    /// Snapshot directory the trainer will create, minus its timestamp suffix.
    pub snapshot_prefix: String,
}

impl Invocation {
    pub fn boosted(config: &SweepConfig, point: GridPoint) -> Self {
        Self::build(config, point, JobVariant::Boosted)
    }

    pub fn baseline(config: &SweepConfig, point: GridPoint) -> Self {
        Self::build(config, point, JobVariant::Baseline)
    }

    fn build(config: &SweepConfig, point: GridPoint, variant: JobVariant) -> Self {
        let flow = match variant {
            JobVariant::Boosted => FlowKind::Boosted,
            JobVariant::Baseline => config.component_type,
        };

        let mut args = ArgList::default();
        args.flag("--dataset", point.dataset);
        args.flag("--experiment_name", &config.experiment_name);
        if config.no_cuda {
            args.switch("--no_cuda");
        }
        args.flag("--num_steps", config.num_steps);
        args.flag("--plot_resolution", config.plot_resolution);
        args.flag("--min_beta", format_float(config.min_beta));
        args.flag("--num_workers", config.num_workers);
        args.flag("--flow", flow);
        if variant == JobVariant::Boosted {
            args.flag("--num_components", config.num_components);
            if let Some(iters) = config.iters_per_component {
                args.flag("--iters_per_component", iters);
            }
            args.flag(
                "--regularization_rate",
                format_float(config.regularization_rate),
            );
        }
        args.flag("--num_flows", point.flow_depth);
        args.flag("--z_size", config.z_size);
        args.flag("--batch_size", config.batch_size);
        args.flag("--manual_seed", config.seed);
        args.flag("--log_interval", config.log_interval);
        args.flag("--plot_interval", config.plot_interval);

        Self {
            variant,
            dataset: point.dataset,
            flow_depth: point.flow_depth,
            interpreter: config.interpreter.clone(),
            script: config.script.clone(),
            args: args.0,
            snapshot_prefix: snapshot_prefix(config, variant, point),
        }
    }

    /// Human-readable command line, arguments separated by single spaces.
    pub fn command_line(&self) -> String {
        std::iter::once(self.interpreter.as_str())
            .chain(std::iter::once(self.script.as_str()))
            .chain(self.args.iter().map(String::as_str))
            .map(shell_word)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Value following `flag`, if the flag takes one.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        let pos = self.args.iter().position(|arg| arg == flag)?;
        self.args
            .get(pos + 1)
            .filter(|next| !next.starts_with("--"))
            .map(String::as_str)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|arg| arg == flag)
    }
}

#[derive(Default)]
struct ArgList(Vec<String>);

impl ArgList {
    fn flag(&mut self, name: &str, value: impl ToString) {
        self.0.push(name.to_string());
        self.0.push(value.to_string());
    }

    fn switch(&mut self, name: &str) {
        self.0.push(name.to_string());
    }
}

/// Render floats the way the trainer's own config echoes them: integral values
/// keep a trailing `.0` (`1.0`, not `1`).
pub fn format_float(value: f64) -> String {
    format!("{value:?}")
}

fn shell_word(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(dataset: u32, flow_depth: u32) -> GridPoint {
        GridPoint {
            dataset: Dataset::new(dataset),
            flow_depth,
        }
    }

    #[test]
    fn baseline_command_matches_reference_line() {
        let config = SweepConfig {
            batch_size: 128,
            seed: 42,
            num_workers: 4,
            z_size: 2,
            component_type: FlowKind::Planar,
            ..SweepConfig::default()
        };
        let invocation = Invocation::baseline(&config, point(3, 16));
        assert_eq!(
            invocation.command_line(),
            "python density.py --dataset u3 --experiment_name density_matching --no_cuda \
             --num_steps 100001 --plot_resolution 500 --min_beta 1.0 --num_workers 4 \
             --flow planar --num_flows 16 --z_size 2 --batch_size 128 --manual_seed 42 \
             --log_interval 5000 --plot_interval 5000"
        );
    }

    #[test]
    fn boosted_command_carries_boosting_block() {
        let config = SweepConfig {
            regularization_rate: 0.8,
            ..SweepConfig::default()
        };
        let invocation = Invocation::boosted(&config, point(2, 8));
        let line = invocation.command_line();
        assert!(line.contains("--flow boosted --num_components 2 --regularization_rate 0.8"));
        assert!(line.ends_with("--num_flows 8 --z_size 2 --batch_size 64 --manual_seed 123 --log_interval 5000 --plot_interval 5000"));
        assert_eq!(invocation.variant, JobVariant::Boosted);
    }

    #[test]
    fn iters_per_component_sits_between_components_and_rate() {
        let config = SweepConfig {
            iters_per_component: Some(25_000),
            ..SweepConfig::default()
        };
        let invocation = Invocation::boosted(&config, point(0, 8));
        assert!(invocation.command_line().contains(
            "--num_components 2 --iters_per_component 25000 --regularization_rate 0.4"
        ));

        let baseline = Invocation::baseline(&config, point(0, 8));
        assert!(!baseline.has_flag("--iters_per_component"));
    }

    #[test]
    fn baseline_never_carries_boosting_flags() {
        let config = SweepConfig {
            iters_per_component: Some(10),
            ..SweepConfig::default()
        };
        let baseline = Invocation::baseline(&config, point(1, 16));
        for flag in BOOSTING_FLAGS {
            assert!(!baseline.has_flag(flag), "{flag} leaked into baseline");
        }
        assert_eq!(baseline.flag_value("--flow"), Some("planar"));
    }

    #[test]
    fn cuda_runs_drop_the_switch() {
        let config = SweepConfig {
            no_cuda: false,
            ..SweepConfig::default()
        };
        let invocation = Invocation::baseline(&config, point(1, 8));
        assert!(!invocation.has_flag("--no_cuda"));
        assert_eq!(invocation.flag_value("--experiment_name"), Some("density_matching"));
    }

    #[test]
    fn flag_value_skips_switches() {
        let invocation = Invocation::baseline(&SweepConfig::default(), point(1, 8));
        assert_eq!(invocation.flag_value("--no_cuda"), None);
        assert_eq!(invocation.flag_value("--min_beta"), Some("1.0"));
    }

    #[test]
    fn float_rendering_keeps_fraction() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(0.0), "0.0");
    }

    #[test]
    fn command_line_quotes_words_with_spaces() {
        let config = SweepConfig {
            script: "my runs/density.py".to_string(),
            ..SweepConfig::default()
        };
        let invocation = Invocation::baseline(&config, point(1, 8));
        assert!(invocation
            .command_line()
            .starts_with("python 'my runs/density.py' --dataset u1"));
    }
}
