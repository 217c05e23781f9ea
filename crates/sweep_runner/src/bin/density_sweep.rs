use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use sweep_core::export::{export_plan_to_csv, export_plan_to_json};
use sweep_core::{Dataset, SweepConfig, SweepGrid, SweepPlan};
use sweep_runner::report::{export_report_to_csv, export_report_to_json};
use sweep_runner::{
    logging, run_signature, run_sweep, DryRunLauncher, Launcher, ProcessLauncher, SweepOptions,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "density_sweep",
    about = "Launch boosted vs. baseline density-matching runs over a dataset/flow-depth grid",
    long_about = "For every (dataset, flow depth) pair, launches a boosted run in the\n\
                  background and a baseline single-flow run in the foreground."
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every command line in launch order without running anything
    Plan {
        #[command(flatten)]
        sweep: SweepArgs,
        /// Also write the plan as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Also write the plan as CSV (one row per invocation)
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Run the sweep
    Run {
        #[command(flatten)]
        sweep: SweepArgs,
        /// Log commands instead of launching them
        #[arg(long)]
        dry_run: bool,
        /// Wait for the oldest background run while this many are alive
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        max_background: Option<u64>,
        /// Wait for all background runs before exiting
        #[arg(long)]
        wait: bool,
        /// Exit with status 1 if any recorded run failed
        #[arg(long)]
        strict: bool,
        /// Working directory for launched processes
        #[arg(long)]
        workdir: Option<PathBuf>,
        #[arg(long)]
        report_json: Option<PathBuf>,
        #[arg(long)]
        report_csv: Option<PathBuf>,
        #[arg(long)]
        no_progress: bool,
    },
}

#[derive(Args)]
struct SweepArgs {
    /// Shell-style defaults file (key=value lines)
    #[arg(long, env = "DENSITY_SWEEP_DEFAULTS_FILE")]
    defaults_file: Option<PathBuf>,
    /// Dataset axis, e.g. u2,u3,u4,u1,u0
    #[arg(long, value_delimiter = ',')]
    datasets: Vec<Dataset>,
    /// Flow-depth axis, e.g. 8,16
    #[arg(long, value_delimiter = ',')]
    flow_depths: Vec<u32>,
    #[arg(long)]
    experiment_name: Option<String>,
    #[arg(long)]
    num_steps: Option<u64>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    batch_size: Option<u32>,
    #[arg(long)]
    num_workers: Option<u32>,
    #[arg(long)]
    component_type: Option<String>,
    #[arg(long)]
    z_size: Option<u32>,
    #[arg(long)]
    regularization_rate: Option<f64>,
    #[arg(long)]
    min_beta: Option<f64>,
    #[arg(long)]
    iters_per_component: Option<u64>,
    /// Shorthand for both the log and plot interval
    #[arg(long)]
    logging: Option<u64>,
    /// Drop --no_cuda from every command
    #[arg(long)]
    cuda: bool,
    /// Force --no_cuda even if the defaults file or environment clears it
    #[arg(long, conflicts_with = "cuda")]
    no_cuda: bool,
    #[arg(long)]
    interpreter: Option<String>,
    #[arg(long)]
    script: Option<String>,
}

impl SweepArgs {
    fn overrides(&self) -> Vec<(&'static str, String)> {
        let mut overrides = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(value) = value {
                overrides.push((key, value));
            }
        };
        push("experiment_name", self.experiment_name.clone());
        push("num_steps", self.num_steps.map(|v| v.to_string()));
        push("seed", self.seed.map(|v| v.to_string()));
        push("batch_size", self.batch_size.map(|v| v.to_string()));
        push("num_workers", self.num_workers.map(|v| v.to_string()));
        push("component_type", self.component_type.clone());
        push("z_size", self.z_size.map(|v| v.to_string()));
        push("regularization_rate", self.regularization_rate.map(|v| v.to_string()));
        push("min_beta", self.min_beta.map(|v| v.to_string()));
        push("iters_per_component", self.iters_per_component.map(|v| v.to_string()));
        push("logging", self.logging.map(|v| v.to_string()));
        push("interpreter", self.interpreter.clone());
        push("script", self.script.clone());
        if self.cuda {
            push("no_cuda", Some("false".to_string()));
        }
        if self.no_cuda {
            push("no_cuda", Some("true".to_string()));
        }
        overrides
    }

    fn build_plan(&self) -> anyhow::Result<SweepPlan> {
        let mut config = SweepConfig::load(self.defaults_file.as_deref())?;
        config.apply_overrides("command line", self.overrides())?;

        let mut grid = SweepGrid::default();
        if !self.datasets.is_empty() {
            grid = grid.datasets(self.datasets.clone());
        }
        if !self.flow_depths.is_empty() {
            grid = grid.flow_depths(self.flow_depths.clone());
        }

        let plan = SweepPlan::build(&config, &grid).context("invalid sweep")?;
        Ok(plan)
    }
}

fn execute(command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Plan { sweep, json, csv } => {
            let plan = sweep.build_plan()?;
            for invocation in plan.invocations() {
                println!("{}", invocation.command_line());
            }
            if let Some(path) = json {
                export_plan_to_json(&plan, &path)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            if let Some(path) = csv {
                export_plan_to_csv(&plan, &path)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            sweep,
            dry_run,
            max_background,
            wait,
            strict,
            workdir,
            report_json,
            report_csv,
            no_progress,
        } => {
            let plan = sweep.build_plan()?;
            let options = SweepOptions {
                max_background: max_background.map(|n| n as usize),
                wait_for_background: wait,
                show_progress: !no_progress && !dry_run,
            };

            let process_launcher = match workdir {
                Some(dir) => ProcessLauncher::with_workdir(dir),
                None => ProcessLauncher::new(),
            };
            let launcher: &dyn Launcher = if dry_run {
                &DryRunLauncher
            } else {
                &process_launcher
            };

            let signature = run_signature(chrono::Local::now());
            let report = run_sweep(&plan, launcher, &options, signature);

            if let Some(path) = report_json {
                export_report_to_json(&report, &path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), "wrote JSON report");
            }
            if let Some(path) = report_csv {
                export_report_to_csv(&report, &path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!(path = %path.display(), "wrote CSV report");
            }

            if strict && report.has_failures() {
                error!(failed = report.failed(), "sweep had failed runs");
                return Ok(ExitCode::from(1));
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose, cli.quiet, cli.log_json);

    match execute(cli.command) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(2)
        }
    }
}
