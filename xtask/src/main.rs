use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the density sweep workspace",
    long_about = "A unified CLI for planning and launching density-matching sweeps\n\
                  and running CI checks in this workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the sweep's command lines without launching anything
    Plan {
        /// Shell-style defaults file forwarded to density_sweep
        #[arg(long)]
        defaults_file: Option<String>,
    },
    /// Launch the full sweep
    Sweep {
        /// Shell-style defaults file forwarded to density_sweep
        #[arg(long)]
        defaults_file: Option<String>,
        /// Log commands instead of launching them
        #[arg(long)]
        dry_run: bool,
        /// Wait for background runs before returning
        #[arg(long)]
        wait: bool,
    },
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Check plus a dry-run sweep
    All,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn density_sweep(subcommand: &str, defaults_file: Option<&str>, extra: &[&str]) {
    let mut args = vec![
        "run",
        "-p",
        "sweep_runner",
        "--bin",
        "density_sweep",
        "--",
        subcommand,
    ];
    if let Some(path) = defaults_file {
        args.extend(["--defaults-file", path]);
    }
    args.extend_from_slice(extra);
    run_cargo(&args);
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test sweep_core");
    run_cargo(&["test", "-p", "sweep_core"]);

    step("Test sweep_runner");
    run_cargo(&["test", "-p", "sweep_runner"]);
}

fn ci_dry_run() {
    step("Dry-run sweep");
    density_sweep("run", None, &["--dry-run", "--wait", "--strict"]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { defaults_file } => {
            density_sweep("plan", defaults_file.as_deref(), &[]);
        }
        Commands::Sweep {
            defaults_file,
            dry_run,
            wait,
        } => {
            let mut extra = Vec::new();
            if dry_run {
                extra.push("--dry-run");
            }
            if wait {
                extra.push("--wait");
            }
            density_sweep("run", defaults_file.as_deref(), &extra);
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::All => {
                    ci_check();
                    ci_dry_run();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}
