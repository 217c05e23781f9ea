//! Process launching behind a trait so the driver can be exercised without
//! spawning real training runs.

use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus};

use serde::{Deserialize, Serialize};
use sweep_core::Invocation;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for process {pid:?}: {source}")]
    Wait {
        pid: Option<u32>,
        #[source]
        source: std::io::Error,
    },
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitSummary {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub success: bool,
}

impl ExitSummary {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            success: true,
        }
    }

    pub fn failure(code: Option<i32>) -> Self {
        Self {
            code,
            success: false,
        }
    }
}

impl From<ExitStatus> for ExitSummary {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
            success: status.success(),
        }
    }
}

/// A launched job the sweep does not block on.
pub trait BackgroundJob: Send {
    fn pid(&self) -> Option<u32>;

    /// Non-blocking poll; `Ok(None)` while still running.
    fn try_wait(&mut self) -> Result<Option<ExitSummary>, LaunchError>;

    fn wait(&mut self) -> Result<ExitSummary, LaunchError>;
}

pub trait Launcher {
    fn spawn_background(&self, invocation: &Invocation)
        -> Result<Box<dyn BackgroundJob>, LaunchError>;

    /// Launch and block until the process exits.
    fn run_foreground(&self, invocation: &Invocation) -> Result<ExitSummary, LaunchError>;
}

/// Runs invocations as real child processes. Children inherit stdio, and a
/// background child that is never waited on keeps running after the sweep.
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
    workdir: Option<PathBuf>,
}

impl ProcessLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workdir(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(workdir.into()),
        }
    }

    fn command(&self, invocation: &Invocation) -> Command {
        let mut command = Command::new(&invocation.interpreter);
        command.arg(&invocation.script).args(&invocation.args);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }
        command
    }

    fn spawn(&self, invocation: &Invocation) -> Result<Child, LaunchError> {
        debug!(command = %invocation.command_line(), "spawning");
        self.command(invocation)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: invocation.interpreter.clone(),
                source,
            })
    }
}

impl Launcher for ProcessLauncher {
    fn spawn_background(
        &self,
        invocation: &Invocation,
    ) -> Result<Box<dyn BackgroundJob>, LaunchError> {
        let child = self.spawn(invocation)?;
        Ok(Box::new(ChildJob { child }))
    }

    fn run_foreground(&self, invocation: &Invocation) -> Result<ExitSummary, LaunchError> {
        let mut child = self.spawn(invocation)?;
        let pid = child.id();
        child
            .wait()
            .map(ExitSummary::from)
            .map_err(|source| LaunchError::Wait {
                pid: Some(pid),
                source,
            })
    }
}

struct ChildJob {
    child: Child,
}

impl BackgroundJob for ChildJob {
    fn pid(&self) -> Option<u32> {
        Some(self.child.id())
    }

    fn try_wait(&mut self) -> Result<Option<ExitSummary>, LaunchError> {
        let pid = self.pid();
        self.child
            .try_wait()
            .map(|status| status.map(ExitSummary::from))
            .map_err(|source| LaunchError::Wait { pid, source })
    }

    fn wait(&mut self) -> Result<ExitSummary, LaunchError> {
        let pid = self.pid();
        self.child
            .wait()
            .map(ExitSummary::from)
            .map_err(|source| LaunchError::Wait { pid, source })
    }
}

/// Logs each command instead of running it; every job "succeeds" at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunLauncher;

impl Launcher for DryRunLauncher {
    fn spawn_background(
        &self,
        invocation: &Invocation,
    ) -> Result<Box<dyn BackgroundJob>, LaunchError> {
        info!(variant = %invocation.variant, command = %invocation.command_line(), "dry run (background)");
        Ok(Box::new(FinishedJob(ExitSummary::success())))
    }

    fn run_foreground(&self, invocation: &Invocation) -> Result<ExitSummary, LaunchError> {
        info!(variant = %invocation.variant, command = %invocation.command_line(), "dry run");
        Ok(ExitSummary::success())
    }
}

/// A background job that has already ended with a known result.
#[derive(Debug, Clone, Copy)]
pub struct FinishedJob(pub ExitSummary);

impl BackgroundJob for FinishedJob {
    fn pid(&self) -> Option<u32> {
        None
    }

    fn try_wait(&mut self) -> Result<Option<ExitSummary>, LaunchError> {
        Ok(Some(self.0))
    }

    fn wait(&mut self) -> Result<ExitSummary, LaunchError> {
        Ok(self.0)
    }
}
