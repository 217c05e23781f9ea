use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sweep_core::{Invocation, JobVariant};
use sweep_runner::{BackgroundJob, ExitSummary, LaunchError, Launcher};

/// Identifies one invocation: (dataset, flow depth, variant).
pub type JobKey = (String, u32, JobVariant);

pub fn key(invocation: &Invocation) -> JobKey {
    (
        invocation.dataset.to_string(),
        invocation.flow_depth,
        invocation.variant,
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Spawned(JobKey),
    ForegroundStarted(JobKey),
    ForegroundFinished(JobKey),
    BackgroundFinished(JobKey),
}

/// Scripted result for one invocation.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    Exit(i32),
    LaunchFails,
    /// The process starts but waiting on it fails.
    WaitFails,
}

#[derive(Default)]
struct Shared {
    events: Vec<Event>,
    alive: usize,
    max_alive_at_spawn: usize,
}

/// Launcher that records the order of every call instead of spawning
/// processes. Background jobs never finish on their own unless
/// `finish_after_polls` is set; they finish when waited on.
#[derive(Clone, Default)]
pub struct RecordingLauncher {
    shared: Arc<Mutex<Shared>>,
    scripts: HashMap<JobKey, Script>,
    finish_after_polls: Option<usize>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, key: JobKey, script: Script) -> Self {
        self.scripts.insert(key, script);
        self
    }

    pub fn finish_after_polls(mut self, polls: usize) -> Self {
        self.finish_after_polls = Some(polls);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.shared.lock().expect("poisoned mutex").events.clone()
    }

    pub fn max_alive_at_spawn(&self) -> usize {
        self.shared.lock().expect("poisoned mutex").max_alive_at_spawn
    }

    fn summary_for(&self, key: &JobKey) -> Result<ExitSummary, LaunchError> {
        match self.scripts.get(key) {
            Some(Script::LaunchFails) => Err(LaunchError::Spawn {
                program: "python".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted failure"),
            }),
            Some(Script::WaitFails) => Err(LaunchError::Wait {
                pid: Some(4242),
                source: std::io::Error::new(std::io::ErrorKind::Interrupted, "scripted failure"),
            }),
            Some(Script::Exit(0)) | None => Ok(ExitSummary::success()),
            Some(Script::Exit(code)) => Ok(ExitSummary::failure(Some(*code))),
        }
    }
}

impl Launcher for RecordingLauncher {
    fn spawn_background(
        &self,
        invocation: &Invocation,
    ) -> Result<Box<dyn BackgroundJob>, LaunchError> {
        let key = key(invocation);
        let summary = self.summary_for(&key)?;

        let mut shared = self.shared.lock().expect("poisoned mutex");
        shared.events.push(Event::Spawned(key.clone()));
        shared.alive += 1;
        shared.max_alive_at_spawn = shared.max_alive_at_spawn.max(shared.alive);

        Ok(Box::new(FakeJob {
            key,
            summary,
            polls_left: self.finish_after_polls,
            done: false,
            shared: Arc::clone(&self.shared),
        }))
    }

    fn run_foreground(&self, invocation: &Invocation) -> Result<ExitSummary, LaunchError> {
        let key = key(invocation);
        let summary = self.summary_for(&key)?;

        let mut shared = self.shared.lock().expect("poisoned mutex");
        shared.events.push(Event::ForegroundStarted(key.clone()));
        shared.events.push(Event::ForegroundFinished(key));
        Ok(summary)
    }
}

struct FakeJob {
    key: JobKey,
    summary: ExitSummary,
    polls_left: Option<usize>,
    done: bool,
    shared: Arc<Mutex<Shared>>,
}

impl FakeJob {
    fn complete(&mut self) -> ExitSummary {
        if !self.done {
            self.done = true;
            let mut shared = self.shared.lock().expect("poisoned mutex");
            shared.alive -= 1;
            shared.events.push(Event::BackgroundFinished(self.key.clone()));
        }
        self.summary
    }
}

impl BackgroundJob for FakeJob {
    fn pid(&self) -> Option<u32> {
        Some(4242)
    }

    fn try_wait(&mut self) -> Result<Option<ExitSummary>, LaunchError> {
        match self.polls_left.as_mut() {
            Some(0) => Ok(Some(self.complete())),
            Some(left) => {
                *left -= 1;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn wait(&mut self) -> Result<ExitSummary, LaunchError> {
        Ok(self.complete())
    }
}
