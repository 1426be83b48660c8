use std::path::PathBuf;
use tl_core::ProfileId;

use crate::command::SimulationCommand;

/// Lifecycle of a runner: `Idle → Starting → Running → {Succeeded, Failed}`.
///
/// A run that has been described but not launched is `Idle` (pending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Idle,
    Starting,
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }

    pub fn is_active(self) -> bool {
        matches!(self, RunStatus::Starting | RunStatus::Running)
    }
}

/// Events delivered from the worker thread, in the order the child produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Progress { percent: f64 },
    Succeeded { output_path: PathBuf },
    Failed { reason: String },
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunEvent::Progress { .. })
    }
}

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded { output_path: PathBuf },
    Failed { reason: String },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded { .. })
    }
}

/// Everything known about one invocation of the simulation.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub profile_id: Option<ProfileId>,
    pub command: SimulationCommand,
    pub settings_path: PathBuf,
    pub output_path: PathBuf,
    pub status: RunStatus,
    pub last_progress_percent: Option<f64>,
}

impl SimulationRun {
    pub fn new(
        command: SimulationCommand,
        settings_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            profile_id: None,
            command,
            settings_path: settings_path.into(),
            output_path: output_path.into(),
            status: RunStatus::Idle,
            last_progress_percent: None,
        }
    }

    pub fn for_profile(mut self, id: ProfileId) -> Self {
        self.profile_id = Some(id);
        self
    }

    pub fn executable_path(&self) -> &std::path::Path {
        &self.command.program
    }
}
