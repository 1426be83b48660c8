//! tl-runner: launches the external simulation executable and streams its
//! progress back to the caller.
//!
//! A [`SimulationRunner`] drives exactly one run. The child process is
//! spawned on the calling thread (so launch failures surface immediately),
//! then a worker thread owns its output pipes and forwards [`RunEvent`]s over
//! a channel that the caller drains with [`SimulationRunner::poll_events`] or
//! [`SimulationRunner::wait`].

pub mod command;
pub mod progress;
pub mod run;
pub mod runner;

pub use command::SimulationCommand;
pub use progress::parse_progress_line;
pub use run::{RunEvent, RunOutcome, RunStatus, SimulationRun};
pub use runner::SimulationRunner;

use std::path::PathBuf;

pub type RunnerResult<T> = Result<T, RunnerError>;

#[derive(thiserror::Error, Debug)]
pub enum RunnerError {
    #[error("Failed to launch simulation executable {program}: {source}")]
    Launch {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Runner already started; reset it before starting another run")]
    AlreadyStarted,

    #[error("Runner has not been started")]
    NotStarted,

    #[error("Simulation worker error: {0}")]
    Worker(String),
}
