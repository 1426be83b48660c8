use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// How to invoke the simulation executable.
///
/// The child is always called as `program [leading_args..] settings output`.
/// Leading arguments let an interpreter front the real simulation, e.g.
/// `python sim.py`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationCommand {
    pub program: PathBuf,
    pub leading_args: Vec<OsString>,
}

impl SimulationCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Process builder with stdout and stderr captured and stdin closed.
    ///
    /// On unix the child leads its own process group so cancelling can take
    /// down any helpers it forks.
    pub(crate) fn build(&self, settings_path: &Path, output_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .arg(settings_path)
            .arg(output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        cmd
    }
}
