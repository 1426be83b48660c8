use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::PathBuf;
use std::process::{Child, ChildStderr, ChildStdout, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::command::SimulationCommand;
use crate::progress::parse_progress_line;
use crate::run::{RunEvent, RunOutcome, RunStatus, SimulationRun};
use crate::{RunnerError, RunnerResult};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);
const PIPE_DRAIN_GRACE: Duration = Duration::from_millis(250);
const CANCELLED_REASON: &str = "cancelled";

type Notifier = Arc<dyn Fn() + Send + Sync>;

/// Drives a single simulation run. Reset it (or drop it) before the next one.
pub struct SimulationRunner {
    run: Option<SimulationRun>,
    status: RunStatus,
    outcome: Option<RunOutcome>,
    events_rx: Option<Receiver<RunEvent>>,
    handle: Option<JoinHandle<()>>,
    child: Option<Arc<Mutex<Child>>>,
    cancelled: Arc<AtomicBool>,
    notifier: Option<Notifier>,
}

impl Default for SimulationRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationRunner {
    pub fn new() -> Self {
        Self {
            run: None,
            status: RunStatus::Idle,
            outcome: None,
            events_rx: None,
            handle: None,
            child: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            notifier: None,
        }
    }

    /// Called from the worker thread after every event is queued, so an
    /// event loop can wake up and drain the channel (e.g. request a repaint).
    pub fn with_notifier(mut self, notify: impl Fn() + Send + Sync + 'static) -> Self {
        self.notifier = Some(Arc::new(notify));
        self
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn run(&self) -> Option<&SimulationRun> {
        self.run.as_ref()
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    pub fn last_progress(&self) -> Option<f64> {
        self.run.as_ref().and_then(|r| r.last_progress_percent)
    }

    /// Run `executable settings output`.
    pub fn start(
        &mut self,
        executable_path: impl Into<PathBuf>,
        settings_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> RunnerResult<()> {
        self.start_run(SimulationRun::new(
            SimulationCommand::new(executable_path),
            settings_path,
            output_path,
        ))
    }

    /// Launch a described run. Fails with [`RunnerError::Launch`] (and the
    /// runner moves to `Failed`) if the executable cannot be spawned.
    pub fn start_run(&mut self, mut run: SimulationRun) -> RunnerResult<()> {
        if self.status != RunStatus::Idle {
            return Err(RunnerError::AlreadyStarted);
        }

        self.set_status(RunStatus::Starting);
        info!(
            program = %run.command.program.display(),
            settings = %run.settings_path.display(),
            output = %run.output_path.display(),
            profile = ?run.profile_id,
            "starting simulation"
        );

        let mut child = match run
            .command
            .build(&run.settings_path, &run.output_path)
            .spawn()
        {
            Ok(child) => child,
            Err(source) => {
                warn!(program = %run.command.program.display(), error = %source, "simulation launch failed");
                let program = run.command.program.clone();
                self.run = Some(run);
                self.finish(RunOutcome::Failed {
                    reason: format!("failed to launch {}: {}", program.display(), source),
                });
                return Err(RunnerError::Launch { program, source });
            }
        };

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            self.run = Some(run);
            self.finish(RunOutcome::Failed {
                reason: "child process pipes unavailable".to_string(),
            });
            return Err(RunnerError::Worker(
                "child process pipes unavailable".to_string(),
            ));
        };

        let child = Arc::new(Mutex::new(child));
        let (tx, rx) = channel();
        let worker = Worker {
            child: Arc::clone(&child),
            cancelled: Arc::clone(&self.cancelled),
            output_path: run.output_path.clone(),
            events: EventSink::new(tx, self.notifier.clone()),
        };

        let spawned = thread::Builder::new()
            .name("simulation-worker".to_string())
            .spawn(move || worker.run(stdout, stderr));

        match spawned {
            Ok(handle) => {
                run.status = RunStatus::Running;
                self.run = Some(run);
                self.status = RunStatus::Running;
                self.events_rx = Some(rx);
                self.handle = Some(handle);
                self.child = Some(child);
                Ok(())
            }
            Err(e) => {
                kill_child(&child);
                self.run = Some(run);
                self.finish(RunOutcome::Failed {
                    reason: format!("failed to start worker thread: {}", e),
                });
                Err(RunnerError::Worker(e.to_string()))
            }
        }
    }

    /// Drain queued events without blocking, updating the runner state.
    pub fn poll_events(&mut self) -> Vec<RunEvent> {
        let mut events = Vec::new();
        let Some(rx) = self.events_rx.as_ref() else {
            return events;
        };

        let mut disconnected = false;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    let terminal = event.is_terminal();
                    events.push(event);
                    if terminal {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        for event in &events {
            self.apply(event);
        }
        if disconnected && self.status.is_active() {
            let event = worker_vanished();
            self.apply(&event);
            events.push(event);
        }
        events
    }

    /// Block until the run finishes, reporting each event to `on_event`.
    pub fn wait(&mut self, mut on_event: impl FnMut(&RunEvent)) -> RunnerResult<RunOutcome> {
        if self.status == RunStatus::Idle {
            return Err(RunnerError::NotStarted);
        }

        while self.status.is_active() {
            let received = match self.events_rx.as_ref() {
                Some(rx) => rx.recv().ok(),
                None => None,
            };
            let event = received.unwrap_or_else(worker_vanished);
            self.apply(&event);
            on_event(&event);
        }

        self.outcome
            .clone()
            .ok_or_else(|| RunnerError::Worker("run finished without an outcome".to_string()))
    }

    /// Kill the child process. The run ends `Failed` with reason `cancelled`
    /// and any output still buffered is discarded. Returns false when no run
    /// is active.
    pub fn cancel(&self) -> bool {
        if !self.status.is_active() {
            return false;
        }
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(child) = &self.child {
            kill_child(child);
        }
        info!("simulation cancelled");
        true
    }

    /// Return to `Idle`, cancelling and waiting out an active run first.
    pub fn reset(&mut self) {
        if self.status.is_active() {
            self.cancel();
            let _ = self.wait(|_| {});
        }
        self.release();
        self.run = None;
        self.outcome = None;
        self.status = RunStatus::Idle;
        self.cancelled = Arc::new(AtomicBool::new(false));
    }

    fn apply(&mut self, event: &RunEvent) {
        match event {
            RunEvent::Progress { percent } => {
                if let Some(run) = self.run.as_mut() {
                    run.last_progress_percent = Some(*percent);
                }
            }
            RunEvent::Succeeded { output_path } => self.finish(RunOutcome::Succeeded {
                output_path: output_path.clone(),
            }),
            RunEvent::Failed { reason } => self.finish(RunOutcome::Failed {
                reason: reason.clone(),
            }),
        }
    }

    fn finish(&mut self, outcome: RunOutcome) {
        let status = if outcome.is_success() {
            RunStatus::Succeeded
        } else {
            RunStatus::Failed
        };
        self.set_status(status);
        self.outcome = Some(outcome);
        self.release();
    }

    fn set_status(&mut self, status: RunStatus) {
        self.status = status;
        if let Some(run) = self.run.as_mut() {
            run.status = status;
        }
    }

    fn release(&mut self) {
        self.events_rx = None;
        self.child = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("simulation worker panicked");
            }
        }
    }
}

impl Drop for SimulationRunner {
    fn drop(&mut self) {
        // Abandoning a runner mid-run must not leave the child behind.
        if self.status.is_active() {
            self.cancel();
        }
    }
}

fn worker_vanished() -> RunEvent {
    RunEvent::Failed {
        reason: "simulation worker exited unexpectedly".to_string(),
    }
}

/// Kill the child and, on unix, every process in its group so helpers it
/// forked cannot keep the output pipes open.
fn kill_child(child: &Mutex<Child>) {
    let mut guard = child.lock().unwrap_or_else(|p| p.into_inner());
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;
        if let Ok(pgid) = i32::try_from(guard.id()) {
            match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
                Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
                Err(e) => warn!(error = %e, "failed to kill simulation process group"),
            }
        }
    }
    match guard.kill() {
        Ok(()) => {}
        // Already exited and reaped.
        Err(e) if e.kind() == ErrorKind::InvalidInput => {}
        Err(e) => warn!(error = %e, "failed to kill simulation process"),
    }
}

/// Sending half shared by the worker and its stdout reader. Once the
/// terminal event is sent the sender is dropped, so a reader still blocked on
/// a pipe held open by a leftover helper can never emit after it.
#[derive(Clone)]
struct EventSink {
    tx: Arc<Mutex<Option<Sender<RunEvent>>>>,
    notifier: Option<Notifier>,
}

impl EventSink {
    fn new(tx: Sender<RunEvent>, notifier: Option<Notifier>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
            notifier,
        }
    }

    fn emit(&self, event: RunEvent) -> bool {
        let sent = {
            let guard = self.tx.lock().unwrap_or_else(|p| p.into_inner());
            guard.as_ref().is_some_and(|tx| tx.send(event).is_ok())
        };
        self.notify(sent);
        sent
    }

    fn finish(&self, event: RunEvent) {
        let sent = {
            let mut guard = self.tx.lock().unwrap_or_else(|p| p.into_inner());
            guard.take().is_some_and(|tx| tx.send(event).is_ok())
        };
        self.notify(sent);
    }

    fn notify(&self, sent: bool) {
        if sent {
            if let Some(notify) = &self.notifier {
                notify();
            }
        }
    }
}

struct Worker {
    child: Arc<Mutex<Child>>,
    cancelled: Arc<AtomicBool>,
    output_path: PathBuf,
    events: EventSink,
}

impl Worker {
    fn run(self, stdout: ChildStdout, stderr: ChildStderr) {
        // stderr is drained concurrently so a chatty child never blocks on a full pipe.
        let (stderr_tx, stderr_rx) = channel();
        thread::spawn(move || {
            let mut bytes = Vec::new();
            let text = match BufReader::new(stderr).read_to_end(&mut bytes) {
                Ok(_) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(_) => String::new(),
            };
            let _ = stderr_tx.send(text);
        });

        let (stdout_done_tx, stdout_done_rx) = channel::<()>();
        let cancelled = Arc::clone(&self.cancelled);
        let events = self.events.clone();
        thread::spawn(move || {
            consume_stdout(stdout, &cancelled, &events);
            let _ = stdout_done_tx.send(());
        });

        let status = wait_for_exit(&self.child);

        // Lines written before exit are still in the pipe; give the readers a
        // bounded window since a leftover helper may hold the pipes open.
        let stderr_text = if self.cancelled.load(Ordering::SeqCst) {
            String::new()
        } else {
            let _ = stdout_done_rx.recv_timeout(PIPE_DRAIN_GRACE);
            stderr_rx.recv_timeout(PIPE_DRAIN_GRACE).unwrap_or_default()
        };

        let event = self.terminal_event(status, &stderr_text);
        match &event {
            RunEvent::Succeeded { .. } => info!("simulation succeeded"),
            RunEvent::Failed { reason } => warn!(reason = %reason, "simulation failed"),
            RunEvent::Progress { .. } => {}
        }
        self.events.finish(event);
    }

    fn terminal_event(&self, status: std::io::Result<ExitStatus>, stderr_text: &str) -> RunEvent {
        if self.cancelled.load(Ordering::SeqCst) {
            return RunEvent::Failed {
                reason: CANCELLED_REASON.to_string(),
            };
        }
        match status {
            Ok(status) if status.success() => RunEvent::Succeeded {
                output_path: self.output_path.clone(),
            },
            Ok(status) => {
                let stderr_text = stderr_text.trim();
                let reason = if !stderr_text.is_empty() {
                    stderr_text.to_string()
                } else {
                    match status.code() {
                        Some(code) => format!("simulation exited with code {}", code),
                        None => "simulation terminated by signal".to_string(),
                    }
                };
                RunEvent::Failed { reason }
            }
            Err(e) => RunEvent::Failed {
                reason: format!("failed to wait for simulation: {}", e),
            },
        }
    }
}

fn consume_stdout(stdout: ChildStdout, cancelled: &AtomicBool, events: &EventSink) {
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if cancelled.load(Ordering::SeqCst) {
                    continue;
                }
                let line = String::from_utf8_lossy(&buf);
                match parse_progress_line(&line) {
                    Some(percent) => {
                        debug!(percent, "simulation progress");
                        // A closed sink is fine: keep draining so the child can exit.
                        events.emit(RunEvent::Progress { percent });
                    }
                    None => debug!(line = %line.trim_end(), "simulation output"),
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "failed reading simulation output");
                break;
            }
        }
    }
}

/// Poll for exit without holding the lock, so `cancel` can always reach the child.
fn wait_for_exit(child: &Mutex<Child>) -> std::io::Result<ExitStatus> {
    loop {
        {
            let mut guard = child.lock().unwrap_or_else(|p| p.into_inner());
            if let Some(status) = guard.try_wait()? {
                return Ok(status);
            }
        }
        thread::sleep(EXIT_POLL_INTERVAL);
    }
}
