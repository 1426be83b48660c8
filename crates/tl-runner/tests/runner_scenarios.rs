//! End-to-end runner behavior against shell-script stand-ins for the simulation.
#![cfg(unix)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tl_core::ProfileId;
use tl_runner::{
    RunEvent, RunOutcome, RunStatus, RunnerError, SimulationCommand, SimulationRun,
    SimulationRunner,
};

/// `sh -c <script> stub-sim settings output` so `$1`/`$2` are the two paths.
fn stub(script: &str) -> SimulationCommand {
    SimulationCommand::new("/bin/sh").with_args(["-c", script, "stub-sim"])
}

fn start_stub(script: &str) -> SimulationRunner {
    let mut runner = SimulationRunner::new();
    runner
        .start_run(SimulationRun::new(stub(script), "settings.json", "output.csv"))
        .expect("stub should launch");
    runner
}

fn progress_of(events: &[RunEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|e| match e {
            RunEvent::Progress { percent } => Some(*percent),
            _ => None,
        })
        .collect()
}

#[test]
fn progress_lines_are_reported_and_run_succeeds() {
    let mut runner = start_stub("echo 10; echo '55.5 %'; echo bad; echo 100; exit 0");
    assert_eq!(runner.status(), RunStatus::Running);

    let mut events = Vec::new();
    let outcome = runner.wait(|e| events.push(e.clone())).unwrap();

    assert_eq!(progress_of(&events), vec![10.0, 55.5, 100.0]);
    assert_eq!(
        outcome,
        RunOutcome::Succeeded {
            output_path: PathBuf::from("output.csv")
        }
    );
    assert_eq!(events.last(), Some(&RunEvent::Succeeded {
        output_path: PathBuf::from("output.csv")
    }));
    assert_eq!(runner.status(), RunStatus::Succeeded);
    assert_eq!(runner.last_progress(), Some(100.0));
    assert_eq!(runner.run().map(|r| r.status), Some(RunStatus::Succeeded));
}

#[test]
fn non_zero_exit_reports_stderr() {
    let mut runner = start_stub("echo 'disk full' >&2; exit 1");

    let outcome = runner.wait(|_| {}).unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Failed {
            reason: "disk full".to_string()
        }
    );
    assert_eq!(runner.status(), RunStatus::Failed);
}

#[test]
fn silent_failure_reports_exit_code() {
    let mut runner = start_stub("exit 4");
    match runner.wait(|_| {}).unwrap() {
        RunOutcome::Failed { reason } => assert!(reason.contains("code 4"), "{reason}"),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn settings_and_output_paths_are_passed_in_order() {
    let mut runner = start_stub("printf '%s\\n%s' \"$1\" \"$2\" >&2; exit 2");
    let outcome = runner.wait(|_| {}).unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Failed {
            reason: "settings.json\noutput.csv".to_string()
        }
    );
}

#[test]
fn progress_is_not_forced_monotonic() {
    let mut runner = start_stub("echo 50; echo 20 %; echo 150");
    let mut events = Vec::new();
    runner.wait(|e| events.push(e.clone())).unwrap();
    assert_eq!(progress_of(&events), vec![50.0, 20.0, 100.0]);
}

#[test]
fn missing_executable_is_a_launch_error() {
    let mut runner = SimulationRunner::new();
    let err = runner
        .start("/nonexistent/trajlab/shootingsim", "settings.json", "output.csv")
        .unwrap_err();

    assert!(matches!(err, RunnerError::Launch { .. }), "{err}");
    assert_eq!(runner.status(), RunStatus::Failed);
    assert!(matches!(runner.outcome(), Some(RunOutcome::Failed { .. })));
}

#[test]
fn runner_handles_one_run_until_reset() {
    let mut runner = start_stub("exit 0");
    runner.wait(|_| {}).unwrap();

    let err = runner
        .start_run(SimulationRun::new(stub("exit 0"), "s.json", "o.csv"))
        .unwrap_err();
    assert!(matches!(err, RunnerError::AlreadyStarted));

    runner.reset();
    assert_eq!(runner.status(), RunStatus::Idle);
    assert!(runner.outcome().is_none());
    runner
        .start_run(SimulationRun::new(stub("exit 0"), "s.json", "o.csv"))
        .unwrap();
    assert!(runner.wait(|_| {}).unwrap().is_success());
}

#[test]
fn wait_before_start_is_an_error() {
    let mut runner = SimulationRunner::new();
    assert!(matches!(runner.wait(|_| {}), Err(RunnerError::NotStarted)));
}

fn wait_for_first_progress(runner: &mut SimulationRunner) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while runner.last_progress().is_none() {
        assert!(Instant::now() < deadline, "no progress before deadline");
        runner.poll_events();
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn cancel_kills_the_child() {
    let mut runner = start_stub("echo 5; exec sleep 30");
    wait_for_first_progress(&mut runner);

    let started = Instant::now();
    assert!(runner.cancel());
    let outcome = runner.wait(|_| {}).unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Failed {
            reason: "cancelled".to_string()
        }
    );
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!runner.cancel(), "cancel after completion is a no-op");
}

#[test]
fn cancel_takes_down_forked_helpers() {
    // The shell stays alive as parent of `sleep`, which shares its stdout.
    let mut runner = start_stub("echo 5; sleep 8; echo done");
    wait_for_first_progress(&mut runner);

    let started = Instant::now();
    assert!(runner.cancel());
    let outcome = runner.wait(|_| {}).unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Failed {
            reason: "cancelled".to_string()
        }
    );
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "cancel took {:?}",
        started.elapsed()
    );
}

#[test]
fn exit_is_reported_while_a_helper_holds_stdout() {
    let started = Instant::now();
    let mut runner = start_stub("echo 40; sleep 8 & echo 100; exit 0");

    let mut events = Vec::new();
    let outcome = runner.wait(|e| events.push(e.clone())).unwrap();

    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(progress_of(&events), vec![40.0, 100.0]);
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "terminal event took {:?}",
        started.elapsed()
    );
}

#[test]
fn poll_events_eventually_reaches_terminal_state() {
    let mut runner = start_stub("echo 1; echo 2");
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut events = Vec::new();
    while runner.status().is_active() {
        assert!(Instant::now() < deadline, "run did not finish");
        events.extend(runner.poll_events());
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(progress_of(&events), vec![1.0, 2.0]);
    assert!(events.last().is_some_and(RunEvent::is_terminal));
}

#[test]
fn notifier_fires_for_queued_events() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut runner = SimulationRunner::new().with_notifier(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    runner
        .start_run(SimulationRun::new(stub("echo 42"), "s.json", "o.csv"))
        .unwrap();
    runner.wait(|_| {}).unwrap();

    assert!(calls.load(Ordering::SeqCst) >= 1);
}

#[test]
fn run_records_profile_and_executable() {
    let run = SimulationRun::new(stub("exit 0"), "s.json", "o.csv").for_profile(ProfileId::new(3));
    let mut runner = SimulationRunner::new();
    runner.start_run(run).unwrap();
    runner.wait(|_| {}).unwrap();

    let run = runner.run().unwrap();
    assert_eq!(run.profile_id, Some(ProfileId::new(3)));
    assert_eq!(run.executable_path(), std::path::Path::new("/bin/sh"));
}
