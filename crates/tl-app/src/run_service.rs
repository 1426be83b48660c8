//! Simulation launching for profiles.

use std::path::Path;
use std::sync::Arc;
use tl_core::ProfileId;
use tl_profiles::{Profile, ProfileStore, SettingsDocument};
use tl_runner::{SimulationRun, SimulationRunner};
use tracing::info;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Wake-up hook invoked from the worker thread whenever a run event is queued.
pub type Notify = Arc<dyn Fn() + Send + Sync>;

/// A freshly created profile and the runner simulating it.
pub struct GenerateHandle {
    pub profile: Profile,
    pub runner: SimulationRunner,
}

/// Start the configured executable against an existing profile.
///
/// The child receives absolute settings/output paths so its working
/// directory does not matter.
pub fn start_simulation(
    config: &AppConfig,
    profile: &Profile,
    notify: Option<Notify>,
) -> AppResult<SimulationRunner> {
    let settings_path = absolute(&profile.settings_path)?;
    let output_path = absolute(&profile.output_path)?;

    let mut runner = SimulationRunner::new();
    if let Some(notify) = notify {
        runner = runner.with_notifier(move || notify());
    }

    let run = SimulationRun::new(config.command(), settings_path, output_path).for_profile(profile.id);
    runner.start_run(run)?;
    Ok(runner)
}

/// Persist `settings` as a new profile and start simulating it.
///
/// If the executable cannot be launched the profile stays on disk as
/// "not yet simulated" and the launch error is returned.
pub fn generate(
    config: &AppConfig,
    store: &ProfileStore,
    settings: &SettingsDocument,
    notify: Option<Notify>,
) -> AppResult<GenerateHandle> {
    let profile = store.create_profile(settings)?;
    info!(id = %profile.id, "generating profile output");
    let runner = start_simulation(config, &profile, notify)?;
    Ok(GenerateHandle { profile, runner })
}

/// Re-run the simulation for an existing profile, overwriting its output.
pub fn rerun(
    config: &AppConfig,
    store: &ProfileStore,
    id: ProfileId,
    notify: Option<Notify>,
) -> AppResult<GenerateHandle> {
    let profile = store.get(id)?;
    if !profile.settings_path.is_file() {
        return Err(AppError::InvalidInput(format!(
            "profile {} has no settings.json",
            id
        )));
    }
    let runner = start_simulation(config, &profile, notify)?;
    Ok(GenerateHandle { profile, runner })
}

fn absolute(path: &Path) -> AppResult<std::path::PathBuf> {
    std::path::absolute(path).map_err(|e| AppError::Io(format!("{}: {}", path.display(), e)))
}
