//! Application configuration.
//!
//! Resolution order, later wins:
//! 1. built-in defaults
//! 2. `trajlab.yaml` (explicit path, or discovered in the working directory)
//! 3. `TRAJLAB_PROFILES_ROOT` / `TRAJLAB_EXECUTABLE` environment variables
//! 4. frontend flags (applied by the caller on the returned struct)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tl_core::DEFAULT_PROFILES_DIR;
use tl_profiles::ProfileStore;
use tl_runner::SimulationCommand;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

pub const CONFIG_FILE: &str = "trajlab.yaml";
pub const ENV_PROFILES_ROOT: &str = "TRAJLAB_PROFILES_ROOT";
pub const ENV_EXECUTABLE: &str = "TRAJLAB_EXECUTABLE";

const DEFAULT_EXECUTABLE_STEM: &str = "shootingsim";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding `profile_<id>` directories.
    pub profiles_root: PathBuf,
    /// Simulation executable.
    pub executable: PathBuf,
    /// Arguments placed before the settings and output paths.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub executable_args: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profiles_root: PathBuf::from(DEFAULT_PROFILES_DIR),
            executable: default_executable(),
            executable_args: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Read a YAML config file. Relative paths inside it are taken relative
    /// to the file's directory, except a bare executable name, which is left
    /// for `PATH` lookup.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config = Self::from_yaml(&content)?;
        if let Some(base) = path.parent() {
            config.profiles_root = rebase(base, &config.profiles_root);
            if names_a_path(&config.executable) {
                config.executable = rebase(base, &config.executable);
            }
        }
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        // An empty file is a valid "all defaults" config.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config YAML: {}", e)))
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| AppError::Io(format!("{}: {}", path.display(), e)))
    }

    /// Load `explicit` if given (it must exist), else `trajlab.yaml` in the
    /// working directory if present, else defaults; then apply environment
    /// overrides.
    pub fn resolve(explicit: Option<&Path>) -> AppResult<Self> {
        let config = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let discovered = Path::new(CONFIG_FILE);
                if discovered.is_file() {
                    Self::load(discovered)?
                } else {
                    debug!("no config file found, using defaults");
                    Self::default()
                }
            }
        };
        Ok(config.with_env_overrides(|name| std::env::var(name).ok()))
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production). Empty values are ignored.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(root) = lookup(ENV_PROFILES_ROOT).filter(|v| !v.is_empty()) {
            self.profiles_root = PathBuf::from(root);
        }
        if let Some(exe) = lookup(ENV_EXECUTABLE).filter(|v| !v.is_empty()) {
            self.executable = PathBuf::from(exe);
        }
        self
    }

    pub fn store(&self) -> ProfileStore {
        ProfileStore::new(self.profiles_root.clone())
    }

    pub fn command(&self) -> SimulationCommand {
        SimulationCommand::new(self.executable.clone()).with_args(self.executable_args.iter())
    }
}

/// The simulator shipped beside the running binary if there is one, else the
/// bare name.
fn default_executable() -> PathBuf {
    let install_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    executable_beside(install_dir.as_deref())
}

fn executable_beside(dir: Option<&Path>) -> PathBuf {
    let name = format!("{}{}", DEFAULT_EXECUTABLE_STEM, std::env::consts::EXE_SUFFIX);
    match dir.map(|d| d.join(&name)) {
        Some(candidate) if candidate.is_file() => candidate,
        _ => PathBuf::from(name),
    }
}

/// `sh` or `python3` is a program name; `bin/sim` and `./sim` are paths.
fn names_a_path(program: &Path) -> bool {
    program.components().count() > 1 || program.starts_with(".")
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() && !base.as_os_str().is_empty() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}
