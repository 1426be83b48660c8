//! Profile directory storage.
//!
//! Layout under the root:
//!
//! ```text
//! profiles/
//!   profile_0/settings.json
//!   profile_0/output.csv     (present once a simulation has completed)
//!   profile_1/settings.json
//! ```

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tl_core::{OUTPUT_FILE, ProfileId, SETTINGS_FILE};
use tracing::{debug, info, warn};

use crate::settings::SettingsDocument;
use crate::{ProfileError, ProfileResult};

/// Upper bound on retries when another process claims the id we computed.
const MAX_CREATE_ATTEMPTS: usize = 16;

/// A numbered profile directory and the artifact paths inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: ProfileId,
    pub dir: PathBuf,
    pub settings_path: PathBuf,
    pub output_path: PathBuf,
}

impl Profile {
    fn at(root: &Path, id: ProfileId) -> Self {
        let dir = root.join(id.dir_name());
        Self {
            id,
            settings_path: dir.join(SETTINGS_FILE),
            output_path: dir.join(OUTPUT_FILE),
            dir,
        }
    }

    /// A profile with settings but no output has simply not been simulated yet.
    pub fn is_simulated(&self) -> bool {
        self.output_path.is_file()
    }

    /// Most recent modification of either artifact.
    pub fn modified(&self) -> Option<DateTime<Local>> {
        [&self.output_path, &self.settings_path]
            .into_iter()
            .filter_map(|p| fs::metadata(p).and_then(|m| m.modified()).ok())
            .max()
            .map(DateTime::<Local>::from)
    }
}

#[derive(Clone)]
pub struct ProfileStore {
    root: PathBuf,
    // Serializes id allocation between callers sharing this store.
    alloc_lock: Arc<Mutex<()>>,
}

impl ProfileStore {
    /// Open a store rooted at `root`. The directory is created lazily on the
    /// first `create_profile`; a missing root simply lists as empty.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            alloc_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All profiles under the root, ascending by id.
    pub fn list_profiles(&self) -> ProfileResult<Vec<Profile>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ProfileError::io(&self.root, e)),
        };

        let mut profiles = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ProfileError::io(&self.root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                warn!(path = %path.display(), "skipping non UTF-8 directory name");
                continue;
            };
            match ProfileId::from_dir_name(name) {
                Ok(id) => profiles.push(Profile::at(&self.root, id)),
                Err(_) => warn!(dir = name, "skipping directory that is not a profile"),
            }
        }

        profiles.sort_by_key(|p| p.id);
        debug!(root = %self.root.display(), count = profiles.len(), "listed profiles");
        Ok(profiles)
    }

    /// One past the largest id on disk, or 0 for an empty root.
    ///
    /// Recomputed from the directory listing on every call.
    pub fn next_id(&self) -> ProfileResult<ProfileId> {
        match self.list_profiles()?.last() {
            None => Ok(ProfileId::FIRST),
            Some(last) => last.id.next().ok_or_else(|| ProfileError::IdsExhausted {
                root: self.root.clone(),
            }),
        }
    }

    pub fn get(&self, id: ProfileId) -> ProfileResult<Profile> {
        let profile = Profile::at(&self.root, id);
        if profile.dir.is_dir() {
            Ok(profile)
        } else {
            Err(ProfileError::NotFound { id })
        }
    }

    /// Allocate the next id, create its directory and write `settings.json`.
    ///
    /// On any write failure the partially created directory is removed and
    /// the profile does not exist.
    pub fn create_profile(&self, settings: &SettingsDocument) -> ProfileResult<Profile> {
        let _guard = self
            .alloc_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        fs::create_dir_all(&self.root).map_err(|e| ProfileError::io(&self.root, e))?;

        let profile = self.claim_directory()?;
        populate_or_remove(&profile, |p| write_settings(&p.settings_path, settings))?;

        info!(id = %profile.id, dir = %profile.dir.display(), keys = settings.len(), "created profile");
        Ok(profile)
    }

    fn claim_directory(&self) -> ProfileResult<Profile> {
        let mut last_err = None;
        for _ in 0..MAX_CREATE_ATTEMPTS {
            let profile = Profile::at(&self.root, self.next_id()?);
            match fs::create_dir(&profile.dir) {
                Ok(()) => return Ok(profile),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    warn!(dir = %profile.dir.display(), "profile directory claimed concurrently, retrying");
                    last_err = Some(ProfileError::io(&profile.dir, e));
                }
                Err(e) => return Err(ProfileError::io(&profile.dir, e)),
            }
        }
        Err(last_err.unwrap_or_else(|| ProfileError::IdsExhausted {
            root: self.root.clone(),
        }))
    }

    /// Remove the whole profile directory tree.
    pub fn delete_profile(&self, id: ProfileId) -> ProfileResult<()> {
        let profile = self.get(id)?;
        fs::remove_dir_all(&profile.dir).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProfileError::NotFound { id },
            _ => ProfileError::io(&profile.dir, e),
        })?;
        info!(id = %id, "deleted profile");
        Ok(())
    }

    pub fn read_settings(&self, id: ProfileId) -> ProfileResult<SettingsDocument> {
        let profile = self.get(id)?;
        let content = fs::read_to_string(&profile.settings_path)
            .map_err(|e| ProfileError::io(&profile.settings_path, e))?;
        SettingsDocument::from_json_str(&content).map_err(|e| ProfileError::MalformedSettings {
            path: profile.settings_path.clone(),
            message: e.to_string(),
        })
    }

    /// Raw rows of `output.csv`: the header row followed by data rows.
    ///
    /// An empty file yields no rows. Rows with differing field counts are
    /// reported as malformed.
    pub fn read_output(&self, id: ProfileId) -> ProfileResult<Vec<Vec<String>>> {
        let profile = self.get(id)?;
        if !profile.output_path.is_file() {
            return Err(ProfileError::NotFound { id });
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(false)
            .from_path(&profile.output_path)
            .map_err(|e| csv_error(&profile.output_path, e))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| csv_error(&profile.output_path, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        debug!(id = %id, rows = rows.len(), "read output table");
        Ok(rows)
    }
}

/// Run `write` against a freshly claimed directory, removing the directory
/// if it fails.
fn populate_or_remove(
    profile: &Profile,
    write: impl FnOnce(&Profile) -> ProfileResult<()>,
) -> ProfileResult<()> {
    let result = write(profile);
    if result.is_err() {
        if let Err(cleanup) = fs::remove_dir_all(&profile.dir) {
            warn!(dir = %profile.dir.display(), error = %cleanup, "failed to remove partial profile");
        }
    }
    result
}

fn write_settings(path: &Path, settings: &SettingsDocument) -> ProfileResult<()> {
    let json = serde_json::to_string_pretty(&settings.to_json())
        .map_err(|e| ProfileError::InvalidSettings(e.to_string()))?;
    fs::write(path, json).map_err(|e| ProfileError::io(path, e))
}

fn csv_error(path: &Path, err: csv::Error) -> ProfileError {
    if err.is_io_error() {
        match err.into_kind() {
            csv::ErrorKind::Io(source) => ProfileError::io(path, source),
            other => ProfileError::MalformedOutput {
                path: path.to_path_buf(),
                message: format!("{:?}", other),
            },
        }
    } else {
        ProfileError::MalformedOutput {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_paths_follow_layout() {
        let profile = Profile::at(Path::new("profiles"), ProfileId::new(4));
        assert_eq!(profile.dir, Path::new("profiles/profile_4"));
        assert_eq!(
            profile.settings_path,
            Path::new("profiles/profile_4/settings.json")
        );
        assert_eq!(profile.output_path, Path::new("profiles/profile_4/output.csv"));
    }

    #[test]
    fn profile_serializes_with_plain_id() {
        let profile = Profile::at(Path::new("profiles"), ProfileId::new(4));
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["id"], serde_json::json!(4));
        assert!(value["settings_path"].as_str().unwrap().ends_with("settings.json"));
    }

    #[test]
    fn failed_write_removes_claimed_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(tmp.path());
        let profile = store.claim_directory().unwrap();
        assert!(profile.dir.is_dir());

        let err = populate_or_remove(&profile, |p| {
            fs::write(&p.settings_path, "{\"maxan").unwrap();
            Err(ProfileError::io(
                &p.settings_path,
                std::io::Error::new(ErrorKind::Other, "disk full"),
            ))
        })
        .unwrap_err();

        assert!(matches!(err, ProfileError::Io { .. }));
        assert!(!profile.dir.exists());
        assert!(store.list_profiles().unwrap().is_empty());
        assert_eq!(store.next_id().unwrap(), ProfileId::FIRST);
    }

    #[test]
    fn successful_write_keeps_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(tmp.path());
        let profile = store.claim_directory().unwrap();

        populate_or_remove(&profile, |p| {
            write_settings(&p.settings_path, &SettingsDocument::new())
        })
        .unwrap();
        assert!(profile.settings_path.is_file());
    }

    #[test]
    fn missing_root_lists_empty_and_starts_at_zero() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(tmp.path().join("does-not-exist"));
        assert!(store.list_profiles().unwrap().is_empty());
        assert_eq!(store.next_id().unwrap(), ProfileId::FIRST);
    }

    #[test]
    fn plain_files_are_not_profiles() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("profile_9"), "not a dir").unwrap();
        let store = ProfileStore::new(tmp.path());
        assert!(store.list_profiles().unwrap().is_empty());
    }
}
