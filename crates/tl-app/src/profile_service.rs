//! Profile listing, settings persistence and output loading.

use chrono::{DateTime, Local};
use std::path::PathBuf;
use tl_core::ProfileId;
use tl_profiles::{Profile, ProfileStore, SettingsDocument};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::query::OutputTable;

/// Summary of a profile for listing.
#[derive(Debug, Clone)]
pub struct ProfileSummary {
    pub id: ProfileId,
    pub simulated: bool,
    pub modified: Option<DateTime<Local>>,
    pub settings_path: PathBuf,
    pub output_path: PathBuf,
}

impl From<&Profile> for ProfileSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id,
            simulated: profile.is_simulated(),
            modified: profile.modified(),
            settings_path: profile.settings_path.clone(),
            output_path: profile.output_path.clone(),
        }
    }
}

/// All profiles, ascending by id.
pub fn list_profiles(store: &ProfileStore) -> AppResult<Vec<ProfileSummary>> {
    Ok(store
        .list_profiles()?
        .iter()
        .map(ProfileSummary::from)
        .collect())
}

pub fn create_profile(store: &ProfileStore, settings: &SettingsDocument) -> AppResult<Profile> {
    Ok(store.create_profile(settings)?)
}

pub fn load_settings(store: &ProfileStore, id: ProfileId) -> AppResult<SettingsDocument> {
    Ok(store.read_settings(id)?)
}

/// Validate editor text as a settings object and store it as a new profile.
pub fn save_settings_text(store: &ProfileStore, text: &str) -> AppResult<Profile> {
    let settings = SettingsDocument::from_json_str(text)
        .map_err(|e| AppError::InvalidInput(format!("settings are not valid: {}", e)))?;
    let profile = store.create_profile(&settings)?;
    info!(id = %profile.id, "saved edited settings as new profile");
    Ok(profile)
}

pub fn delete_profile(store: &ProfileStore, id: ProfileId) -> AppResult<()> {
    Ok(store.delete_profile(id)?)
}

pub fn read_output_table(store: &ProfileStore, id: ProfileId) -> AppResult<OutputTable> {
    Ok(OutputTable::from_rows(store.read_output(id)?))
}
