//! Shared application service layer for Trajectory Lab.
//!
//! This crate provides a unified interface for both CLI and GUI frontends,
//! centralizing configuration, the settings form catalog, profile management,
//! simulation launching, and output-table queries.

pub mod catalog;
pub mod config;
pub mod error;
pub mod profile_service;
pub mod query;
pub mod run_service;

// Re-export key types for convenience
pub use catalog::{CATALOG, SettingCategory, SettingField, find_field, resolve_key, setting_key};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use profile_service::{
    ProfileSummary, create_profile, delete_profile, list_profiles, load_settings,
    read_output_table, save_settings_text,
};
pub use query::{ColumnSummary, OutputTable};
pub use run_service::{GenerateHandle, Notify, generate, rerun, start_simulation};

pub use tl_core::ProfileId;
pub use tl_profiles::{Profile, ProfileStore, SetOutcome, SettingsDocument};
pub use tl_runner::{RunEvent, RunOutcome, RunStatus, SimulationRunner};
