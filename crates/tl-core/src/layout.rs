//! File and directory names shared by every component that touches a profile root.

/// Default directory (relative to the working directory) holding all profiles.
pub const DEFAULT_PROFILES_DIR: &str = "profiles";

/// Prefix of every profile directory name; the suffix is the numeric id.
pub const PROFILE_DIR_PREFIX: &str = "profile_";

/// Settings document written when a profile is created.
pub const SETTINGS_FILE: &str = "settings.json";

/// Table written by the simulation executable.
pub const OUTPUT_FILE: &str = "output.csv";
