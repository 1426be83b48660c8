use core::fmt;
use core::str::FromStr;

use crate::error::{TlError, TlResult};
use crate::layout::PROFILE_DIR_PREFIX;

/// Identifier of a profile, taken from the numeric suffix of `profile_<id>`.
///
/// Ids are reused: the next id is always one past the largest id on disk, so
/// deleting the newest profile frees its id again.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ProfileId(u32);

impl ProfileId {
    pub const FIRST: ProfileId = ProfileId(0);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Id following this one, or `None` on overflow.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Parse a directory name of the form `profile_<integer>`.
    pub fn from_dir_name(name: &str) -> TlResult<Self> {
        let suffix = name
            .strip_prefix(PROFILE_DIR_PREFIX)
            .ok_or_else(|| TlError::NotProfileDir {
                name: name.to_string(),
            })?;
        // Digits only, no leading zeros: every id has exactly one directory name.
        let canonical = suffix == "0" || !suffix.starts_with('0');
        if suffix.is_empty() || !canonical || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TlError::NotProfileDir {
                name: name.to_string(),
            });
        }
        suffix
            .parse::<u32>()
            .map(Self)
            .map_err(|_| TlError::NotProfileDir {
                name: name.to_string(),
            })
    }

    /// Directory name for this id.
    pub fn dir_name(self) -> String {
        format!("{}{}", PROFILE_DIR_PREFIX, self.0)
    }
}

impl From<u32> for ProfileId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl FromStr for ProfileId {
    type Err = TlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<u32>()
            .map(Self)
            .or_else(|_| Self::from_dir_name(trimmed))
            .map_err(|_| TlError::InvalidId {
                text: s.to_string(),
            })
    }
}

impl fmt::Debug for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProfileId({})", self.0)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_profile_dir_names() {
        assert_eq!(ProfileId::from_dir_name("profile_0"), Ok(ProfileId::new(0)));
        assert_eq!(
            ProfileId::from_dir_name("profile_42"),
            Ok(ProfileId::new(42))
        );
    }

    #[test]
    fn rejects_foreign_names() {
        for name in [
            "notes",
            "profile_",
            "profile_x",
            "profile_-1",
            "profile_+3",
            "profile_ 3",
            "Profile_3",
            "profile_99999999999",
            "profile_007",
        ] {
            assert!(ProfileId::from_dir_name(name).is_err(), "{name}");
        }
    }

    #[test]
    fn from_str_accepts_bare_number_or_dir_name() {
        assert_eq!("7".parse::<ProfileId>(), Ok(ProfileId::new(7)));
        assert_eq!("profile_7".parse::<ProfileId>(), Ok(ProfileId::new(7)));
        assert!("seven".parse::<ProfileId>().is_err());
    }

    #[test]
    fn next_overflows_to_none() {
        assert_eq!(ProfileId::new(3).next(), Some(ProfileId::new(4)));
        assert_eq!(ProfileId::new(u32::MAX).next(), None);
    }

    proptest! {
        #[test]
        fn dir_name_round_trip(n in any::<u32>()) {
            let id = ProfileId::new(n);
            prop_assert_eq!(ProfileId::from_dir_name(&id.dir_name()), Ok(id));
        }
    }
}
