//! The settings form: which fields exist, how they are grouped, and the JSON
//! key each one writes.
//!
//! Defaults are the values the simulation falls back to when a key is absent;
//! frontends show them as placeholders and never write them on their own.

/// One numeric input of the settings form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingField {
    pub label: &'static str,
    pub key: &'static str,
    pub default: f64,
}

/// A titled group of fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingCategory {
    pub name: &'static str,
    pub fields: &'static [SettingField],
}

const fn field(label: &'static str, key: &'static str, default: f64) -> SettingField {
    SettingField {
        label,
        key,
        default,
    }
}

pub const CATALOG: &[SettingCategory] = &[
    SettingCategory {
        name: "Target Settings",
        fields: &[
            field("Target Height", "targetheight", 2.2),
            field("Target Radius", "targetradius", 0.2),
            field("Distance Tolerance", "distancetolerance", 0.01),
        ],
    },
    SettingCategory {
        name: "Angle Settings",
        fields: &[
            field("Max Angle", "maxangle", 90.0),
            field("Min Angle", "minangle", 0.0),
            field("Angle Delta", "deltaangle", 0.2),
        ],
    },
    SettingCategory {
        name: "Distance Settings",
        fields: &[
            field("Max Distance", "maxdistance", 4.0),
            field("Min Distance", "mindistance", 1.0),
            field("Distance Delta", "deltadistance", 0.3),
        ],
    },
    SettingCategory {
        name: "Shooter Speed Settings",
        fields: &[
            field("Max Shooter Speed", "maxspeed", 25.0),
            field("Min Shooter Speed", "minspeed", 0.0),
            field("Shooter Speed Delta", "deltaspeed", 0.1),
        ],
    },
    SettingCategory {
        name: "Robot Speed Settings",
        fields: &[
            field("Max Robot Speed", "maxrobotspeed", 3.2),
            field("Robot Speed Delta", "deltarobotspeed", 0.38),
        ],
    },
    SettingCategory {
        name: "Advanced",
        fields: &[
            field("Tangential Derivative Step", "dtangential", 1e-5),
            field("Radial Derivative Step", "dradial", 1e-5),
            field("Robot Speed Derivative Step", "drobotspeed", 1e-5),
            field("Max Height Cost Threshold", "minheightformaxheightcost", 2.8),
            field("Max Height Cost Factor", "maxheightcostfactor", 0.125),
            field("Speed Search Tolerance", "speedtolerancetostopsearch", 1e-5),
            field("Impact Velocity Cost Weight", "impactvelocitycostweight", 0.3),
        ],
    },
];

/// Normalize a display name into a settings key: lower-case, spaces removed.
pub fn setting_key(display_name: &str) -> String {
    display_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn fields() -> impl Iterator<Item = &'static SettingField> {
    CATALOG.iter().flat_map(|c| c.fields.iter())
}

pub fn find_field(key: &str) -> Option<&'static SettingField> {
    fields().find(|f| f.key == key)
}

/// Map user-typed names (a catalog label like "Robot Speed Delta" or a raw
/// key) to the key stored in settings.json.
pub fn resolve_key(name: &str) -> String {
    let normalized = setting_key(name);
    fields()
        .find(|f| setting_key(f.label) == normalized)
        .map(|f| f.key.to_string())
        .unwrap_or(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keys_are_unique_and_normalized() {
        let mut seen = HashSet::new();
        for f in fields() {
            assert!(seen.insert(f.key), "duplicate key {}", f.key);
            assert_eq!(setting_key(f.key), f.key);
        }
    }

    #[test]
    fn setting_key_strips_spaces_and_case() {
        assert_eq!(setting_key("Target Height"), "targetheight");
        assert_eq!(setting_key("  Max  Angle "), "maxangle");
    }

    #[test]
    fn labels_resolve_to_catalog_keys() {
        assert_eq!(resolve_key("Robot Speed Delta"), "deltarobotspeed");
        assert_eq!(resolve_key("max angle"), "maxangle");
        assert_eq!(resolve_key("deltarobotspeed"), "deltarobotspeed");
        assert_eq!(resolve_key("Custom Knob"), "customknob");
    }

    #[test]
    fn find_field_by_key() {
        let f = find_field("maxdistance").unwrap();
        assert_eq!(f.label, "Max Distance");
        assert_eq!(f.default, 4.0);
        assert!(find_field("nope").is_none());
    }
}
