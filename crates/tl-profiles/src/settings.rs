//! Validated key → number store mirroring the settings form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{ProfileError, ProfileResult};

/// What a call to [`SettingsDocument::set`] did to the mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetOutcome {
    Stored(f64),
    Removed,
    /// Input was not a finite number; the previous value (if any) is kept.
    Rejected,
}

/// Flat mapping from setting name to value, serialized as a JSON object.
///
/// Only finite numbers are ever stored. Clearing a field removes its key
/// rather than writing a default, so the simulation falls back to its own
/// built-in value for anything absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsDocument {
    values: BTreeMap<String, f64>,
}

impl SettingsDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply raw form text to `name`.
    ///
    /// Empty (or all-whitespace) text removes the key. Text that does not
    /// parse as a finite float leaves the previous value untouched.
    pub fn set(&mut self, name: &str, raw_text: &str) -> SetOutcome {
        let text = raw_text.trim();
        if text.is_empty() {
            self.values.remove(name);
            return SetOutcome::Removed;
        }
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                self.values.insert(name.to_string(), value);
                SetOutcome::Stored(value)
            }
            _ => SetOutcome::Rejected,
        }
    }

    /// Store an already-numeric value. Non-finite values are rejected.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> SetOutcome {
        if !value.is_finite() {
            return SetOutcome::Rejected;
        }
        self.values.insert(name.into(), value);
        SetOutcome::Stored(value)
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .values
            .iter()
            .filter_map(|(k, v)| {
                serde_json::Number::from_f64(*v).map(|n| (k.clone(), serde_json::Value::Number(n)))
            })
            .collect();
        serde_json::Value::Object(map)
    }

    /// Replace the mapping wholesale from a JSON object of numbers.
    pub fn from_json(doc: &serde_json::Value) -> ProfileResult<Self> {
        let object = doc.as_object().ok_or_else(|| {
            ProfileError::InvalidSettings("expected a JSON object at the top level".to_string())
        })?;

        let mut values = BTreeMap::new();
        for (key, value) in object {
            let number = value.as_f64().ok_or_else(|| {
                ProfileError::InvalidSettings(format!("value for '{}' is not a number", key))
            })?;
            values.insert(key.clone(), number);
        }
        Ok(Self { values })
    }

    pub fn to_json_string_pretty(&self) -> String {
        // A map of finite floats always serializes.
        serde_json::to_string_pretty(&self.to_json()).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json_str(text: &str) -> ProfileResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| ProfileError::InvalidSettings(format!("invalid JSON: {}", e)))?;
        Self::from_json(&value)
    }
}

impl FromIterator<(String, f64)> for SettingsDocument {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut doc = SettingsDocument::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}
