//! Configuration I/O (YAML schema)
//!
//! Loading and export live on `BytemapConfig`; this module owns the on-disk
//! schema and the key checks that run before deserialization.

use super::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Schema versions this crate can read
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

const TOP_LEVEL_FIELDS: &[&str] = &["version", "preset", "overrides"];

const OVERRIDE_FIELDS: &[&str] = &[
    "enabled",
    "precise_bytemaps",
    "cheap",
    "use_intervals",
    "destructive_annotations",
    "preserved_vars",
];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: Option<u32>,

    /// Base preset
    pub preset: String,

    /// Fine-grained overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Configuration overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precise_bytemaps: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cheap: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_intervals: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destructive_annotations: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserved_vars: Option<Vec<String>>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl ConfigExportV1 {
    /// Parse the schema, reporting unknown keys with a suggestion
    pub fn parse(content: &str) -> ConfigResult<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;

        if let Some(map) = value.as_mapping() {
            check_keys(map, TOP_LEVEL_FIELDS, "config")?;
            if let Some(overrides) = map.get("overrides").and_then(|v| v.as_mapping()) {
                check_keys(overrides, OVERRIDE_FIELDS, "overrides")?;
            }
        }

        Ok(serde_yaml::from_value(value)?)
    }
}

fn check_keys(map: &serde_yaml::Mapping, valid: &[&str], section: &str) -> ConfigResult<()> {
    for key in map.keys() {
        let Some(key) = key.as_str() else { continue };
        if !valid.contains(&key) {
            return Err(ConfigError::unknown_field_with_suggestion(
                key,
                section,
                valid.iter().map(|s| s.to_string()).collect(),
            ));
        }
    }
    Ok(())
}
