//! Bytemap optimizer configuration

use super::error::{ConfigError, ConfigResult};
use super::io::{ConfigExportV1, ConfigOverrides, SUPPORTED_VERSIONS};
use super::preset::Preset;
use super::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Settings for the bytemap passes and their driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BytemapConfig {
    /// Preset the settings were derived from (exported as `preset`)
    #[serde(skip)]
    base: Preset,

    /// Master switch for the driver
    pub enabled: bool,

    /// Bytemaps are modeled precisely downstream; rewriting them would lose that
    pub precise_bytemaps: bool,

    /// Run the inliner alone, without intervals
    pub cheap: bool,

    /// Consult the interval oracle for equality and containment
    pub use_intervals: bool,

    /// Annotation commands do not keep their operands alive
    pub destructive_annotations: bool,

    /// Variables whose assignments are never erased or inlined
    pub preserved_vars: Vec<String>,
}

impl Default for BytemapConfig {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}

impl BytemapConfig {
    /// Create a config from a preset
    pub fn preset(preset: Preset) -> Self {
        let (enabled, cheap, use_intervals) = match preset {
            Preset::Off => (false, false, false),
            Preset::Cheap => (true, true, false),
            Preset::Full => (true, false, true),
        };
        Self {
            base: preset,
            enabled,
            precise_bytemaps: false,
            cheap,
            use_intervals,
            destructive_annotations: false,
            preserved_vars: Vec::new(),
        }
    }

    /// Preset this config was derived from
    pub fn base_preset(&self) -> Preset {
        self.base
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn precise_bytemaps(mut self, precise: bool) -> Self {
        self.precise_bytemaps = precise;
        self
    }

    pub fn cheap(mut self, cheap: bool) -> Self {
        self.cheap = cheap;
        self
    }

    pub fn use_intervals(mut self, use_intervals: bool) -> Self {
        self.use_intervals = use_intervals;
        self
    }

    pub fn destructive_annotations(mut self, destructive: bool) -> Self {
        self.destructive_annotations = destructive;
        self
    }

    pub fn preserved_vars(mut self, vars: Vec<String>) -> Self {
        self.preserved_vars = vars;
        self
    }

    /// Whether the driver has anything to do
    pub fn is_active(&self) -> bool {
        self.enabled && !self.precise_bytemaps
    }

    /// Apply YAML overrides on top of this config
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(v) = overrides.enabled {
            self.enabled = v;
        }
        if let Some(v) = overrides.precise_bytemaps {
            self.precise_bytemaps = v;
        }
        if let Some(v) = overrides.cheap {
            self.cheap = v;
        }
        if let Some(v) = overrides.use_intervals {
            self.use_intervals = v;
        }
        if let Some(v) = overrides.destructive_annotations {
            self.destructive_annotations = v;
        }
        if let Some(vars) = &overrides.preserved_vars {
            self.preserved_vars = vars.clone();
        }
        self
    }

    /// Overrides relative to the base preset (only differing fields)
    fn overrides(&self) -> ConfigOverrides {
        let base = Self::preset(self.base);
        let diff = |a: bool, b: bool| (a != b).then_some(a);
        ConfigOverrides {
            enabled: diff(self.enabled, base.enabled),
            precise_bytemaps: diff(self.precise_bytemaps, base.precise_bytemaps),
            cheap: diff(self.cheap, base.cheap),
            use_intervals: diff(self.use_intervals, base.use_intervals),
            destructive_annotations: diff(
                self.destructive_annotations,
                base.destructive_annotations,
            ),
            preserved_vars: (!self.preserved_vars.is_empty()).then(|| self.preserved_vars.clone()),
        }
    }

    /// Load from a YAML string (schema v1)
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let export = ConfigExportV1::parse(content)?;

        let version = export.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset = Preset::from_str(&export.preset)
            .map_err(|_| ConfigError::UnknownPreset(export.preset.clone()))?;

        let mut config = Self::preset(preset);
        if let Some(overrides) = &export.overrides {
            config = config.with_overrides(overrides);
        }
        config.validate()?;

        tracing::debug!(preset = %preset, "loaded bytemap config");
        Ok(config)
    }

    /// Load from a YAML file (schema v1)
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Export as YAML (schema v1)
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let overrides = self.overrides();
        let export = ConfigExportV1 {
            version: Some(1),
            preset: self.base.as_str().to_string(),
            overrides: (!overrides.is_empty()).then_some(overrides),
        };
        Ok(serde_yaml::to_string(&export)?)
    }
}

impl Validatable for BytemapConfig {
    fn validate(&self) -> ConfigResult<()> {
        let mut seen = BTreeSet::new();
        for name in &self.preserved_vars {
            if name.trim().is_empty() {
                return Err(ConfigError::invalid_field(
                    "preserved_vars",
                    format!("{:?}", name),
                    "Variable names must be non-empty",
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::invalid_field(
                    "preserved_vars",
                    name,
                    "Each variable may be listed only once",
                ));
            }
        }

        if self.cheap && self.use_intervals {
            return Err(ConfigError::Conflict {
                issue: "cheap mode runs without the interval oracle, but use_intervals is set"
                    .to_string(),
                fix: "set use_intervals: false or cheap: false".to_string(),
            });
        }

        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "BytemapConfig"
    }
}
