//! Preset configurations
//!
//! Presets provide complete default configurations for common use cases.

use serde::{Deserialize, Serialize};

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Bytemap optimizations switched off; the driver returns its input.
    Off,

    /// Inliner only, without the interval oracle.
    ///
    /// Much faster, and enough to strip the simple memory traffic that hides
    /// arithmetic patterns from later passes. Long-copies are never resolved.
    Cheap,

    /// inline → cone-of-influence → scalarize → cone-of-influence, with intervals.
    Full,
}

impl Preset {
    /// Parse preset from string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "cheap" => Ok(Self::Cheap),
            "full" => Ok(Self::Full),
            _ => Err(format!(
                "Unknown preset '{}'. Valid presets: off, cheap, full",
                s
            )),
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Cheap => "cheap",
            Self::Full => "full",
        }
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::Full
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
