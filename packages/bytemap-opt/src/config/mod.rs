//! Configuration for the bytemap passes
//!
//! Two levels:
//! - Preset: `off`, `cheap` or `full`
//! - YAML: a versioned file naming a preset plus field overrides
//!
//! # Examples
//!
//! ```rust,ignore
//! use bytemap_opt::config::{BytemapConfig, Preset};
//!
//! let config = BytemapConfig::preset(Preset::Full).destructive_annotations(true);
//! let config = BytemapConfig::from_yaml("bytemaps.yaml")?;
//! ```

pub mod bytemap_config;
pub mod error;
pub mod io;
pub mod preset;
pub mod validation;

// Re-exports
pub use bytemap_config::BytemapConfig;
pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigExportV1, ConfigOverrides};
pub use preset::Preset;
pub use validation::{Validatable, ValidatableCollection};
