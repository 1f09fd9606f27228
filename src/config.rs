//! Mapper configuration: the construction inputs the host hands to
//! [`crate::MonocamMapper::new`].
//!
//! `MapperConfig` can be built directly or loaded through the layered
//! `config` stack (optional TOML file, then `MONOCAM_`-prefixed environment
//! variables), the same way the host assembles its own settings.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use butler_core::Result;

/// Construction parameters. `root` is mandatory: the repository path the
/// visit registry is initialized under.
#[derive(Debug, Clone, Deserialize)]
pub struct MapperConfig {
    pub root: PathBuf,
    /// Separate calibration repository, when not colocated with `root`.
    #[serde(default)]
    pub calib_root: Option<PathBuf>,
    /// Override for the policy resource compiled into the plugin.
    #[serde(default)]
    pub policy_path: Option<PathBuf>,
}

impl MapperConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            calib_root: None,
            policy_path: None,
        }
    }

    /// Load from an optional TOML file layered under `MONOCAM_*` environment
    /// variables. A missing `root` fails deserialization.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(config::Environment::with_prefix("MONOCAM"));
        let settings = builder.build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// Override-parameter bundle the host may pass at construction.
///
/// `do_footprints` is special-cased onto the mapper instance; the remaining
/// parameters merge into the configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyOverrides {
    #[serde(default)]
    pub do_footprints: bool,
    #[serde(default)]
    pub calib_root: Option<PathBuf>,
    #[serde(default)]
    pub policy_path: Option<PathBuf>,
}
