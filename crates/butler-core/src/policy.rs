//! Policy resources: the TOML description of a camera's dataset layout that
//! a mapper turns into [`MappingTables`] at construction.
//!
//! The butler owns the broader policy grammar; this is the subset an
//! instrument plugin consumes for itself. A missing file or a parse error is
//! fatal at construction, with no partial state left behind.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ButlerError, Result};
use crate::mapping::{KeyKind, Mapping, MappingTables, StoredKind};

/// Camera-level policy attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct CameraPolicy {
    pub name: String,
}

/// One dataset entry: template, optional stored representation, and initial
/// key-type declarations.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetPolicy {
    pub template: String,
    #[serde(default)]
    pub stored: Option<String>,
    #[serde(default)]
    pub keys: BTreeMap<String, String>,
}

/// A parsed policy resource.
#[derive(Debug, Clone, Deserialize)]
pub struct Policy {
    pub camera: CameraPolicy,
    #[serde(default)]
    pub datasets: BTreeMap<String, DatasetPolicy>,
    #[serde(default)]
    pub calibrations: BTreeMap<String, DatasetPolicy>,
}

impl Policy {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a policy from disk. A missing file propagates as an I/O error.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Build mapping tables, validating every declared representation and
    /// key kind. Calibration entries must declare a stored representation.
    pub fn build_tables(&self) -> Result<MappingTables> {
        let mut tables = MappingTables::default();
        for (name, entry) in &self.datasets {
            tables
                .mappings
                .insert(name.clone(), build_mapping(name, entry, false)?);
        }
        for (name, entry) in &self.calibrations {
            tables
                .calibrations
                .insert(name.clone(), build_mapping(name, entry, true)?);
        }
        debug!(
            camera = self.camera.name.as_str(),
            datasets = tables.mappings.len(),
            calibrations = tables.calibrations.len(),
            "built mapping tables"
        );
        Ok(tables)
    }
}

fn build_mapping(name: &str, entry: &DatasetPolicy, calibration: bool) -> Result<Mapping> {
    let stored = entry
        .stored
        .as_deref()
        .map(str::parse::<StoredKind>)
        .transpose()?;
    if calibration && stored.is_none() {
        return Err(ButlerError::Policy(format!(
            "calibration '{name}' must declare a stored representation"
        )));
    }
    let mut key_types = BTreeMap::new();
    for (key, kind) in &entry.keys {
        key_types.insert(key.clone(), kind.parse::<KeyKind>()?);
    }
    Ok(Mapping {
        template: entry.template.clone(),
        stored,
        key_types,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[camera]
name = "testcam"

[datasets.raw]
template = "raw/{visit}/raw-{visit}.fits"
stored = "Exposure"
keys = { visit = "int", filter = "str" }

[datasets.src]
template = "src/{visit}/src-{visit}.fits"

[calibrations.bias]
template = "bias/bias.fits"
stored = "Image"
"#;

    #[test]
    fn test_parse_and_build() {
        let policy = Policy::from_toml_str(SAMPLE).unwrap();
        assert_eq!(policy.camera.name, "testcam");
        let tables = policy.build_tables().unwrap();
        assert_eq!(
            tables.mapping("raw").unwrap().stored,
            Some(StoredKind::Exposure)
        );
        assert_eq!(tables.mapping("src").unwrap().stored, None);
        assert_eq!(
            tables.calibration("bias").unwrap().stored,
            Some(StoredKind::Image)
        );
        assert_eq!(
            tables.mapping("raw").unwrap().key_types.get("visit"),
            Some(&KeyKind::Int)
        );
    }

    #[test]
    fn test_unrecognized_stored_kind_fails_load() {
        let text = SAMPLE.replace("\"Image\"", "\"DecoratedImageU\"");
        let policy = Policy::from_toml_str(&text).unwrap();
        assert!(matches!(
            policy.build_tables(),
            Err(ButlerError::Policy(msg)) if msg.contains("DecoratedImageU")
        ));
    }

    #[test]
    fn test_calibration_requires_stored() {
        let text = SAMPLE.replace("stored = \"Image\"\n", "");
        let policy = Policy::from_toml_str(&text).unwrap();
        assert!(matches!(
            policy.build_tables(),
            Err(ButlerError::Policy(msg)) if msg.contains("bias")
        ));
    }

    #[test]
    fn test_missing_file_propagates() {
        let err = Policy::load(Path::new("/nonexistent/policy.toml"));
        assert!(matches!(err, Err(ButlerError::Io(_))));
    }
}
