//! Dataset-type mapping tables: how a logical dataset request turns into a
//! file path and an in-memory representation.
//!
//! The stored representation is an explicit tagged enum rather than a name
//! string, so calibration dispatch is an exhaustive match and an unrecognized
//! declaration dies at policy load, not in the middle of a read.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::data_id::DataId;
use crate::error::{ButlerError, Result};

/// Declared in-memory representation of a stored dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredKind {
    Image,
    MaskedImage,
    Exposure,
}

impl StoredKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoredKind::Image => "Image",
            StoredKind::MaskedImage => "MaskedImage",
            StoredKind::Exposure => "Exposure",
        }
    }
}

impl fmt::Display for StoredKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoredKind {
    type Err = ButlerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Image" => Ok(StoredKind::Image),
            "MaskedImage" => Ok(StoredKind::MaskedImage),
            "Exposure" => Ok(StoredKind::Exposure),
            other => Err(ButlerError::Policy(format!(
                "unrecognized stored kind '{other}'"
            ))),
        }
    }
}

/// Type of one data-identifier key, as declared to the registry matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Int,
    Str,
    Float,
}

impl FromStr for KeyKind {
    type Err = ButlerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int" => Ok(KeyKind::Int),
            "str" => Ok(KeyKind::Str),
            "float" => Ok(KeyKind::Float),
            other => Err(ButlerError::Policy(format!(
                "unrecognized key kind '{other}'"
            ))),
        }
    }
}

/// One dataset-type mapping: path template, stored representation, and the
/// identifier keys the registry can match against.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    pub template: String,
    /// Absent for non-pixel datasets (catalogs); required for calibrations.
    pub stored: Option<StoredKind>,
    pub key_types: BTreeMap<String, KeyKind>,
}

impl Mapping {
    /// Expand `{key}` placeholders in the template against a data identifier.
    pub fn path_for(&self, root: &Path, data_id: &DataId) -> Result<PathBuf> {
        let mut out = String::new();
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| {
                ButlerError::Policy(format!("unbalanced '{{' in template '{}'", self.template))
            })?;
            let key = &after[..close];
            let value = data_id.get(key).ok_or_else(|| {
                ButlerError::InvalidDataId(format!(
                    "template '{}' needs key '{key}'",
                    self.template
                ))
            })?;
            out.push_str(&value.to_string());
            rest = &after[close + 1..];
        }
        out.push_str(rest);
        Ok(root.join(out))
    }
}

/// The two mapping tables a mapper exposes: ordinary datasets and
/// calibration products.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingTables {
    pub mappings: BTreeMap<String, Mapping>,
    pub calibrations: BTreeMap<String, Mapping>,
}

impl MappingTables {
    pub fn mapping(&self, name: &str) -> Result<&Mapping> {
        self.mappings
            .get(name)
            .ok_or_else(|| ButlerError::UnknownDataset(name.to_string()))
    }

    pub fn mapping_mut(&mut self, name: &str) -> Result<&mut Mapping> {
        self.mappings
            .get_mut(name)
            .ok_or_else(|| ButlerError::UnknownDataset(name.to_string()))
    }

    pub fn calibration(&self, name: &str) -> Result<&Mapping> {
        self.calibrations
            .get(name)
            .ok_or_else(|| ButlerError::UnknownDataset(name.to_string()))
    }
}
