//! The auxiliary visit index rooted at the repository path.
//!
//! Construction opens or creates `monocam_registry.json` under the
//! repository root; the mapper holds the handle but takes no further
//! lifecycle responsibility. Records are keyed by visit number.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use butler_core::data_id::DataId;
use butler_core::Result;

/// Index file name under the repository root.
pub const REGISTRY_FILE: &str = "monocam_registry.json";

/// One indexed visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub visit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

impl VisitRecord {
    /// Build a record from a validated data identifier. `visit` is
    /// mandatory; the descriptive keys are carried when present.
    pub fn from_data_id(data_id: &DataId) -> Result<Self> {
        Ok(Self {
            visit: data_id.int("visit")?,
            filter: data_id.text("filter").ok().map(str::to_string),
            date: data_id.text("date").ok().map(str::to_string),
            exp_time: data_id.float("expTime").ok(),
            object: data_id.text("object").ok().map(str::to_string),
        })
    }
}

/// Serialized form of the index.
#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    created: DateTime<Utc>,
    visits: Vec<VisitRecord>,
}

/// The open visit index.
#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    created: DateTime<Utc>,
    visits: BTreeMap<i64, VisitRecord>,
}

impl Registry {
    /// Open the index under `root`, creating the directory and an empty
    /// index file when absent.
    pub fn open(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let path = root.join(REGISTRY_FILE);
        if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            let file: RegistryFile = serde_json::from_str(&text)?;
            let visits = file.visits.into_iter().map(|r| (r.visit, r)).collect();
            debug!(path = %path.display(), "opened visit registry");
            Ok(Self {
                path,
                created: file.created,
                visits,
            })
        } else {
            let registry = Self {
                path,
                created: Utc::now(),
                visits: BTreeMap::new(),
            };
            registry.save()?;
            debug!(path = %registry.path.display(), "created visit registry");
            Ok(registry)
        }
    }

    /// Insert a record; returns false when the visit is already indexed.
    pub fn insert(&mut self, record: VisitRecord) -> bool {
        match self.visits.entry(record.visit) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    pub fn lookup(&self, visit: i64) -> Option<&VisitRecord> {
        self.visits.get(&visit)
    }

    /// Write the index back to disk.
    pub fn save(&self) -> Result<()> {
        let file = RegistryFile {
            created: self.created,
            visits: self.visits.values().cloned().collect(),
        };
        let text = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }
}
