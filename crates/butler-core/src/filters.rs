//! The photometric filter catalog.
//!
//! An explicit, owned registry: the host asks each instrument plugin to
//! register its filters exactly once at startup, and registration is
//! idempotent so a repeated call is harmless. There is no process-global
//! table to mutate behind anyone's back.

use serde::{Deserialize, Serialize};

use crate::error::{ButlerError, Result};

/// One filter: canonical name, representative wavelength, accepted aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDef {
    pub name: String,
    pub wavelength_nm: f64,
    pub aliases: Vec<String>,
}

impl FilterDef {
    pub fn new(name: &str, wavelength_nm: f64) -> Self {
        Self {
            name: name.to_string(),
            wavelength_nm,
            aliases: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }
}

/// Catalog of defined filters, looked up by canonical name or alias.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCatalog {
    defs: Vec<FilterDef>,
}

impl FilterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a filter. Redefining an identical filter is a no-op;
    /// redefining with different parameters is an error.
    pub fn define(&mut self, def: FilterDef) -> Result<()> {
        if let Some(existing) = self.defs.iter().find(|d| d.name == def.name) {
            if *existing == def {
                return Ok(());
            }
            return Err(ButlerError::FilterConflict(def.name));
        }
        self.defs.push(def);
        Ok(())
    }

    /// Look up by canonical name or alias.
    pub fn get(&self, name: &str) -> Option<&FilterDef> {
        self.defs
            .iter()
            .find(|d| d.name == name || d.aliases.iter().any(|a| a == name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Canonical names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_is_idempotent() {
        let mut catalog = FilterCatalog::new();
        let r = FilterDef::new("r", 619.42).with_alias("SDSSR");
        catalog.define(r.clone()).unwrap();
        catalog.define(r).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_conflicting_redefinition_errors() {
        let mut catalog = FilterCatalog::new();
        catalog.define(FilterDef::new("r", 619.42)).unwrap();
        let err = catalog.define(FilterDef::new("r", 600.0));
        assert!(matches!(err, Err(ButlerError::FilterConflict(_))));
    }

    #[test]
    fn test_alias_lookup() {
        let mut catalog = FilterCatalog::new();
        catalog
            .define(FilterDef::new("g", 476.31).with_alias("SDSSG"))
            .unwrap();
        assert_eq!(catalog.get("SDSSG").map(|d| d.name.as_str()), Some("g"));
        assert!(catalog.get("q").is_none());
    }
}
