//! Monocam's filter complement and its integer-ID table.
//!
//! Wavelengths are the survey reference values; `NONE` is the sentinel for
//! frames taken with no filter in the beam.

use butler_core::filters::{FilterCatalog, FilterDef};
use butler_core::Result;

/// Static filter definition: canonical name, representative wavelength in
/// nanometers, accepted aliases.
pub struct FilterSpec {
    pub name: &'static str,
    pub wavelength_nm: f64,
    pub aliases: &'static [&'static str],
}

/// The supported filters.
pub const MONOCAM_FILTERS: &[FilterSpec] = &[
    FilterSpec {
        name: "u",
        wavelength_nm: 364.59,
        aliases: &[],
    },
    FilterSpec {
        name: "g",
        wavelength_nm: 476.31,
        aliases: &["SDSSG"],
    },
    FilterSpec {
        name: "r",
        wavelength_nm: 619.42,
        aliases: &["SDSSR"],
    },
    FilterSpec {
        name: "i",
        wavelength_nm: 752.06,
        aliases: &["SDSSI"],
    },
    FilterSpec {
        name: "z",
        wavelength_nm: 866.85,
        aliases: &["SDSSZ"],
    },
    FilterSpec {
        name: "y",
        wavelength_nm: 971.68,
        aliases: &["y4"],
    },
    FilterSpec {
        name: "NONE",
        wavelength_nm: 0.0,
        aliases: &["no_filter", "OPEN"],
    },
];

/// Filter-name to integer-ID table. `i2` is a second i-band coating that
/// shares an ID with `y` in the original numbering.
pub const FILTER_ID_MAP: &[(&str, i32)] = &[
    ("u", 0),
    ("g", 1),
    ("r", 2),
    ("i", 3),
    ("z", 4),
    ("y", 5),
    ("i2", 5),
];

/// Register the full complement on a catalog. Idempotent: calling twice
/// leaves the catalog unchanged.
pub fn register_filters(catalog: &mut FilterCatalog) -> Result<()> {
    for spec in MONOCAM_FILTERS {
        let mut def = FilterDef::new(spec.name, spec.wavelength_nm);
        for alias in spec.aliases {
            def = def.with_alias(alias);
        }
        catalog.define(def)?;
    }
    Ok(())
}

/// Integer ID for a filter name, if the instrument knows it.
pub fn filter_id(name: &str) -> Option<i32> {
    FILTER_ID_MAP
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, id)| *id)
}
