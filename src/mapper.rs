//! The Monocam mapper: camera-specific overrides the butler calls through
//! the [`CameraMapper`] contract.
//!
//! Monocam has exactly one CCD and one readout segment, which keeps most
//! hooks small: the exposure identifier is the visit number widened to 64
//! bits, the detector name is a constant, and the amp-segmented raw format
//! is indistinguishable from the full-frame one. The real work is header
//! repair on raw reads (the acquisition software writes no WCS) and coercing
//! calibration frames into the common exposure shape.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use butler_core::camera_geom::CameraGeometry;
use butler_core::data_id::{DataId, DataIdValue};
use butler_core::error::{ButlerError, Result};
use butler_core::filters::FilterCatalog;
use butler_core::fits;
use butler_core::image::{DecoratedImage, Exposure};
use butler_core::mapper::{CalibItem, CameraMapper, Defect, Location};
use butler_core::mapping::{KeyKind, MappingTables, StoredKind};
use butler_core::policy::Policy;
use butler_core::property::PropertyList;
use butler_core::wcs::Wcs;

use crate::camera::{monocam_geometry, DETECTOR_NAME};
use crate::config::{MapperConfig, PolicyOverrides};
use crate::filters::{register_filters, FILTER_ID_MAP};
use crate::registry::{Registry, VisitRecord};
use crate::wcs_synth::synthesize_wcs;

/// Bits the packed exposure identifier occupies.
pub const EXPOSURE_ID_BITS: u32 = 41;

/// Largest visit number the identifier can carry. Tied to
/// [`EXPOSURE_ID_BITS`]: raising one without the other makes packed
/// identifiers collide silently.
pub const MAX_VISIT: i64 = (1_i64 << EXPOSURE_ID_BITS) - 1;

/// Dataset types that carry the full registry key set.
const KEYED_DATASETS: &[&str] = &[
    "raw", "raw_amp", "postISRCCD", "calexp", "src", "icSrc", "srcMatch",
];

/// The canonical policy resource, compiled into the plugin.
const DEFAULT_POLICY: &str = include_str!("../policy/monocam.toml");

/// Mapper for the Monocam single-CCD instrument.
pub struct MonocamMapper {
    root: PathBuf,
    calib_root: Option<PathBuf>,
    camera_name: String,
    tables: MappingTables,
    filter_catalog: FilterCatalog,
    filter_ids: BTreeMap<String, i32>,
    registry: Registry,
    do_footprints: bool,
}

impl MonocamMapper {
    /// Construct the mapper: load the policy resource, merge overrides,
    /// open the visit registry under `root`, broadcast the registry key set
    /// onto the science datasets, and register the filter complement.
    ///
    /// Any failure (missing policy override file, unparsable policy,
    /// unwritable root) propagates immediately; there is no
    /// partial-construction recovery.
    pub fn new(overrides: Option<PolicyOverrides>, mut config: MapperConfig) -> Result<Self> {
        let mut do_footprints = false;
        if let Some(overrides) = overrides {
            do_footprints = overrides.do_footprints;
            if overrides.calib_root.is_some() {
                config.calib_root = overrides.calib_root;
            }
            if overrides.policy_path.is_some() {
                config.policy_path = overrides.policy_path;
            }
        }

        let policy = match &config.policy_path {
            Some(path) => Policy::load(path)?,
            None => Policy::from_toml_str(DEFAULT_POLICY)?,
        };
        let mut tables = policy.build_tables()?;

        let registry = Registry::open(&config.root)?;

        // Every dataset type of interest knows about the full range of keys
        // available from the registry.
        for name in KEYED_DATASETS {
            let mapping = tables.mapping_mut(name)?;
            for (key, kind) in REGISTRY_KEYS {
                mapping.key_types.insert((*key).to_string(), *kind);
            }
        }

        let mut filter_catalog = FilterCatalog::new();
        register_filters(&mut filter_catalog)?;
        let filter_ids = FILTER_ID_MAP
            .iter()
            .map(|(name, id)| ((*name).to_string(), *id))
            .collect();

        info!(
            camera = policy.camera.name.as_str(),
            root = %config.root.display(),
            "monocam mapper ready"
        );
        Ok(Self {
            root: config.root,
            calib_root: config.calib_root,
            camera_name: policy.camera.name,
            tables,
            filter_catalog,
            filter_ids,
            registry,
            do_footprints,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn calib_root(&self) -> Option<&Path> {
        self.calib_root.as_deref()
    }

    pub fn camera_name(&self) -> &str {
        &self.camera_name
    }

    pub fn filter_catalog(&self) -> &FilterCatalog {
        &self.filter_catalog
    }

    /// Integer ID for a filter name.
    pub fn filter_id(&self, name: &str) -> Option<i32> {
        self.filter_ids.get(name).copied()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn do_footprints(&self) -> bool {
        self.do_footprints
    }

    /// Resolve a dataset request to a location under the repository root.
    pub fn location_for(&self, dataset: &str, data_id: &DataId) -> Result<Location> {
        let mapping = if self.tables.mappings.contains_key(dataset) {
            self.tables.mapping(dataset)?
        } else {
            self.tables.calibration(dataset)?
        };
        let root = match (&self.calib_root, self.tables.calibrations.contains_key(dataset)) {
            (Some(calib_root), true) => calib_root.as_path(),
            _ => self.root.as_path(),
        };
        Ok(Location::single(mapping.path_for(root, data_id)?))
    }

    /// Index a visit; persists the registry when the record is new.
    pub fn register_visit(&mut self, data_id: &DataId) -> Result<bool> {
        let record = VisitRecord::from_data_id(data_id)?;
        let added = self.registry.insert(record);
        if added {
            self.registry.save()?;
        }
        Ok(added)
    }

    /// Stamp the computed exposure identifier onto a header, for downstream
    /// consumers that only see the metadata.
    pub fn set_exposure_id(&self, metadata: &mut PropertyList, data_id: &DataId) -> Result<()> {
        let id = self.compute_exposure_id(data_id)?;
        metadata.set("Computed_ccdExposureId", id as i64);
        Ok(())
    }

    /// Common raw standardization: wrap the decorated image into an
    /// exposure, with WCS and exposure time pulled from its (repaired)
    /// header and the detector attached.
    fn std_raw(&self, decorated: DecoratedImage, data_id: &DataId) -> Result<Exposure> {
        let wcs = Wcs::from_header(&decorated.metadata)?;
        let exp_time = decorated.metadata.get_float("EXPTIME");
        let DecoratedImage { image, metadata } = decorated;
        let mut exposure = Exposure::from_image(image);
        exposure.metadata = metadata;
        exposure.wcs = Some(wcs);
        if let Some(seconds) = exp_time {
            exposure.calib.set_exp_time(seconds);
        }
        exposure.detector = Some(self.detector_name(data_id));
        Ok(exposure)
    }
}

/// The full key set the registry can match against.
const REGISTRY_KEYS: &[(&str, KeyKind)] = &[
    ("visit", KeyKind::Int),
    ("ccd", KeyKind::Int),
    ("filter", KeyKind::Str),
    ("date", KeyKind::Str),
    ("expTime", KeyKind::Float),
    ("object", KeyKind::Str),
];

impl CameraMapper for MonocamMapper {
    fn tables(&self) -> &MappingTables {
        &self.tables
    }

    fn validate(&self, data_id: &DataId) -> Result<DataId> {
        let mut out = data_id.clone();
        match data_id.get("visit") {
            None | Some(DataIdValue::Int(_)) => {}
            Some(DataIdValue::Str(text)) => {
                let visit = text.trim().parse::<i64>().map_err(|_| {
                    ButlerError::InvalidDataId(format!("visit '{text}' is not numeric"))
                })?;
                out.set("visit", visit);
            }
            Some(DataIdValue::Float(value)) => {
                if value.fract() == 0.0 && value.is_finite() {
                    out.set("visit", *value as i64);
                } else {
                    return Err(ButlerError::InvalidDataId(format!(
                        "visit {value} is not an integer"
                    )));
                }
            }
        }
        Ok(out)
    }

    fn detector_name(&self, _data_id: &DataId) -> String {
        DETECTOR_NAME.to_string()
    }

    fn compute_exposure_id(&self, data_id: &DataId) -> Result<u64> {
        let visit = data_id.int("visit")?;
        if !(0..=MAX_VISIT).contains(&visit) {
            return Err(ButlerError::VisitOutOfRange {
                visit,
                bits: EXPOSURE_ID_BITS,
            });
        }
        Ok(visit as u64)
    }

    fn exposure_id_bits(&self) -> u32 {
        EXPOSURE_ID_BITS
    }

    fn make_camera(&self) -> CameraGeometry {
        monocam_geometry()
    }

    fn read_defects(&self, _data_id: &DataId) -> Result<Vec<Defect>> {
        // No known defect regions yet.
        Ok(Vec::new())
    }

    fn defect_lookup(&self, data_id: &DataId) -> String {
        match data_id.get("visit") {
            Some(visit) => format!("defects-{visit}"),
            None => "defects-unkeyed".to_string(),
        }
    }

    fn read_raw_metadata(&self, location: &Location) -> Result<PropertyList> {
        let path = location.primary()?;
        let mut header = fits::read_primary_header(path)?;
        let wcs = synthesize_wcs(&header)?;
        header.merge(&wcs.to_header());
        debug!(path = %path.display(), "raw header repaired");
        Ok(header)
    }

    fn read_raw(&self, location: &Location, data_id: &DataId) -> Result<Exposure> {
        let metadata = self.read_raw_metadata(location)?;
        let decorated = fits::read_decorated_image_u16(location.primary()?)?;
        let decorated = DecoratedImage::new(decorated.image, metadata);
        self.std_raw(decorated, data_id)
    }

    fn standardize_calib(
        &self,
        dataset: &str,
        item: CalibItem,
        _data_id: &DataId,
    ) -> Result<Exposure> {
        let mapping = self.tables.calibration(dataset)?;
        let declared = mapping.stored.ok_or_else(|| {
            ButlerError::Policy(format!("calibration '{dataset}' has no stored kind"))
        })?;
        match (declared, item) {
            (StoredKind::Image, CalibItem::Image(decorated)) => {
                Ok(Exposure::from_image(decorated.into_image()))
            }
            (StoredKind::MaskedImage, CalibItem::MaskedImage(masked)) => {
                Ok(Exposure::from_masked_image(masked))
            }
            (StoredKind::Exposure, CalibItem::Exposure(exposure)) => Ok(exposure),
            (declared, item) => Err(ButlerError::CalibTypeMismatch {
                dataset: dataset.to_string(),
                declared: declared.to_string(),
                actual: item.kind_name().to_string(),
            }),
        }
    }

    /// Darks are pre-normalized to unit exposure time; the calibration
    /// field is forced regardless of the recorded header value.
    fn std_dark(&self, item: CalibItem, data_id: &DataId) -> Result<Exposure> {
        let mut exposure = self.standardize_calib("dark", item, data_id)?;
        exposure.calib.set_exp_time(1.0);
        Ok(exposure)
    }

    /// Fringe frames standardize under the flat mapping.
    fn std_fringe(&self, item: CalibItem, data_id: &DataId) -> Result<Exposure> {
        self.standardize_calib("flat", item, data_id)
    }
}
