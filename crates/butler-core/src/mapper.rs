//! The instrument-mapper contract.
//!
//! Each supported camera ships a type implementing [`CameraMapper`]; the
//! host registers it under the camera's name and calls hooks through the
//! trait. This replaces discovering hook methods by naming convention: the
//! compiler enforces that every hook exists and has the right shape.

use std::path::{Path, PathBuf};

use crate::camera_geom::CameraGeometry;
use crate::data_id::DataId;
use crate::error::{ButlerError, Result};
use crate::image::{DecoratedImage, Exposure, MaskedImage};
use crate::mapping::MappingTables;
use crate::property::PropertyList;

/// An opaque handle resolving a dataset request to one or more file paths.
/// Supplied by the host's repository traversal; read-only to mappers.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    paths: Vec<PathBuf>,
}

impl Location {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
        }
    }

    /// The first resolved path; errors if resolution produced none.
    pub fn primary(&self) -> Result<&Path> {
        self.paths
            .first()
            .map(PathBuf::as_path)
            .ok_or(ButlerError::EmptyLocation)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

/// A calibration frame as the butler actually read it off disk.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibItem {
    Image(DecoratedImage),
    MaskedImage(MaskedImage),
    Exposure(Exposure),
}

impl CalibItem {
    pub fn kind_name(&self) -> &'static str {
        match self {
            CalibItem::Image(_) => "Image",
            CalibItem::MaskedImage(_) => "MaskedImage",
            CalibItem::Exposure(_) => "Exposure",
        }
    }
}

/// A rectangular bad region on a detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defect {
    pub x0: u32,
    pub y0: u32,
    pub width: u32,
    pub height: u32,
}

/// The hooks a per-instrument mapper must satisfy.
///
/// All hooks are synchronous call-and-return; the host invokes them on
/// demand and every failure propagates to the caller of the current request.
pub trait CameraMapper {
    /// Dataset and calibration mapping tables built from the policy resource.
    fn tables(&self) -> &MappingTables;

    /// Validate and normalize a data identifier. Pure and idempotent; the
    /// input is not mutated.
    fn validate(&self, data_id: &DataId) -> Result<DataId>;

    /// Name of the detector a data identifier refers to.
    fn detector_name(&self, data_id: &DataId) -> String;

    /// The 64-bit identifier for a CCD exposure.
    fn compute_exposure_id(&self, data_id: &DataId) -> Result<u64>;

    /// Number of bits the exposure identifier occupies. Must stay consistent
    /// with the largest identifier `compute_exposure_id` can produce, or
    /// packed identifiers collide silently.
    fn exposure_id_bits(&self) -> u32;

    /// Camera geometry descriptor; in-memory construction only.
    fn make_camera(&self) -> CameraGeometry;

    /// Known defect regions for this identifier.
    fn read_defects(&self, data_id: &DataId) -> Result<Vec<Defect>>;

    /// Cache key the host's defect layer uses for this identifier.
    fn defect_lookup(&self, data_id: &DataId) -> String;

    /// Read the primary header of a raw frame, repaired as the instrument
    /// requires.
    fn read_raw_metadata(&self, location: &Location) -> Result<PropertyList>;

    /// Read and standardize a raw frame.
    fn read_raw(&self, location: &Location, data_id: &DataId) -> Result<Exposure>;

    /// Normalize a calibration frame into the common `Exposure` shape.
    fn standardize_calib(
        &self,
        dataset: &str,
        item: CalibItem,
        data_id: &DataId,
    ) -> Result<Exposure>;

    /// Standardize a bias frame.
    fn std_bias(&self, item: CalibItem, data_id: &DataId) -> Result<Exposure> {
        self.standardize_calib("bias", item, data_id)
    }

    /// Standardize a dark frame. Instruments that store darks normalized to
    /// unit exposure time override this to force the calibration field.
    fn std_dark(&self, item: CalibItem, data_id: &DataId) -> Result<Exposure> {
        self.standardize_calib("dark", item, data_id)
    }

    /// Standardize a flat frame.
    fn std_flat(&self, item: CalibItem, data_id: &DataId) -> Result<Exposure> {
        self.standardize_calib("flat", item, data_id)
    }

    /// Standardize a fringe frame.
    fn std_fringe(&self, item: CalibItem, data_id: &DataId) -> Result<Exposure> {
        self.standardize_calib("fringe", item, data_id)
    }
}
