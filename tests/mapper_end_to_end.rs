//! End-to-end tests: construct the mapper against a temporary repository,
//! fabricate raw and calibration frames on disk, and drive the hooks the
//! butler would call.

use anyhow::Result;
use tempfile::TempDir;

use butler_core::data_id::DataId;
use butler_core::fits;
use butler_core::image::{Image, PixelBuffer};
use butler_core::mapper::{CalibItem, CameraMapper};
use butler_core::property::PropertyList;

use obs_monocam::registry::REGISTRY_FILE;
use obs_monocam::{MapperConfig, MonocamMapper};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("obs_monocam=debug,butler_core=debug")
        .with_test_writer()
        .try_init();
}

fn new_mapper(dir: &TempDir) -> MonocamMapper {
    MonocamMapper::new(None, MapperConfig::new(dir.path())).unwrap()
}

/// Write a 8x6 raw frame for `visit` at the mapper's resolved location.
fn fabricate_raw(mapper: &MonocamMapper, visit: i64) -> butler_core::mapper::Location {
    let id = DataId::new().with("visit", visit);
    let location = mapper.location_for("raw", &id).unwrap();
    let path = location.primary().unwrap();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();

    let pixels: Vec<u16> = (0..48).map(|v| (v * 100) as u16).collect();
    let image = Image::new(8, 6, PixelBuffer::U16(pixels)).unwrap();
    let mut header = PropertyList::new();
    header.set("EXPTIME", 30.0);
    header.set("FILTER", "r");
    header.set("RA", 180.25);
    header.set("DEC", -30.5);
    // A stale solution the repair must overwrite.
    header.set("CRVAL1", 999.0);
    fits::write_simple_u16(path, &image, &header).unwrap();
    location
}

#[test]
fn test_construction_populates_filters_and_registry() -> Result<()> {
    init_logging();
    let dir = TempDir::new()?;
    let mapper = new_mapper(&dir);

    for name in ["u", "g", "r", "i", "z", "y", "NONE"] {
        assert!(mapper.filter_catalog().contains(name), "missing {name}");
    }
    assert_eq!(
        mapper.filter_catalog().get("y").map(|d| d.wavelength_nm),
        Some(971.68)
    );
    assert_eq!(mapper.filter_id("r"), Some(2));
    assert!(dir.path().join(REGISTRY_FILE).exists());
    Ok(())
}

#[test]
fn test_raw_metadata_carries_synthesized_wcs() -> Result<()> {
    init_logging();
    let dir = TempDir::new()?;
    let mapper = new_mapper(&dir);
    let location = fabricate_raw(&mapper, 42);

    let header = mapper.read_raw_metadata(&location)?;
    for key in [
        "CTYPE1", "CTYPE2", "CRPIX1", "CRPIX2", "CRVAL1", "CRVAL2", "CD1_1", "CD1_2", "CD2_1",
        "CD2_2", "RADESYS", "EQUINOX",
    ] {
        assert!(header.contains(key), "missing {key}");
    }
    // Synthesized values win over the stale card in the file.
    assert_eq!(header.get_float("CRVAL1"), Some(180.25));
    assert_eq!(header.get_float("CRVAL2"), Some(-30.5));
    assert_eq!(header.get_str("CTYPE1"), Some("RA---TAN"));
    // Frame-center anchor for an 8-pixel axis.
    assert_eq!(header.get_float("CRPIX1"), Some(4.5));
    // Untouched original cards survive.
    assert_eq!(header.get_str("FILTER"), Some("r"));
    Ok(())
}

#[test]
fn test_read_raw_standardizes_to_exposure() -> Result<()> {
    init_logging();
    let dir = TempDir::new()?;
    let mapper = new_mapper(&dir);
    let id = DataId::new().with("visit", 42);
    let location = fabricate_raw(&mapper, 42);

    let exposure = mapper.read_raw(&location, &id)?;
    assert_eq!(exposure.width(), 8);
    assert_eq!(exposure.height(), 6);
    assert_eq!(exposure.calib.exp_time(), Some(30.0));
    assert_eq!(exposure.detector.as_deref(), Some("0"));
    let wcs = exposure.wcs.as_ref().unwrap();
    assert_eq!(wcs.crval1, 180.25);
    Ok(())
}

#[test]
fn test_raw_amp_is_an_alias_for_raw() -> Result<()> {
    let dir = TempDir::new()?;
    let mapper = new_mapper(&dir);
    let id = DataId::new().with("visit", 7);
    let raw = mapper.location_for("raw", &id)?;
    let amp = mapper.location_for("raw_amp", &id)?;
    assert_eq!(raw.primary()?, amp.primary()?);

    fabricate_raw(&mapper, 7);
    let full = mapper.read_raw(&raw, &id)?;
    let segmented = mapper.read_raw(&amp, &id)?;
    assert_eq!(full, segmented);
    Ok(())
}

#[test]
fn test_calibration_read_and_standardize() -> Result<()> {
    let dir = TempDir::new()?;
    let mapper = new_mapper(&dir);
    let id = DataId::new().with("ccd", 0).with("filter", "r");

    // Darks live on disk as plain images with a recorded exposure time.
    let location = mapper.location_for("dark", &id)?;
    let path = location.primary()?;
    std::fs::create_dir_all(path.parent().unwrap())?;
    let image = Image::new(4, 4, PixelBuffer::U16(vec![100; 16])).unwrap();
    let mut header = PropertyList::new();
    header.set("EXPTIME", 600.0);
    fits::write_simple_u16(path, &image, &header)?;

    let decorated = fits::read_decorated_image_u16(path)?;
    let exposure = mapper.std_dark(CalibItem::Image(decorated), &id)?;
    // Pre-normalized to unit exposure time, whatever the header said.
    assert_eq!(exposure.calib.exp_time(), Some(1.0));
    assert_eq!(exposure.width(), 4);
    Ok(())
}

#[test]
fn test_validate_then_compute_id_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let mapper = new_mapper(&dir);
    let id = DataId::new().with("visit", "1234").with("filter", "r");
    let validated = mapper.validate(&id)?;
    assert_eq!(mapper.compute_exposure_id(&validated)?, 1234);
    Ok(())
}

#[test]
fn test_register_visit_persists_across_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let mut mapper = new_mapper(&dir);
    let id = DataId::new()
        .with("visit", 55)
        .with("filter", "g")
        .with("expTime", 15.0)
        .with("object", "SA110");
    assert!(mapper.register_visit(&id)?);
    assert!(!mapper.register_visit(&id)?);

    let reopened = new_mapper(&dir);
    let record = reopened.registry().lookup(55).unwrap();
    assert_eq!(record.filter.as_deref(), Some("g"));
    assert_eq!(record.object.as_deref(), Some("SA110"));
    Ok(())
}
