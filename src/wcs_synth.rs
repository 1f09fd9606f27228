//! Synthetic world-coordinate solutions for raw frames.
//!
//! The camera's acquisition software writes no WCS keys, so raw headers are
//! repaired at read time with a gnomonic solution anchored at the frame
//! center. Pointing comes from numeric `RA`/`DEC` header cards when present
//! and falls back to the origin; the plate scale likewise comes from
//! `PIXSCALE` (arcsec/pixel) with a 1.0 default.

use butler_core::error::{ButlerError, Result};
use butler_core::property::PropertyList;
use butler_core::wcs::Wcs;

/// Build a TAN solution from an existing raw header.
///
/// Requires `NAXIS1`/`NAXIS2`; everything else has a fallback.
pub fn synthesize_wcs(header: &PropertyList) -> Result<Wcs> {
    let naxis1 = header
        .get_int("NAXIS1")
        .ok_or_else(|| ButlerError::MissingHeaderKey("NAXIS1".to_string()))?;
    let naxis2 = header
        .get_int("NAXIS2")
        .ok_or_else(|| ButlerError::MissingHeaderKey("NAXIS2".to_string()))?;

    let crval1 = header.get_float("RA").unwrap_or(0.0);
    let crval2 = header.get_float("DEC").unwrap_or(0.0);
    let scale_arcsec = header.get_float("PIXSCALE").unwrap_or(1.0);
    let scale_deg = scale_arcsec / 3600.0;

    Ok(Wcs {
        ctype1: "RA---TAN".to_string(),
        ctype2: "DEC--TAN".to_string(),
        // FITS pixels are 1-based; the center of an N-pixel axis is (N+1)/2.
        crpix1: 0.5 * (naxis1 as f64 + 1.0),
        crpix2: 0.5 * (naxis2 as f64 + 1.0),
        crval1,
        crval2,
        cd1_1: -scale_deg,
        cd1_2: 0.0,
        cd2_1: 0.0,
        cd2_2: scale_deg,
        radesys: "ICRS".to_string(),
        equinox: 2000.0,
    })
}
