//! World coordinate system in the gnomonic (TAN) convention: reference
//! pixel, sky reference, and a CD matrix giving scale and rotation.

use crate::error::{ButlerError, Result};
use crate::property::PropertyList;

/// A TAN world-coordinate solution.
#[derive(Debug, Clone, PartialEq)]
pub struct Wcs {
    pub ctype1: String,
    pub ctype2: String,
    /// Reference pixel, 1-based per FITS convention.
    pub crpix1: f64,
    pub crpix2: f64,
    /// Sky coordinates at the reference pixel, degrees.
    pub crval1: f64,
    pub crval2: f64,
    /// Linear transform pixel -> degrees.
    pub cd1_1: f64,
    pub cd1_2: f64,
    pub cd2_1: f64,
    pub cd2_2: f64,
    pub radesys: String,
    pub equinox: f64,
}

impl Wcs {
    /// Header cards for this solution, in canonical order.
    pub fn to_header(&self) -> PropertyList {
        let mut pl = PropertyList::new();
        pl.set("CTYPE1", self.ctype1.as_str());
        pl.set("CTYPE2", self.ctype2.as_str());
        pl.set("CRPIX1", self.crpix1);
        pl.set("CRPIX2", self.crpix2);
        pl.set("CRVAL1", self.crval1);
        pl.set("CRVAL2", self.crval2);
        pl.set("CD1_1", self.cd1_1);
        pl.set("CD1_2", self.cd1_2);
        pl.set("CD2_1", self.cd2_1);
        pl.set("CD2_2", self.cd2_2);
        pl.set("RADESYS", self.radesys.as_str());
        pl.set("EQUINOX", self.equinox);
        pl
    }

    /// Read a solution back out of a header.
    pub fn from_header(header: &PropertyList) -> Result<Self> {
        let float = |key: &str| {
            header
                .get_float(key)
                .ok_or_else(|| ButlerError::MissingHeaderKey(key.to_string()))
        };
        let text = |key: &str| {
            header
                .get_str(key)
                .map(str::to_string)
                .ok_or_else(|| ButlerError::MissingHeaderKey(key.to_string()))
        };
        Ok(Self {
            ctype1: text("CTYPE1")?,
            ctype2: text("CTYPE2")?,
            crpix1: float("CRPIX1")?,
            crpix2: float("CRPIX2")?,
            crval1: float("CRVAL1")?,
            crval2: float("CRVAL2")?,
            cd1_1: float("CD1_1")?,
            cd1_2: float("CD1_2")?,
            cd2_1: float("CD2_1")?,
            cd2_2: float("CD2_2")?,
            radesys: text("RADESYS").unwrap_or_else(|_| "ICRS".to_string()),
            equinox: float("EQUINOX").unwrap_or(2000.0),
        })
    }

    /// Mean plate scale in arcsec/pixel, from the CD matrix determinant.
    pub fn pixel_scale_arcsec(&self) -> f64 {
        let det = (self.cd1_1 * self.cd2_2 - self.cd1_2 * self.cd2_1).abs();
        det.sqrt() * 3600.0
    }
}
