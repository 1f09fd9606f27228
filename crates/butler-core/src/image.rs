//! Pixel-data containers of increasing richness:
//! `Image` ⊂ `MaskedImage` ⊂ `Exposure`.
//!
//! Raw camera frames arrive as 16-bit unsigned images; calibration products
//! may be stored on disk in any rung of the ladder and are normalized to
//! `Exposure` before handing back to the host (see
//! [`crate::mapper::CameraMapper::standardize_calib`]).

use std::borrow::Cow;

use crate::error::{ButlerError, Result};
use crate::property::PropertyList;
use crate::wcs::Wcs;

/// Maximum supported width/height for frames.
pub const MAX_FRAME_DIMENSION: u32 = 65_536;

/// Pixel storage in the sensor's native format.
///
/// The camera reads out 16-bit unsigned integers; computed planes (variance)
/// use `F32`. Keeping native formats avoids an 8 MB u16 frame ballooning to
/// 32 MB of f64 on every read.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    /// 16-bit unsigned integer pixels (2 bytes/pixel)
    U16(Vec<u16>),
    /// 32-bit floating point pixels (4 bytes/pixel)
    F32(Vec<f32>),
}

impl PixelBuffer {
    pub fn len(&self) -> usize {
        match self {
            PixelBuffer::U16(data) => data.len(),
            PixelBuffer::F32(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pixel data as f32, zero-copy for the `F32` variant.
    pub fn as_f32(&self) -> Cow<'_, [f32]> {
        match self {
            PixelBuffer::U16(data) => Cow::Owned(data.iter().map(|&v| f32::from(v)).collect()),
            PixelBuffer::F32(data) => Cow::Borrowed(data),
        }
    }
}

/// Validate frame dimensions against the pixel count actually supplied.
fn validate_frame(width: u32, height: u32, pixels: usize) -> Result<()> {
    if width > MAX_FRAME_DIMENSION || height > MAX_FRAME_DIMENSION {
        return Err(ButlerError::InvalidDataId(format!(
            "frame dimensions {width}x{height} exceed {MAX_FRAME_DIMENSION}"
        )));
    }
    let expected = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| ButlerError::InvalidDataId("frame pixel count overflow".to_string()))?;
    if expected != pixels {
        return Err(ButlerError::InvalidDataId(format!(
            "frame {width}x{height} expects {expected} pixels, got {pixels}"
        )));
    }
    Ok(())
}

/// A plain pixel array with dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: PixelBuffer,
}

impl Image {
    pub fn new(width: u32, height: u32, pixels: PixelBuffer) -> Result<Self> {
        validate_frame(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }
}

/// An image decorated with the header it was read with.
///
/// Raw frames come off disk in this shape; the mapper repairs the header
/// before standardizing.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoratedImage {
    pub image: Image,
    pub metadata: PropertyList,
}

impl DecoratedImage {
    pub fn new(image: Image, metadata: PropertyList) -> Self {
        Self { image, metadata }
    }

    /// Strip the decoration.
    pub fn into_image(self) -> Image {
        self.image
    }
}

/// Image plus mask and variance planes.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedImage {
    pub image: Image,
    pub mask: Vec<u16>,
    pub variance: Vec<f32>,
}

impl MaskedImage {
    /// Wrap a plain image; mask and variance start zeroed.
    pub fn from_image(image: Image) -> Self {
        let n = image.pixels.len();
        Self {
            image,
            mask: vec![0; n],
            variance: vec![0.0; n],
        }
    }
}

/// Photometric calibration attached to an exposure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Calib {
    exp_time: Option<f64>,
}

impl Calib {
    pub fn exp_time(&self) -> Option<f64> {
        self.exp_time
    }

    pub fn set_exp_time(&mut self, seconds: f64) {
        self.exp_time = Some(seconds);
    }
}

/// The common representation used downstream: masked image, header, optional
/// world coordinate system, calibration, and the detector it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Exposure {
    pub masked: MaskedImage,
    pub metadata: PropertyList,
    pub wcs: Option<Wcs>,
    pub calib: Calib,
    pub detector: Option<String>,
}

impl Exposure {
    pub fn from_masked_image(masked: MaskedImage) -> Self {
        Self {
            masked,
            metadata: PropertyList::new(),
            wcs: None,
            calib: Calib::default(),
            detector: None,
        }
    }

    pub fn from_image(image: Image) -> Self {
        Self::from_masked_image(MaskedImage::from_image(image))
    }

    pub fn width(&self) -> u32 {
        self.masked.image.width()
    }

    pub fn height(&self) -> u32 {
        self.masked.image.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_3x2() -> Image {
        Image::new(3, 2, PixelBuffer::U16(vec![1, 2, 3, 4, 5, 6])).unwrap()
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let result = Image::new(3, 3, PixelBuffer::U16(vec![0; 6]));
        assert!(result.is_err());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let result = Image::new(MAX_FRAME_DIMENSION + 1, 1, PixelBuffer::U16(Vec::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_masked_image_zero_fills_planes() {
        let masked = MaskedImage::from_image(image_3x2());
        assert_eq!(masked.mask, vec![0; 6]);
        assert_eq!(masked.variance, vec![0.0; 6]);
    }

    #[test]
    fn test_exposure_ladder() {
        let exposure = Exposure::from_image(image_3x2());
        assert_eq!(exposure.width(), 3);
        assert_eq!(exposure.height(), 2);
        assert!(exposure.wcs.is_none());
        assert!(exposure.calib.exp_time().is_none());
    }

    #[test]
    fn test_pixel_buffer_as_f32() {
        let buf = PixelBuffer::U16(vec![0, 65535]);
        assert_eq!(buf.as_f32().as_ref(), &[0.0, 65535.0]);
        let buf = PixelBuffer::F32(vec![1.5]);
        assert!(matches!(buf.as_f32(), Cow::Borrowed(_)));
    }
}
