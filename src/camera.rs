//! Monocam camera geometry: one 4k x 4k CCD.

use butler_core::camera_geom::{CameraGeometry, Detector};

/// The single detector's name. Identifier derivation and exposure
/// standardization both hang off this constant.
pub const DETECTOR_NAME: &str = "0";

/// Fixed geometry descriptor for the instrument. No I/O, no parameters.
pub fn monocam_geometry() -> CameraGeometry {
    CameraGeometry {
        name: "monocam".to_string(),
        detectors: vec![Detector {
            name: DETECTOR_NAME.to_string(),
            width: 4096,
            height: 4096,
            pixel_size_um: 10.0,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_detector() {
        let camera = monocam_geometry();
        assert_eq!(camera.name, "monocam");
        assert_eq!(camera.detectors.len(), 1);
        assert!(camera.detector(DETECTOR_NAME).is_some());
    }
}
