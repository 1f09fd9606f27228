//! Camera geometry descriptors: pure data, built in memory by a mapper's
//! `make_camera` hook.

/// One detector in the focal plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Detector {
    pub name: String,
    /// Sensor width in pixels.
    pub width: u32,
    /// Sensor height in pixels.
    pub height: u32,
    pub pixel_size_um: f64,
}

/// A camera: a named collection of detectors.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraGeometry {
    pub name: String,
    pub detectors: Vec<Detector>,
}

impl CameraGeometry {
    pub fn detector(&self, name: &str) -> Option<&Detector> {
        self.detectors.iter().find(|d| d.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_lookup() {
        let camera = CameraGeometry {
            name: "test".into(),
            detectors: vec![Detector {
                name: "0".into(),
                width: 16,
                height: 16,
                pixel_size_um: 10.0,
            }],
        };
        assert!(camera.detector("0").is_some());
        assert!(camera.detector("1").is_none());
    }
}
