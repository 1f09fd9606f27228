//! Monocam instrument mapper for the butler data-management framework.
//!
//! Monocam is a single-CCD test camera; this crate teaches the butler how to
//! locate, read, and standardize its image files. The host framework owns
//! dataset-type registration, policy grammar, and repository traversal; this
//! plugin supplies the camera-specific pieces through the
//! [`butler_core::mapper::CameraMapper`] contract.

pub mod camera;
pub mod config;
pub mod filters;
pub mod mapper;
pub mod registry;
pub mod wcs_synth;

pub use config::{MapperConfig, PolicyOverrides};
pub use mapper::{MonocamMapper, EXPOSURE_ID_BITS, MAX_VISIT};
