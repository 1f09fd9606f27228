//! Core types and the instrument-mapper contract for the butler framework.
//!
//! The butler proper owns dataset-type registration, policy grammar, and
//! repository traversal; this crate carries the pieces an instrument plugin
//! compiles against:
//!
//! - [`mapper::CameraMapper`]: the explicit hook trait a per-instrument
//!   mapper implements. The host registers implementations and calls hooks
//!   through the trait, never by reflecting on method names.
//! - [`data_id::DataId`] and [`property::PropertyList`]: the transient
//!   identifier and header structures hooks pass around.
//! - [`image`]: the `Image` / `MaskedImage` / `Exposure` container ladder
//!   calibration frames are normalized into.
//! - [`policy`] and [`mapping`]: the dataset-mapping tables a plugin builds
//!   from its policy resource.
//!
//! Everything here is synchronous call-and-return; hooks complete before
//! returning and hold no background state.

pub mod camera_geom;
pub mod data_id;
pub mod error;
pub mod filters;
pub mod fits;
pub mod image;
pub mod mapper;
pub mod mapping;
pub mod policy;
pub mod property;
pub mod wcs;

pub use error::{ButlerError, Result};
