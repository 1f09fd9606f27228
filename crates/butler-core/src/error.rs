//! Error types shared by the butler host and instrument mappers.
//!
//! The framework funnels every failure through [`ButlerError`], built with
//! `thiserror` so underlying causes convert via `#[from]` and propagate with
//! the `?` operator.
//!
//! Three broad kinds show up in practice:
//!
//! - **Configuration**: a policy resource that is missing or unparsable, a
//!   calibration entry whose declared representation the code does not
//!   recognise. Fatal at construction or policy load, never recovered.
//! - **Input**: a data identifier carrying a key of the wrong shape, most
//!   commonly a non-numeric `visit`. Surfaced to the caller of the offending
//!   hook.
//! - **I/O**: file and FITS read failures. Wrapped unchanged; there is no
//!   retry policy and no degraded mode.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for results using the framework error type.
pub type Result<T> = std::result::Result<T, ButlerError>;

#[derive(Error, Debug)]
pub enum ButlerError {
    #[error("Policy error: {0}")]
    Policy(String),

    #[error("Policy parse error: {0}")]
    PolicyParse(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FITS error in {path}: {reason}")]
    Fits { path: PathBuf, reason: String },

    #[error("Invalid data identifier: {0}")]
    InvalidDataId(String),

    #[error("Unknown dataset type '{0}'")]
    UnknownDataset(String),

    #[error("Calibration '{dataset}' declared as {declared} but butler read a {actual}")]
    CalibTypeMismatch {
        dataset: String,
        declared: String,
        actual: String,
    },

    #[error("Visit {visit} does not fit in {bits} identifier bits")]
    VisitOutOfRange { visit: i64, bits: u32 },

    #[error("Missing header key '{0}'")]
    MissingHeaderKey(String),

    #[error("Filter '{0}' already defined with different parameters")]
    FilterConflict(String),

    #[error("Location resolves to no paths")]
    EmptyLocation,

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ButlerError::UnknownDataset("biass".to_string());
        assert_eq!(err.to_string(), "Unknown dataset type 'biass'");
    }

    #[test]
    fn test_calib_mismatch_display() {
        let err = ButlerError::CalibTypeMismatch {
            dataset: "flat".into(),
            declared: "Image".into(),
            actual: "Exposure".into(),
        };
        assert!(err.to_string().contains("declared as Image"));
    }
}
