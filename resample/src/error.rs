//! Error types for the fallible, non-streaming parts of the crate.
//!
//! The streaming path (`Resampler::process`) never fails. Building the
//! filter can, and so can preference files, translation catalogs and the
//! process-wide preset name table.

use thiserror::Error;

/// Errors returned by construction, preference, catalog and name-table
/// operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("resample: io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("resample: yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("resample: filter construction failed: {0}")]
    Construction(#[from] rubato::ResamplerConstructionError),

    #[error("resample: preset names already installed")]
    NamesInstalled,

    #[error("resample: cannot determine config directory")]
    NoConfigDir,
}

/// Result type for fallible resample operations.
pub type Result<T> = std::result::Result<T, Error>;
