//! I/O error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// NIfTI header or payload could not be read.
    #[error("NIfTI error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// Annotation record could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// None of the candidate files for a volume exist.
    #[error("no {kind} volume found under {}", dir.display())]
    MissingVolume { kind: &'static str, dir: PathBuf },

    /// A record exists for a device name differing only in letter case.
    /// Such names share one file on case-insensitive filesystems.
    #[error("device {device:?} collides with existing record {}", existing.display())]
    NameCollision { device: String, existing: PathBuf },

    /// Invalid file format.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] elecpick_core::Error),
}

impl From<Error> for elecpick_core::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Core(inner) => inner,
            other => elecpick_core::Error::Storage(other.to_string()),
        }
    }
}
