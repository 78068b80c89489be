//! Error types for elecpick-core.

use thiserror::Error;

/// Result type alias for elecpick operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the annotation session.
#[derive(Error, Debug)]
pub enum Error {
    /// Two volumes that must be co-registered have different shapes.
    #[error("volume shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: [usize; 3],
        right: [usize; 3],
    },

    /// Requested slice index lies outside the volume.
    #[error("slice {index} out of range for axis of length {len}")]
    SliceOutOfRange { index: usize, len: usize },

    /// The vox2ras matrix cannot be inverted.
    #[error("affine transform is singular")]
    SingularAffine,

    /// Device names must be non-empty and usable as a file stem.
    #[error("invalid device name: {0:?}")]
    InvalidDeviceName(String),

    /// Device id does not belong to this registry.
    #[error("unknown device id: {0}")]
    UnknownDevice(usize),

    /// Undo requested with nothing to undo.
    #[error("no annotation to remove")]
    NoAnnotationToRemove,

    /// Annotation requested before a device was named.
    #[error("no device selected")]
    NoDeviceSelected,

    /// The annotation store failed to load or save.
    #[error("storage error: {0}")]
    Storage(String),
}
