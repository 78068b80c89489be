//! elecpick-io: Volume loading and annotation persistence for elecpick.
//!
//! NIfTI volumes are read with the `nifti` crate and FreeSurfer MGH/MGZ
//! volumes with a small big-endian parser; both are reoriented to RAS axis
//! order and resampled (in parallel via rayon) to the display grid. Device
//! records are stored as one JSON file per device; legacy `.mat` records
//! are imported on first load.
//!

pub mod config;
mod error;
pub mod loader;
mod matfile;
pub mod mgh;
pub mod orient;
pub mod resample;
pub mod store;

pub use config::LoaderConfig;
pub use error::{Error, Result};
pub use loader::{
    find_volume, header_affine, load_subject, prepare_volumes, read_nifti, read_volume,
    RawVolume, SubjectVolumes,
};
pub use mgh::read_mgh;
pub use orient::{to_ras, Orientation};
pub use resample::{resample, threshold};
pub use store::{DeviceRecord, JsonFileStore};
