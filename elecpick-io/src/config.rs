//! Subject directory layout and loading parameters.

use std::path::{Path, PathBuf};

/// Where to find a subject's volumes and how to prepare them.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Shape both volumes are resampled to.
    pub target_shape: [usize; 3],
    /// CT intensities below this become NaN.
    pub ct_threshold: f32,
    /// MRI paths relative to the subject directory, tried in order.
    pub mri_candidates: Vec<PathBuf>,
    /// CT paths relative to the subject directory, tried in order.
    pub ct_candidates: Vec<PathBuf>,
    /// Directory (relative to the subject) holding per-device records.
    pub annotation_dir: PathBuf,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            target_shape: [256, 256, 256],
            ct_threshold: 1000.0,
            mri_candidates: [
                "mri/brain.mgz",
                "mri/brain.nii.gz",
                "mri/brain.nii",
                "mri/T1.nii.gz",
                "mri/T1.nii",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
            ct_candidates: ["CT/rCT.nii", "CT/rCT.nii.gz"]
                .iter()
                .map(PathBuf::from)
                .collect(),
            annotation_dir: PathBuf::from("elecs"),
        }
    }
}

impl LoaderConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resampling target shape.
    #[must_use]
    pub fn with_target_shape(mut self, shape: [usize; 3]) -> Self {
        self.target_shape = shape;
        self
    }

    /// Set the CT threshold.
    #[must_use]
    pub fn with_ct_threshold(mut self, threshold: f32) -> Self {
        self.ct_threshold = threshold;
        self
    }

    /// Replace the MRI candidate list.
    #[must_use]
    pub fn with_mri_candidates<P: Into<PathBuf>>(mut self, paths: impl IntoIterator<Item = P>) -> Self {
        self.mri_candidates = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the CT candidate list.
    #[must_use]
    pub fn with_ct_candidates<P: Into<PathBuf>>(mut self, paths: impl IntoIterator<Item = P>) -> Self {
        self.ct_candidates = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Absolute annotation directory for `subject_dir`.
    #[must_use]
    pub fn annotation_path(&self, subject_dir: &Path) -> PathBuf {
        subject_dir.join(&self.annotation_dir)
    }
}
