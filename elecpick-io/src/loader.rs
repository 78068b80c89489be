//! Subject volume loading.
//!
//! Reads the MRI and CT of a subject directory, brings both to RAS axis
//! order, resamples them to a common grid and thresholds the CT.

use std::path::{Path, PathBuf};

use elecpick_core::{Affine, VolumeStore};
use log::{debug, info};
use ndarray::Array3;
use nifti::volume::ndarray::IntoNdArray;
use nifti::{NiftiHeader, NiftiObject, ReaderOptions};

use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::mgh::read_mgh;
use crate::orient;
use crate::resample::{resample, threshold};

/// A volume as stored on disk.
#[derive(Debug, Clone)]
pub struct RawVolume {
    pub data: Array3<f32>,
    /// Voxel to scanner (RAS) transform.
    pub affine: Affine,
}

/// Both volumes of a subject, oriented, resampled and ready for display.
#[derive(Debug, Clone)]
pub struct SubjectVolumes {
    pub mri: Array3<f32>,
    /// CT with sub-threshold voxels set to NaN.
    pub ct: Array3<f32>,
    /// MRI affine after reorientation (before resampling).
    pub mri_affine: Affine,
    /// CT affine after reorientation (before resampling).
    pub ct_affine: Affine,
}

impl SubjectVolumes {
    /// Move the volumes into a [`VolumeStore`].
    ///
    /// # Errors
    /// Returns a core error if the shapes differ.
    pub fn into_store(self) -> Result<VolumeStore> {
        Ok(VolumeStore::new(self.mri, self.ct)?)
    }
}

/// Vox2ras affine from a NIfTI header: sform if set, else qform, else plain
/// voxel scaling.
#[must_use]
pub fn header_affine(header: &NiftiHeader) -> Affine {
    let f = f64::from;
    if header.sform_code > 0 {
        let row = |r: &[f32; 4]| [f(r[0]), f(r[1]), f(r[2]), f(r[3])];
        return [
            row(&header.srow_x),
            row(&header.srow_y),
            row(&header.srow_z),
            [0.0, 0.0, 0.0, 1.0],
        ];
    }

    let [dx, dy, dz] = [1, 2, 3].map(|i| {
        let d = f(header.pixdim[i]);
        if d > 0.0 {
            d
        } else {
            1.0
        }
    });
    if header.qform_code > 0 {
        let (b, c, d) = (f(header.quatern_b), f(header.quatern_c), f(header.quatern_d));
        let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
        let qfac = if header.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
        let r = [
            [
                a * a + b * b - c * c - d * d,
                2.0 * (b * c - a * d),
                2.0 * (b * d + a * c),
            ],
            [
                2.0 * (b * c + a * d),
                a * a + c * c - b * b - d * d,
                2.0 * (c * d - a * b),
            ],
            [
                2.0 * (b * d - a * c),
                2.0 * (c * d + a * b),
                a * a + d * d - b * b - c * c,
            ],
        ];
        let scale = [dx, dy, dz * qfac];
        let offset = [
            f(header.quatern_x),
            f(header.quatern_y),
            f(header.quatern_z),
        ];
        let mut out = [[0.0; 4]; 4];
        for i in 0..3 {
            for j in 0..3 {
                out[i][j] = r[i][j] * scale[j];
            }
            out[i][3] = offset[i];
        }
        out[3][3] = 1.0;
        return out;
    }

    [
        [dx, 0.0, 0.0, 0.0],
        [0.0, dy, 0.0, 0.0],
        [0.0, 0.0, dz, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Read a `.nii` or `.nii.gz` file.
///
/// Intensity scaling from the header is applied. For 4D files only the
/// first volume is kept.
///
/// # Errors
/// Returns [`Error::Nifti`] if the file cannot be parsed, or
/// [`Error::InvalidFormat`] for volumes with fewer than three dimensions.
pub fn read_nifti(path: &Path) -> Result<RawVolume> {
    let obj = ReaderOptions::new().read_file(path)?;
    let affine = header_affine(obj.header());
    let array = obj.into_volume().into_ndarray::<f32>()?;

    let shape = array.shape().to_vec();
    if shape.len() < 3 || shape[..3].contains(&0) {
        return Err(Error::InvalidFormat(format!(
            "{}: expected a 3D volume, got shape {shape:?}",
            path.display()
        )));
    }
    // Logical iteration runs the trailing axes fastest, so stepping over them
    // keeps the first volume.
    let extra: usize = shape[3..].iter().product();
    let values: Vec<f32> = array.iter().step_by(extra.max(1)).copied().collect();
    let data = Array3::from_shape_vec((shape[0], shape[1], shape[2]), values)
        .map_err(|e| Error::InvalidFormat(format!("{}: {e}", path.display())))?;

    debug!("Read {} with shape {shape:?}", path.display());
    Ok(RawVolume { data, affine })
}

/// Read a volume, choosing the format from the file extension: `.mgz` and
/// `.mgh` are FreeSurfer volumes, anything else is NIfTI.
///
/// # Errors
/// Returns the reader's error.
pub fn read_volume(path: &Path) -> Result<RawVolume> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("mgz" | "mgh") => read_mgh(path),
        _ => read_nifti(path),
    }
}

/// First candidate path that exists under `dir`.
///
/// # Errors
/// Returns [`Error::MissingVolume`] if none exist.
pub fn find_volume(dir: &Path, candidates: &[PathBuf], kind: &'static str) -> Result<PathBuf> {
    candidates
        .iter()
        .map(|c| dir.join(c))
        .find(|p| p.is_file())
        .ok_or_else(|| Error::MissingVolume {
            kind,
            dir: dir.to_path_buf(),
        })
}

/// Reorient, resample and (for the CT) threshold two raw volumes.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] if either affine is degenerate or a
/// volume cannot be resampled to the target shape.
pub fn prepare_volumes(mri: RawVolume, ct: RawVolume, config: &LoaderConfig) -> Result<SubjectVolumes> {
    let (mri_data, mri_affine) = orient::to_ras(mri.data, &mri.affine)?;
    let (ct_data, ct_affine) = orient::to_ras(ct.data, &ct.affine)?;

    let (mri_data, ct_data) = rayon::join(
        || resample(mri_data, config.target_shape),
        || resample(ct_data, config.target_shape),
    );
    let (mri_data, mut ct_data) = (mri_data?, ct_data?);
    threshold(&mut ct_data, config.ct_threshold);

    Ok(SubjectVolumes {
        mri: mri_data,
        ct: ct_data,
        mri_affine,
        ct_affine,
    })
}

/// Load the MRI and CT of `subject_dir`.
///
/// # Errors
/// Missing or unreadable volumes are reported as errors; there is no
/// fallback.
pub fn load_subject(subject_dir: &Path, config: &LoaderConfig) -> Result<SubjectVolumes> {
    let mri_path = find_volume(subject_dir, &config.mri_candidates, "MRI")?;
    let ct_path = find_volume(subject_dir, &config.ct_candidates, "CT")?;
    info!("Loading MRI from {}", mri_path.display());
    let mri = read_volume(&mri_path)?;
    info!("Loading CT from {}", ct_path.display());
    let ct = read_volume(&ct_path)?;

    let volumes = prepare_volumes(mri, ct, config)?;
    let kept = volumes.ct.iter().filter(|v| !v.is_nan()).count();
    info!(
        "Subject ready: {:?} voxels, {kept} CT voxels above {}",
        volumes.mri.dim(),
        config.ct_threshold
    );
    Ok(volumes)
}
