//! Conversion between display voxel coordinates and surface RAS.
//!
//! The viewer stores volumes in (sagittal, coronal, axial) order with the
//! first and last axes running opposite to the scanner's column/slice
//! convention. Converting to anatomical space therefore reindexes the
//! display voxel before applying the vox2ras affine:
//!
//! ```text
//! (s, c, a) -> (Sx - s, Sz - a, c, 1) -> affine -> (x, y, z)
//! ```
#![allow(clippy::cast_precision_loss)]

use crate::error::{Error, Result};

/// Row-major homogeneous 4x4 matrix.
pub type Affine = [[f64; 4]; 4];

/// FreeSurfer tkregister vox2ras for a conformed 256³ volume.
pub const SURFACE_RAS_VOX2RAS: Affine = [
    [-1.0, 0.0, 0.0, 128.0],
    [0.0, 0.0, 1.0, -128.0],
    [0.0, -1.0, 0.0, 128.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Bidirectional voxel <-> anatomical transform for a fixed volume shape.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelTransform {
    affine: Affine,
    inverse: Affine,
    shape: [f64; 3],
}

impl VoxelTransform {
    /// Create a transform from an affine and the display volume shape.
    ///
    /// # Errors
    /// Returns [`Error::SingularAffine`] if the affine has no inverse.
    pub fn new(affine: Affine, shape: [usize; 3]) -> Result<Self> {
        let inverse = invert(&affine).ok_or(Error::SingularAffine)?;
        Ok(Self {
            affine,
            inverse,
            shape: shape.map(|n| n as f64),
        })
    }

    /// Surface RAS transform (see [`SURFACE_RAS_VOX2RAS`]).
    #[must_use]
    pub fn surface_ras(shape: [usize; 3]) -> Self {
        Self {
            affine: SURFACE_RAS_VOX2RAS,
            inverse: [
                [-1.0, 0.0, 0.0, 128.0],
                [0.0, 0.0, -1.0, 128.0],
                [0.0, 1.0, 0.0, 128.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
            shape: shape.map(|n| n as f64),
        }
    }

    /// The forward affine.
    #[must_use]
    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    /// Display voxel coordinate to anatomical coordinate.
    #[must_use]
    pub fn to_anatomical(&self, voxel: [f64; 3]) -> [f64; 3] {
        let [sx, _, sz] = self.shape;
        let crs = [sx - voxel[0], sz - voxel[2], voxel[1], 1.0];
        let out = apply(&self.affine, crs);
        [out[0], out[1], out[2]]
    }

    /// Anatomical coordinate to display voxel coordinate.
    ///
    /// Exact inverse of [`VoxelTransform::to_anatomical`].
    #[must_use]
    pub fn to_voxel(&self, anatomical: [f64; 3]) -> [f64; 3] {
        let [sx, _, sz] = self.shape;
        let crs = apply(
            &self.inverse,
            [anatomical[0], anatomical[1], anatomical[2], 1.0],
        );
        [sx - crs[0], crs[2], sz - crs[1]]
    }
}

fn apply(m: &Affine, v: [f64; 4]) -> [f64; 4] {
    let mut out = [0.0; 4];
    for (row, o) in m.iter().zip(out.iter_mut()) {
        *o = row.iter().zip(v.iter()).map(|(a, b)| a * b).sum();
    }
    out
}

/// Gauss-Jordan inversion with partial pivoting.
fn invert(m: &Affine) -> Option<Affine> {
    let mut a = *m;
    let mut inv = [[0.0; 4]; 4];
    for (i, row) in inv.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    for col in 0..4 {
        let pivot = (col..4).max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        inv.swap(col, pivot);

        let p = a[col][col];
        for k in 0..4 {
            a[col][k] /= p;
            inv[col][k] /= p;
        }
        for row in 0..4 {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for k in 0..4 {
                a[row][k] -= factor * a[col][k];
                inv[row][k] -= factor * inv[col][k];
            }
        }
    }
    Some(inv)
}
