//! Reorientation of voxel arrays to RAS axis order.
//!
//! Each stored axis is matched to the anatomical axis its affine column
//! points along most strongly. The array is then permuted and flipped so
//! that axis 0 runs toward Right, axis 1 toward Anterior and axis 2 toward
//! Superior.
#![allow(clippy::cast_precision_loss)]

use elecpick_core::Affine;
use ndarray::{Array3, Axis};

use crate::error::{Error, Result};

/// Axis permutation and flips that bring a volume to RAS order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orientation {
    /// `source[r]` is the stored axis that becomes output axis `r`.
    source: [usize; 3],
    /// Whether output axis `r` runs against its stored axis.
    flip: [bool; 3],
}

impl Orientation {
    /// Derive the orientation from a vox2ras affine.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] if the rotation part cannot be matched
    /// to three distinct anatomical axes.
    pub fn from_affine(affine: &Affine) -> Result<Self> {
        let mut source = [usize::MAX; 3];
        let mut flip = [false; 3];
        let mut used_rows = [false; 3];
        let mut used_cols = [false; 3];

        for _ in 0..3 {
            let mut best: Option<(usize, usize, f64)> = None;
            for (row, &row_used) in used_rows.iter().enumerate() {
                if row_used {
                    continue;
                }
                for (col, &col_used) in used_cols.iter().enumerate() {
                    if col_used {
                        continue;
                    }
                    let weight = affine[row][col].abs();
                    if best.map_or(true, |(_, _, w)| weight > w) {
                        best = Some((row, col, weight));
                    }
                }
            }
            match best {
                Some((row, col, weight)) if weight > 0.0 => {
                    source[row] = col;
                    flip[row] = affine[row][col] < 0.0;
                    used_rows[row] = true;
                    used_cols[col] = true;
                }
                _ => {
                    return Err(Error::InvalidFormat(
                        "affine has a degenerate rotation".to_string(),
                    ))
                }
            }
        }
        Ok(Self { source, flip })
    }

    /// True if the volume is already in RAS order.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.source == [0, 1, 2] && self.flip == [false; 3]
    }

    /// Shape after reorientation of a volume with `shape`.
    #[must_use]
    pub fn shape(&self, shape: [usize; 3]) -> [usize; 3] {
        self.source.map(|s| shape[s])
    }

    /// Permute and flip `data`.
    #[must_use]
    pub fn apply(&self, data: Array3<f32>) -> Array3<f32> {
        if self.is_identity() {
            return data;
        }
        let mut out = data.permuted_axes(self.source);
        for (r, &flip) in self.flip.iter().enumerate() {
            if flip {
                out.invert_axis(Axis(r));
            }
        }
        out.as_standard_layout().into_owned()
    }

    /// The affine of the reoriented volume, given the stored `shape`.
    #[must_use]
    pub fn apply_affine(&self, affine: &Affine, shape: [usize; 3]) -> Affine {
        let mut out = [[0.0; 4]; 4];
        out[3][3] = 1.0;
        for row in 0..3 {
            out[row][3] = affine[row][3];
        }
        for (r, &src) in self.source.iter().enumerate() {
            let sign = if self.flip[r] { -1.0 } else { 1.0 };
            for row in 0..3 {
                out[row][r] = affine[row][src] * sign;
                if self.flip[r] {
                    out[row][3] += affine[row][src] * (shape[src] as f64 - 1.0);
                }
            }
        }
        out
    }
}

/// Reorient `data` to RAS order, returning the new array and affine.
///
/// # Errors
/// See [`Orientation::from_affine`].
pub fn to_ras(data: Array3<f32>, affine: &Affine) -> Result<(Array3<f32>, Affine)> {
    let orientation = Orientation::from_affine(affine)?;
    let (x, y, z) = data.dim();
    let new_affine = orientation.apply_affine(affine, [x, y, z]);
    Ok((orientation.apply(data), new_affine))
}
