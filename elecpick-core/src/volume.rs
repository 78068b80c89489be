//! Co-registered MRI, CT and annotation overlay volumes.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use ndarray::{Array2, Array3, Zip};

use crate::error::{Error, Result};
use crate::geometry::Axis;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which of the three stored volumes to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Anatomical MRI.
    Mri,
    /// Thresholded CT (NaN below threshold).
    Ct,
    /// Annotation markers (NaN where nothing is stamped).
    Overlay,
}

/// Band of slices, relative to a centre index, collapsed by a projection.
///
/// Both offsets are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProjectionWindow {
    /// First slice offset from the centre.
    pub start: isize,
    /// Last slice offset from the centre.
    pub end: isize,
}

impl ProjectionWindow {
    /// Window spanning `[center + start, center + end]`.
    #[must_use]
    pub const fn new(start: isize, end: isize) -> Self {
        Self { start, end }
    }

    /// Symmetric window `[center - half_width, center + half_width]`.
    #[must_use]
    pub const fn centered(half_width: isize) -> Self {
        Self {
            start: -half_width,
            end: half_width,
        }
    }

    /// Clamp the window around `center` to `[0, len)`.
    ///
    /// Returns `None` if nothing of the band lies inside the volume.
    #[must_use]
    pub fn clamp(self, center: usize, len: usize) -> Option<(usize, usize)> {
        let center = center as i64;
        let lo = (center + self.start as i64).max(0);
        let hi = (center + self.end as i64).min(len as i64 - 1);
        (lo <= hi).then_some((lo as usize, hi as usize))
    }
}

/// Voxel indices inside the sphere `|v - center|² <= radius²`, clipped to
/// the volume.
fn sphere_voxels(
    center: [i64; 3],
    radius: usize,
    shape: [usize; 3],
) -> impl Iterator<Item = [usize; 3]> {
    let r = radius as i64;
    let r2 = r * r;
    (-r..=r).flat_map(move |dx| {
        (-r..=r).flat_map(move |dy| {
            (-r..=r).filter_map(move |dz| {
                if dx * dx + dy * dy + dz * dz > r2 {
                    return None;
                }
                let p = [center[0] + dx, center[1] + dy, center[2] + dz];
                let inside = p
                    .iter()
                    .zip(shape.iter())
                    .all(|(&i, &n)| i >= 0 && i < n as i64);
                inside.then(|| p.map(|i| i as usize))
            })
        })
    })
}

fn within(voxel: [usize; 3], center: [i64; 3], radius: usize) -> bool {
    let r = radius as i64;
    let d2: i64 = voxel
        .iter()
        .zip(center.iter())
        .map(|(&v, &c)| {
            let d = v as i64 - c;
            d * d
        })
        .sum();
    d2 <= r * r
}

/// MRI, CT and overlay volumes at a common shape.
#[derive(Debug, Clone)]
pub struct VolumeStore {
    mri: Array3<f32>,
    ct: Array3<f32>,
    overlay: Array3<f32>,
    shape: [usize; 3],
}

impl VolumeStore {
    /// Create a store from two co-registered volumes.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the volumes differ in shape.
    pub fn new(mri: Array3<f32>, ct: Array3<f32>) -> Result<Self> {
        let shape = dims(&mri);
        let ct_shape = dims(&ct);
        if shape != ct_shape {
            return Err(Error::ShapeMismatch {
                left: shape,
                right: ct_shape,
            });
        }
        Ok(Self {
            mri,
            ct,
            overlay: Array3::from_elem(shape, f32::NAN),
            shape,
        })
    }

    /// Volume shape (sagittal, coronal, axial).
    #[must_use]
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Number of slices along `axis`.
    #[must_use]
    pub fn len(&self, axis: Axis) -> usize {
        self.shape[axis.index()]
    }

    /// Borrow one of the stored volumes.
    #[must_use]
    pub fn layer(&self, layer: Layer) -> &Array3<f32> {
        match layer {
            Layer::Mri => &self.mri,
            Layer::Ct => &self.ct,
            Layer::Overlay => &self.overlay,
        }
    }

    /// Plane perpendicular to `axis` at `index`, indexed `[h, v]` where
    /// `(h, v) = axis.plane_axes()`.
    ///
    /// # Errors
    /// Returns [`Error::SliceOutOfRange`] if `index` is past the end of `axis`.
    pub fn slice(&self, layer: Layer, axis: Axis, index: usize) -> Result<Array2<f32>> {
        let len = self.len(axis);
        if index >= len {
            return Err(Error::SliceOutOfRange { index, len });
        }
        Ok(self
            .layer(layer)
            .index_axis(ndarray::Axis(axis.index()), index)
            .to_owned())
    }

    /// NaN-ignoring maximum intensity projection of the CT along `axis`.
    ///
    /// Voxels that are NaN in every slice of the band stay NaN.
    #[must_use]
    pub fn projection(&self, axis: Axis, center: usize, window: ProjectionWindow) -> Array2<f32> {
        let (h, v) = axis.plane_axes();
        let mut out = Array2::from_elem((self.len(h), self.len(v)), f32::NAN);
        let Some((lo, hi)) = window.clamp(center, self.len(axis)) else {
            return out;
        };

        for index in lo..=hi {
            let plane = self.ct.index_axis(ndarray::Axis(axis.index()), index);
            Zip::from(&mut out).and(&plane).for_each(|acc, &val| {
                if !val.is_nan() && (acc.is_nan() || val > *acc) {
                    *acc = val;
                }
            });
        }
        out
    }

    /// Set every voxel within `radius` of `center` to `tag`.
    ///
    /// Voxels outside the volume are skipped. Returns the number written.
    pub fn stamp_sphere(&mut self, center: [i64; 3], radius: usize, tag: f32) -> usize {
        let mut written = 0;
        for [i, j, k] in sphere_voxels(center, radius, self.shape) {
            self.overlay[[i, j, k]] = tag;
            written += 1;
        }
        written
    }

    /// Reset every voxel within `radius` of `center` to NaN.
    pub fn clear_sphere(&mut self, center: [i64; 3], radius: usize) -> usize {
        self.stamp_sphere(center, radius, f32::NAN)
    }

    /// Clear the sphere at `center`, then replay `stamps` (oldest first)
    /// restricted to that sphere.
    ///
    /// Voxels outside the cleared sphere are never touched.
    pub fn repaint_sphere(&mut self, center: [i64; 3], radius: usize, stamps: &[([i64; 3], f32)]) {
        for voxel in sphere_voxels(center, radius, self.shape) {
            let value = stamps
                .iter()
                .rev()
                .find(|(c, _)| within(voxel, *c, radius))
                .map_or(f32::NAN, |(_, tag)| *tag);
            self.overlay[voxel] = value;
        }
    }

    /// Percentile display window over the finite voxels of `layer`.
    ///
    /// Percentiles are in `[0, 100]` and interpolate linearly between ranks.
    /// Returns `None` if the layer has no finite voxels.
    #[must_use]
    pub fn intensity_window(&self, layer: Layer, low_pct: f64, high_pct: f64) -> Option<(f32, f32)> {
        let mut values: Vec<f32> = self
            .layer(layer)
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        if values.is_empty() {
            return None;
        }
        let low = percentile(&mut values, low_pct);
        let high = percentile(&mut values, high_pct);
        Some((low, high))
    }
}

fn dims(a: &Array3<f32>) -> [usize; 3] {
    let (x, y, z) = a.dim();
    [x, y, z]
}

fn percentile(values: &mut [f32], pct: f64) -> f32 {
    let n = values.len();
    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let (_, lo_val, upper) = values.select_nth_unstable_by(lo, f32::total_cmp);
    let lo_val = *lo_val;
    if hi == lo {
        return lo_val;
    }
    let hi_val = upper.iter().copied().fold(f32::INFINITY, f32::min);
    let frac = (rank - lo as f64) as f32;
    lo_val + (hi_val - lo_val) * frac
}
