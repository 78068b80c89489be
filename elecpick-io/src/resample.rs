//! Trilinear resampling to a fixed grid.
//!
//! Output voxel `o` along an axis of input length `n` and output length `m`
//! samples input coordinate `o * (n - 1) / (m - 1)`, so the first and last
//! voxels of both grids coincide.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use log::info;
use ndarray::Array3;

use crate::error::{Error, Result};
use rayon::prelude::*;

/// Interpolation taps for one output index: lower input index, upper input
/// index and the weight of the upper one.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Tap {
    lo: usize,
    hi: usize,
    w: f32,
}

fn taps(input: usize, output: usize) -> Vec<Tap> {
    let scale = if output > 1 {
        (input.saturating_sub(1)) as f64 / (output - 1) as f64
    } else {
        0.0
    };
    let last = input.saturating_sub(1);
    (0..output)
        .map(|o| {
            let x = o as f64 * scale;
            let lo = (x.floor() as usize).min(last);
            let hi = (lo + 1).min(last);
            Tap {
                lo,
                hi,
                w: (x - lo as f64) as f32,
            }
        })
        .collect()
}

fn lerp(a: f32, b: f32, w: f32) -> f32 {
    if w == 0.0 {
        a
    } else {
        a + (b - a) * w
    }
}

/// Resample `data` to `shape` with trilinear interpolation.
///
/// Returns the input unchanged if it already has `shape`. Output planes
/// along the first axis are computed in parallel.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] if either the input or `shape` is empty.
pub fn resample(data: Array3<f32>, shape: [usize; 3]) -> Result<Array3<f32>> {
    let (nx, ny, nz) = data.dim();
    if [nx, ny, nz] == shape {
        return Ok(data);
    }
    if data.is_empty() || shape.contains(&0) {
        return Err(Error::InvalidFormat(format!(
            "cannot resample {nx}x{ny}x{nz} to {shape:?}"
        )));
    }
    info!("Resampling {nx}x{ny}x{nz} -> {}x{}x{}", shape[0], shape[1], shape[2]);

    let tx = taps(nx, shape[0]);
    let ty = taps(ny, shape[1]);
    let tz = taps(nz, shape[2]);
    let plane = shape[1] * shape[2];
    let mut out = vec![0.0_f32; shape[0] * plane];

    out.par_chunks_mut(plane)
        .zip(tx.par_iter())
        .for_each(|(chunk, x)| {
            for (j, y) in ty.iter().enumerate() {
                for (k, z) in tz.iter().enumerate() {
                    let sample = |i: usize, jj: usize| {
                        lerp(data[[i, jj, z.lo]], data[[i, jj, z.hi]], z.w)
                    };
                    let c0 = lerp(sample(x.lo, y.lo), sample(x.lo, y.hi), y.w);
                    let c1 = lerp(sample(x.hi, y.lo), sample(x.hi, y.hi), y.w);
                    chunk[j * shape[2] + k] = lerp(c0, c1, x.w);
                }
            }
        });

    Array3::from_shape_vec((shape[0], shape[1], shape[2]), out)
        .map_err(|e| Error::InvalidFormat(e.to_string()))
}

/// Replace every value below `threshold` with NaN.
pub fn threshold(data: &mut Array3<f32>, threshold: f32) {
    data.mapv_inplace(|v| if v < threshold { f32::NAN } else { v });
}
