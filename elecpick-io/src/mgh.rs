//! FreeSurfer MGH/MGZ volumes.
//!
//! An MGH file is a 284-byte big-endian header followed by voxel data in
//! column-major order. MGZ is the same stream gzip-compressed.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};
use elecpick_core::Affine;
use flate2::bufread::GzDecoder;
use log::debug;
use ndarray::{Array3, ShapeBuilder};

use crate::error::{Error, Result};
use crate::loader::RawVolume;

const HEADER_LEN: usize = 284;
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

const DIMS: usize = 4;
const NFRAMES: usize = 16;
const DTYPE: usize = 20;
const GOOD_RAS: usize = 28;
const DELTA: usize = 30;
const MDC: usize = 42;
const C_RAS: usize = 78;

/// Direction cosines (one row per voxel axis) used when the header carries
/// no RAS information: the coronal conformed layout.
const DEFAULT_MDC: [[f64; 3]; 3] = [[-1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataType {
    Uchar,
    Int,
    Float,
    Short,
}

impl DataType {
    fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Uchar),
            1 => Some(Self::Int),
            3 => Some(Self::Float),
            4 => Some(Self::Short),
            _ => None,
        }
    }

    fn size(self) -> usize {
        match self {
            Self::Uchar => 1,
            Self::Short => 2,
            Self::Int | Self::Float => 4,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn decode(self, bytes: &[u8]) -> f32 {
        match self {
            Self::Uchar => f32::from(bytes[0]),
            Self::Short => f32::from(BigEndian::read_i16(bytes)),
            Self::Int => BigEndian::read_i32(bytes) as f32,
            Self::Float => BigEndian::read_f32(bytes),
        }
    }
}

/// Vox2ras of an MGH volume: direction cosines scaled by voxel size, with
/// the volume centre (`dims / 2`) mapped to `c_ras`.
///
/// `mdc` holds one row per voxel axis, as stored in the header.
#[must_use]
pub fn mgh_affine(dims: [usize; 3], delta: [f64; 3], mdc: [[f64; 3]; 3], c_ras: [f64; 3]) -> Affine {
    let mut out = [[0.0; 4]; 4];
    for i in 0..3 {
        let mut centre = 0.0;
        for j in 0..3 {
            out[i][j] = mdc[j][i] * delta[j];
            #[allow(clippy::cast_precision_loss)]
            let half = dims[j] as f64 / 2.0;
            centre += out[i][j] * half;
        }
        out[i][3] = c_ras[i] - centre;
    }
    out[3][3] = 1.0;
    out
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut reader = BufReader::new(File::open(path)?);
    let gzipped = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    let mut bytes = Vec::new();
    if gzipped {
        GzDecoder::new(reader).read_to_end(&mut bytes)?;
    } else {
        reader.read_to_end(&mut bytes)?;
    }
    Ok(bytes)
}

fn f32_at(bytes: &[u8], offset: usize) -> f64 {
    f64::from(BigEndian::read_f32(&bytes[offset..offset + 4]))
}

/// Parse an in-memory MGH stream. Only the first frame is kept.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] for truncated data, unknown voxel types
/// or empty dimensions.
pub fn parse_mgh(bytes: &[u8]) -> Result<RawVolume> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::InvalidFormat(format!(
            "MGH header needs {HEADER_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    let mut dims = [0usize; 3];
    for (i, d) in dims.iter_mut().enumerate() {
        let v = BigEndian::read_i32(&bytes[DIMS + 4 * i..DIMS + 4 * i + 4]);
        *d = usize::try_from(v)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| Error::InvalidFormat(format!("MGH dimension {i} is {v}")))?;
    }
    let frames = BigEndian::read_i32(&bytes[NFRAMES..NFRAMES + 4]);
    let code = BigEndian::read_i32(&bytes[DTYPE..DTYPE + 4]);
    let dtype = DataType::from_code(code)
        .ok_or_else(|| Error::InvalidFormat(format!("unsupported MGH voxel type {code}")))?;

    let affine = if BigEndian::read_i16(&bytes[GOOD_RAS..GOOD_RAS + 2]) > 0 {
        let delta = [0, 1, 2].map(|i| f32_at(bytes, DELTA + 4 * i));
        let mdc = [0, 1, 2].map(|r| [0, 1, 2].map(|c| f32_at(bytes, MDC + 12 * r + 4 * c)));
        let c_ras = [0, 1, 2].map(|i| f32_at(bytes, C_RAS + 4 * i));
        mgh_affine(dims, delta, mdc, c_ras)
    } else {
        mgh_affine(dims, [1.0; 3], DEFAULT_MDC, [0.0; 3])
    };

    let count = dims.iter().product::<usize>();
    let size = dtype.size();
    let payload = bytes
        .get(HEADER_LEN..HEADER_LEN + count * size)
        .ok_or_else(|| {
            Error::InvalidFormat(format!(
                "MGH data truncated: expected {count} voxels of {size} byte(s)"
            ))
        })?;
    let values: Vec<f32> = payload.chunks_exact(size).map(|b| dtype.decode(b)).collect();
    let data = Array3::from_shape_vec((dims[0], dims[1], dims[2]).f(), values)
        .map_err(|e| Error::InvalidFormat(e.to_string()))?;

    debug!("MGH volume {dims:?}, {frames} frame(s), {dtype:?}");
    Ok(RawVolume { data, affine })
}

/// Read a `.mgh` or `.mgz` file.
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be read or decompressed, or
/// [`Error::InvalidFormat`] if it is not a valid MGH volume.
pub fn read_mgh(path: &Path) -> Result<RawVolume> {
    let bytes = read_bytes(path)?;
    parse_mgh(&bytes).map_err(|e| match e {
        Error::InvalidFormat(msg) => Error::InvalidFormat(format!("{}: {msg}", path.display())),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use byteorder::WriteBytesExt;
    use elecpick_core::SURFACE_RAS_VOX2RAS;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::tempdir;

    fn header(dims: [i32; 3], dtype: i32, good_ras: bool) -> Vec<u8> {
        let mut h = Vec::new();
        h.write_i32::<BigEndian>(1).unwrap();
        for d in dims {
            h.write_i32::<BigEndian>(d).unwrap();
        }
        h.write_i32::<BigEndian>(1).unwrap();
        h.write_i32::<BigEndian>(dtype).unwrap();
        h.write_i32::<BigEndian>(0).unwrap();
        h.write_i16::<BigEndian>(i16::from(good_ras)).unwrap();
        // delta, Mdc rows (x, y, z), c_ras
        for v in [
            2.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 10.0, -5.0, 3.0,
        ] {
            h.write_f32::<BigEndian>(v).unwrap();
        }
        h.resize(HEADER_LEN, 0);
        h
    }

    #[test]
    fn test_conformed_default_matches_surface_ras() {
        let affine = mgh_affine([256; 3], [1.0; 3], DEFAULT_MDC, [0.0; 3]);
        for (row, expected) in affine.iter().zip(SURFACE_RAS_VOX2RAS.iter()) {
            for (a, e) in row.iter().zip(expected) {
                assert_abs_diff_eq!(*a, *e);
            }
        }
    }

    #[test]
    fn test_parse_column_major_uchar() {
        let mut bytes = header([2, 3, 4], 0, true);
        bytes.extend((0u8..24).collect::<Vec<_>>());
        let vol = parse_mgh(&bytes).unwrap();
        assert_eq!(vol.data.dim(), (2, 3, 4));
        // x runs fastest on disk
        assert_abs_diff_eq!(vol.data[[1, 0, 0]], 1.0);
        assert_abs_diff_eq!(vol.data[[0, 1, 0]], 2.0);
        assert_abs_diff_eq!(vol.data[[0, 0, 1]], 6.0);
        assert_abs_diff_eq!(vol.data[[1, 2, 3]], 23.0);

        assert_abs_diff_eq!(vol.affine[0][0], 2.0);
        assert_abs_diff_eq!(vol.affine[1][1], 1.0);
        // c_ras - M * dims / 2
        assert_abs_diff_eq!(vol.affine[0][3], 10.0 - 2.0);
        assert_abs_diff_eq!(vol.affine[1][3], -5.0 - 1.5);
        assert_abs_diff_eq!(vol.affine[2][3], 3.0 - 2.0);
    }

    #[test]
    fn test_read_mgz_float() {
        let mut bytes = header([2, 2, 2], 3, false);
        for i in 0..8 {
            bytes.write_f32::<BigEndian>(i as f32 * 0.5).unwrap();
        }
        let dir = tempdir().unwrap();
        let path = dir.path().join("brain.mgz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(&bytes).unwrap();
        enc.finish().unwrap();

        let vol = read_mgh(&path).unwrap();
        assert_abs_diff_eq!(vol.data[[1, 1, 1]], 3.5);
        assert_abs_diff_eq!(vol.affine[0][0], -1.0);
        assert_abs_diff_eq!(vol.affine[1][2], 1.0);
    }

    #[test]
    fn test_truncated_data_is_an_error() {
        let mut bytes = header([4, 4, 4], 4, true);
        bytes.extend([0u8; 10]);
        assert!(matches!(parse_mgh(&bytes), Err(Error::InvalidFormat(_))));
        assert!(matches!(parse_mgh(&bytes[..100]), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let mut bytes = header([1, 1, 1], 7, true);
        bytes.extend([0u8; 8]);
        assert!(matches!(parse_mgh(&bytes), Err(Error::InvalidFormat(_))));
    }
}
