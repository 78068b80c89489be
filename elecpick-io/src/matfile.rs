//! Read-only import of `elecmatrix` from MATLAB level 5 files.
//!
//! Older electrode records were saved as `<device>.mat` holding an N×3
//! (or wider) double matrix named `elecmatrix`. Only that variable is
//! decoded; uncompressed and zlib-compressed elements are both accepted.

use std::fs;
use std::io::Read;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::read::ZlibDecoder;
use log::debug;

use crate::error::{Error, Result};

const HEADER_LEN: usize = 128;
const VARIABLE: &str = "elecmatrix";

const MI_INT8: u32 = 1;
const MI_UINT8: u32 = 2;
const MI_INT16: u32 = 3;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_SINGLE: u32 = 7;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidFormat(msg.into())
}

/// One data element: type, payload and offset of the next element.
struct Element<'a> {
    kind: u32,
    data: &'a [u8],
    next: usize,
}

fn element<E: ByteOrder>(bytes: &[u8], offset: usize) -> Result<Element<'_>> {
    let tag = bytes
        .get(offset..offset + 8)
        .ok_or_else(|| invalid("MAT element tag truncated"))?;
    let first = E::read_u32(&tag[..4]);
    // Small data element: type and size packed into the first word.
    if first >> 16 != 0 {
        let len = (first >> 16) as usize;
        if len > 4 {
            return Err(invalid("MAT small element longer than 4 bytes"));
        }
        return Ok(Element {
            kind: first & 0xffff,
            data: &tag[4..4 + len],
            next: offset + 8,
        });
    }
    let len = E::read_u32(&tag[4..]) as usize;
    let start = offset + 8;
    let data = bytes
        .get(start..start + len)
        .ok_or_else(|| invalid("MAT element data truncated"))?;
    let next = if first == MI_COMPRESSED {
        start + len
    } else {
        start + len.div_ceil(8) * 8
    };
    Ok(Element {
        kind: first,
        data,
        next,
    })
}

fn numbers<E: ByteOrder>(kind: u32, data: &[u8]) -> Result<Vec<f64>> {
    let values = match kind {
        MI_DOUBLE => data.chunks_exact(8).map(E::read_f64).collect(),
        MI_SINGLE => data.chunks_exact(4).map(|b| f64::from(E::read_f32(b))).collect(),
        MI_INT32 => data.chunks_exact(4).map(|b| f64::from(E::read_i32(b))).collect(),
        MI_UINT32 => data.chunks_exact(4).map(|b| f64::from(E::read_u32(b))).collect(),
        MI_INT16 => data.chunks_exact(2).map(|b| f64::from(E::read_i16(b))).collect(),
        MI_UINT16 => data.chunks_exact(2).map(|b| f64::from(E::read_u16(b))).collect(),
        MI_INT8 => data.iter().map(|&b| f64::from(i8::from_be_bytes([b]))).collect(),
        MI_UINT8 => data.iter().map(|&b| f64::from(b)).collect(),
        other => return Err(invalid(format!("unsupported MAT data type {other}"))),
    };
    Ok(values)
}

/// Decode a matrix element if it is named `elecmatrix`.
fn matrix<E: ByteOrder>(data: &[u8]) -> Result<Option<Vec<[f64; 3]>>> {
    let flags = element::<E>(data, 0)?;
    let dims = element::<E>(data, flags.next)?;
    let name = element::<E>(data, dims.next)?;
    if name.data != VARIABLE.as_bytes() {
        return Ok(None);
    }
    let dims: Vec<usize> = dims
        .data
        .chunks_exact(4)
        .map(|b| usize::try_from(E::read_i32(b)).unwrap_or(0))
        .collect();
    let (rows, cols) = match dims.as_slice() {
        [r, c] => (*r, *c),
        _ => return Err(invalid(format!("{VARIABLE} has dimensions {dims:?}"))),
    };
    if rows == 0 || cols == 0 {
        return Ok(Some(Vec::new()));
    }
    if cols < 3 {
        return Err(invalid(format!("{VARIABLE} is {rows}x{cols}, expected 3 columns")));
    }
    let real = element::<E>(data, name.next)?;
    let values = numbers::<E>(real.kind, real.data)?;
    if values.len() < rows * cols {
        return Err(invalid(format!("{VARIABLE} holds too few values")));
    }
    // Column-major: row r, column c is values[r + c * rows].
    Ok(Some(
        (0..rows)
            .map(|r| [values[r], values[r + rows], values[r + 2 * rows]])
            .collect(),
    ))
}

fn find_elecmatrix<E: ByteOrder>(bytes: &[u8], mut offset: usize) -> Result<Option<Vec<[f64; 3]>>> {
    while offset + 8 <= bytes.len() {
        let el = element::<E>(bytes, offset)?;
        match el.kind {
            MI_MATRIX => {
                if let Some(points) = matrix::<E>(el.data)? {
                    return Ok(Some(points));
                }
            }
            MI_COMPRESSED => {
                let mut inflated = Vec::new();
                ZlibDecoder::new(el.data).read_to_end(&mut inflated)?;
                if let Some(points) = find_elecmatrix::<E>(&inflated, 0)? {
                    return Ok(Some(points));
                }
            }
            _ => {}
        }
        offset = el.next;
    }
    Ok(None)
}

/// Extract `elecmatrix` from the bytes of a MAT file.
///
/// # Errors
/// Returns [`Error::InvalidFormat`] for files that are not level 5 MAT
/// files or whose `elecmatrix` is malformed.
pub fn parse_elecmatrix(bytes: &[u8]) -> Result<Option<Vec<[f64; 3]>>> {
    let marker = bytes
        .get(HEADER_LEN - 2..HEADER_LEN)
        .ok_or_else(|| invalid("MAT header truncated"))?;
    match marker {
        b"IM" => find_elecmatrix::<LittleEndian>(bytes, HEADER_LEN),
        b"MI" => find_elecmatrix::<BigEndian>(bytes, HEADER_LEN),
        _ => Err(invalid("not a level 5 MAT file")),
    }
}

/// Read the `elecmatrix` rows of a MAT file.
///
/// # Errors
/// Returns an error if the file cannot be read, is not a level 5 MAT file
/// or has no `elecmatrix` variable.
pub fn read_elecmatrix(path: &Path) -> Result<Vec<[f64; 3]>> {
    let bytes = fs::read(path)?;
    let points = parse_elecmatrix(&bytes)
        .map_err(|e| match e {
            Error::InvalidFormat(msg) => invalid(format!("{}: {msg}", path.display())),
            other => other,
        })?
        .ok_or_else(|| invalid(format!("{}: no {VARIABLE} variable", path.display())))?;
    debug!("Imported {} point(s) from {}", points.len(), path.display());
    Ok(points)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn pad(buf: &mut Vec<u8>) {
        while buf.len() % 8 != 0 {
            buf.push(0);
        }
    }

    fn sub(buf: &mut Vec<u8>, kind: u32, data: &[u8]) {
        buf.write_u32::<LittleEndian>(kind).unwrap();
        buf.write_u32::<LittleEndian>(u32::try_from(data.len()).unwrap()).unwrap();
        buf.extend_from_slice(data);
        pad(buf);
    }

    fn matrix_element(name: &str, rows: i32, cols: i32, values: &[f64]) -> Vec<u8> {
        let mut body = Vec::new();
        let mut flags = Vec::new();
        flags.write_u32::<LittleEndian>(6).unwrap();
        flags.write_u32::<LittleEndian>(0).unwrap();
        sub(&mut body, MI_UINT32, &flags);
        let mut dims = Vec::new();
        dims.write_i32::<LittleEndian>(rows).unwrap();
        dims.write_i32::<LittleEndian>(cols).unwrap();
        sub(&mut body, MI_INT32, &dims);
        sub(&mut body, MI_INT8, name.as_bytes());
        let mut real = Vec::new();
        for v in values {
            real.write_f64::<LittleEndian>(*v).unwrap();
        }
        sub(&mut body, MI_DOUBLE, &real);

        let mut el = Vec::new();
        sub(&mut el, MI_MATRIX, &body);
        el
    }

    fn header() -> Vec<u8> {
        let mut h = b"MATLAB 5.0 MAT-file".to_vec();
        h.resize(124, b' ');
        h.write_u16::<LittleEndian>(0x0100).unwrap();
        h.extend_from_slice(b"IM");
        h
    }

    /// A MAT file as written by `scipy.io.savemat` for a column-major
    /// `rows`×3 matrix.
    pub(crate) fn mat_file(points: &[[f64; 3]]) -> Vec<u8> {
        let rows = points.len();
        let values: Vec<f64> = (0..3)
            .flat_map(|c| points.iter().map(move |p| p[c]))
            .collect();
        let mut bytes = header();
        bytes.extend(matrix_element(
            VARIABLE,
            i32::try_from(rows).unwrap(),
            3,
            &values,
        ));
        bytes
    }

    #[test]
    fn test_uncompressed_column_major() {
        let bytes = mat_file(&[[1.0, 2.0, 3.0], [-4.5, 5.25, 6.0]]);
        let points = parse_elecmatrix(&bytes).unwrap().unwrap();
        assert_eq!(points, vec![[1.0, 2.0, 3.0], [-4.5, 5.25, 6.0]]);
    }

    #[test]
    fn test_compressed_element_and_other_variables() {
        let mut bytes = header();
        bytes.extend(matrix_element("anatomy", 1, 3, &[9.0, 9.0, 9.0]));
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&matrix_element(VARIABLE, 1, 4, &[1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        let packed = enc.finish().unwrap();
        bytes.write_u32::<LittleEndian>(MI_COMPRESSED).unwrap();
        bytes
            .write_u32::<LittleEndian>(u32::try_from(packed.len()).unwrap())
            .unwrap();
        bytes.extend(packed);

        let points = parse_elecmatrix(&bytes).unwrap().unwrap();
        assert_eq!(points, vec![[1.0, 2.0, 3.0]]);
    }

    #[test]
    fn test_empty_matrix() {
        let mut bytes = header();
        bytes.extend(matrix_element(VARIABLE, 0, 0, &[]));
        assert_eq!(parse_elecmatrix(&bytes).unwrap().unwrap(), Vec::<[f64; 3]>::new());
    }

    #[test]
    fn test_missing_variable_and_bad_header() {
        let mut bytes = header();
        bytes.extend(matrix_element("other", 1, 3, &[1.0, 2.0, 3.0]));
        assert!(parse_elecmatrix(&bytes).unwrap().is_none());
        assert!(parse_elecmatrix(b"not a mat file").is_err());
    }

    #[test]
    fn test_two_columns_rejected() {
        let mut bytes = header();
        bytes.extend(matrix_element(VARIABLE, 1, 2, &[1.0, 2.0]));
        assert!(matches!(parse_elecmatrix(&bytes), Err(Error::InvalidFormat(_))));
    }
}
