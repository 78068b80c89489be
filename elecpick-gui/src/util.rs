//! Numeric conversion and formatting utilities for elecpick-gui.
//!
//! These functions handle conversions between numeric types with explicit
//! handling of precision loss and bounds checking.

/// Convert usize to f64 with allowed precision loss.
#[allow(clippy::cast_precision_loss)]
pub fn usize_to_f64(value: usize) -> f64 {
    value as f64
}

/// Convert f32 to u8 with clamping to [0, 255].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn f32_to_u8(value: f32) -> u8 {
    let clamped = value.clamp(0.0, 255.0);
    clamped.round() as u8
}

/// Map an overlay tag back to a device index.
///
/// Returns `None` for NaN (no marker) and for negative or non-finite tags.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn tag_to_index(tag: f32) -> Option<usize> {
    if !tag.is_finite() || tag < 0.0 {
        return None;
    }
    Some(tag.round() as usize)
}

/// Normalise `value` into [0, 1] over `(low, high)`.
///
/// A degenerate window maps everything at or above `low` to 1.
pub fn normalize(value: f32, (low, high): (f32, f32)) -> f32 {
    if high > low {
        ((value - low) / (high - low)).clamp(0.0, 1.0)
    } else if value >= low {
        1.0
    } else {
        0.0
    }
}

/// Format a 3-vector as `[x, y, z]` with fixed precision.
#[must_use]
pub fn format_triplet(v: [f64; 3], precision: usize) -> String {
    format!(
        "[{:.p$}, {:.p$}, {:.p$}]",
        v[0],
        v[1],
        v[2],
        p = precision
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_tag_to_index() {
        assert_eq!(tag_to_index(f32::NAN), None);
        assert_eq!(tag_to_index(-1.0), None);
        assert_eq!(tag_to_index(0.0), Some(0));
        assert_eq!(tag_to_index(16.0), Some(16));
    }

    #[test]
    fn test_normalize() {
        assert_abs_diff_eq!(normalize(2000.0, (1000.0, 3000.0)), 0.5);
        assert_abs_diff_eq!(normalize(5000.0, (1000.0, 3000.0)), 1.0);
        assert_abs_diff_eq!(normalize(0.0, (1000.0, 3000.0)), 0.0);
        assert_abs_diff_eq!(normalize(4.0, (4.0, 4.0)), 1.0);
    }

    #[test]
    fn test_format_triplet() {
        assert_eq!(format_triplet([0.0, -1.25, 3.0], 2), "[0.00, -1.25, 3.00]");
    }
}
