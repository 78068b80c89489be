//! Colormaps used to composite the panel images.

use crate::util::f32_to_u8;

/// Intensity colormaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    /// Grayscale - black to white. Used for the MRI and the CT projection.
    Grayscale,
    /// Hot (Thermal) - black to red to yellow to white. Used for the CT
    /// overlay on slices.
    Hot,
}

impl Colormap {
    /// Apply the colormap to a normalized value [0, 1] and return RGB bytes.
    #[must_use]
    pub fn apply(self, val: f32) -> [u8; 3] {
        let val = val.clamp(0.0, 1.0);
        match self {
            Colormap::Grayscale => {
                let v = f32_to_u8(val * 255.0);
                [v, v, v]
            }
            Colormap::Hot => {
                // Black -> red -> yellow -> white in equal thirds
                let r = f32_to_u8(val * 3.0 * 255.0);
                let g = f32_to_u8((val * 3.0 - 1.0) * 255.0);
                let b = f32_to_u8((val * 3.0 - 2.0) * 255.0);
                [r, g, b]
            }
        }
    }
}

/// Blend `top` over `bottom` with opacity `alpha` in [0, 1].
#[must_use]
pub fn blend(bottom: [u8; 3], top: [u8; 3], alpha: f32) -> [u8; 3] {
    let mut out = [0u8; 3];
    for i in 0..3 {
        let b = f32::from(bottom[i]);
        let t = f32::from(top[i]);
        out[i] = f32_to_u8(b + (t - b) * alpha);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grayscale_ends() {
        assert_eq!(Colormap::Grayscale.apply(0.0), [0, 0, 0]);
        assert_eq!(Colormap::Grayscale.apply(1.0), [255, 255, 255]);
    }

    #[test]
    fn test_hot_progression() {
        assert_eq!(Colormap::Hot.apply(0.0), [0, 0, 0]);
        assert_eq!(Colormap::Hot.apply(1.0 / 3.0), [255, 0, 0]);
        assert_eq!(Colormap::Hot.apply(1.0), [255, 255, 255]);
    }

    #[test]
    fn test_blend_half() {
        assert_eq!(blend([0, 0, 0], [200, 100, 50], 0.5), [100, 50, 25]);
        assert_eq!(blend([10, 20, 30], [200, 100, 50], 0.0), [10, 20, 30]);
    }
}
