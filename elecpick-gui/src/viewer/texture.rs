//! Texture generation for the panel images.
//!
//! Panel arrays are indexed `[h, v]`. Images are drawn with `h` running left
//! to right and `v` running bottom to top, so image row `r` holds
//! `v = height - 1 - r`.

use egui::{Color32, ColorImage};
use elecpick_core::{palette_color, Frame, Panel, PanelFrame};

use crate::util::{normalize, tag_to_index};
use crate::viewer::colormap::{blend, Colormap};

/// Opacity of the CT drawn over the MRI.
pub const CT_ALPHA: f32 = 0.5;

/// Composite one panel into an RGBA image.
///
/// Slice panels show the MRI in grayscale with the CT in "hot" on top.
/// The projection panel shows the CT projection in grayscale. Annotation
/// markers are drawn opaque in their device colour on every panel.
#[must_use]
pub fn compose_panel(panel: &PanelFrame, frame: &Frame) -> ColorImage {
    let (width, height) = panel.base.dim();
    let mut pixels = Vec::with_capacity(width * height);

    let base_window = if panel.panel == Panel::Projection {
        frame.ct_range
    } else {
        frame.mri_window
    };

    for row in 0..height {
        let v = height - 1 - row;
        for h in 0..width {
            let base = panel.base[[h, v]];
            let mut rgb = if base.is_nan() {
                [0, 0, 0]
            } else {
                Colormap::Grayscale.apply(normalize(base, base_window))
            };

            if let Some(ct) = &panel.ct {
                let value = ct[[h, v]];
                if !value.is_nan() {
                    let hot = Colormap::Hot.apply(normalize(value, frame.ct_range));
                    rgb = blend(rgb, hot, CT_ALPHA);
                }
            }

            if let Some(device) = tag_to_index(panel.overlay[[h, v]]) {
                rgb = palette_color(device);
            }

            pixels.push(Color32::from_rgb(rgb[0], rgb[1], rgb[2]));
        }
    }

    ColorImage {
        size: [width, height],
        pixels,
    }
}
