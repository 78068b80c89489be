//! Session configuration.

use crate::volume::ProjectionWindow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunables for the interaction session.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionConfig {
    /// Radius (voxels) of the overlay sphere drawn for each electrode.
    pub stamp_radius: usize,
    /// Projection band used after the first frame.
    pub projection: ProjectionWindow,
    /// Projection band used for the very first frame.
    pub initial_projection: ProjectionWindow,
    /// Bounds shrink per scroll step on each side (display units).
    pub zoom_step: f64,
    /// Bounds shift per arrow key press (display units).
    pub pan_step: f64,
    /// Smallest width/height a zoomed view may reach.
    pub min_view_extent: f64,
    /// CT intensities mapped to the ends of the overlay colormap.
    pub ct_display_range: (f32, f32),
    /// MRI percentiles used for the grayscale window.
    pub mri_percentiles: (f64, f64),
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stamp_radius: 2,
            projection: ProjectionWindow::centered(15),
            initial_projection: ProjectionWindow::new(-50, -20),
            zoom_step: 10.0,
            pan_step: 1.0,
            min_view_extent: 1.0,
            ct_display_range: (1000.0, 3000.0),
            mri_percentiles: (1.0, 99.0),
        }
    }
}

impl SessionConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the electrode marker radius.
    #[must_use]
    pub fn with_stamp_radius(mut self, radius: usize) -> Self {
        self.stamp_radius = radius;
        self
    }

    /// Set the live projection band.
    #[must_use]
    pub fn with_projection(mut self, window: ProjectionWindow) -> Self {
        self.projection = window;
        self
    }

    /// Set the first-frame projection band.
    #[must_use]
    pub fn with_initial_projection(mut self, window: ProjectionWindow) -> Self {
        self.initial_projection = window;
        self
    }

    /// Set the zoom step.
    #[must_use]
    pub fn with_zoom_step(mut self, step: f64) -> Self {
        self.zoom_step = step;
        self
    }

    /// Set the pan step.
    #[must_use]
    pub fn with_pan_step(mut self, step: f64) -> Self {
        self.pan_step = step;
        self
    }

    /// Set the CT display range.
    #[must_use]
    pub fn with_ct_display_range(mut self, low: f32, high: f32) -> Self {
        self.ct_display_range = (low, high);
        self
    }
}
