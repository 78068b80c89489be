//! Volume axes and display panels.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A voxel axis of a canonically oriented volume.
///
/// Volumes are stored with dimension order (sagittal, coronal, axial), so the
/// discriminant doubles as the array axis index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Axis {
    #[default]
    Sagittal = 0,
    Coronal = 1,
    Axial = 2,
}

impl Axis {
    /// All axes in array order.
    pub const ALL: [Axis; 3] = [Axis::Sagittal, Axis::Coronal, Axis::Axial];

    /// Array dimension index of this axis.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The two axes spanning a plane perpendicular to `self`, ascending.
    ///
    /// The first is drawn horizontally, the second vertically.
    #[must_use]
    pub const fn plane_axes(self) -> (Axis, Axis) {
        match self {
            Axis::Sagittal => (Axis::Coronal, Axis::Axial),
            Axis::Coronal => (Axis::Sagittal, Axis::Axial),
            Axis::Axial => (Axis::Sagittal, Axis::Coronal),
        }
    }

    /// Map the projection-axis hotkeys `s`, `c` and `a`.
    #[must_use]
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            's' => Some(Axis::Sagittal),
            'c' => Some(Axis::Coronal),
            'a' => Some(Axis::Axial),
            _ => None,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Sagittal => write!(f, "sagittal"),
            Axis::Coronal => write!(f, "coronal"),
            Axis::Axial => write!(f, "axial"),
        }
    }
}

/// One of the four display panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    /// Slice perpendicular to the sagittal axis.
    Sagittal,
    /// Slice perpendicular to the coronal axis.
    Coronal,
    /// Slice perpendicular to the axial axis.
    Axial,
    /// CT maximum intensity projection along the session's projection axis.
    Projection,
}

impl Panel {
    /// Panels in layout order (top-left, top-right, bottom-left, bottom-right).
    pub const ALL: [Panel; 4] = [
        Panel::Sagittal,
        Panel::Coronal,
        Panel::Axial,
        Panel::Projection,
    ];

    /// Position in [`Panel::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Panel::Sagittal => 0,
            Panel::Coronal => 1,
            Panel::Axial => 2,
            Panel::Projection => 3,
        }
    }

    /// Axis this panel slices through, resolving the projection panel
    /// against the current projection axis.
    #[must_use]
    pub const fn slice_axis(self, projection_axis: Axis) -> Axis {
        match self {
            Panel::Sagittal => Axis::Sagittal,
            Panel::Coronal => Axis::Coronal,
            Panel::Axial => Axis::Axial,
            Panel::Projection => projection_axis,
        }
    }

    /// Anatomical direction labels for the horizontal and vertical axes.
    #[must_use]
    pub const fn axis_labels(self, projection_axis: Axis) -> (&'static str, &'static str) {
        match self.slice_axis(projection_axis) {
            Axis::Sagittal => ("Posterior", "Inferior"),
            Axis::Coronal => ("Left", "Inferior"),
            Axis::Axial => ("Left", "Posterior"),
        }
    }
}

impl std::fmt::Display for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Panel::Sagittal => write!(f, "Sagittal"),
            Panel::Coronal => write!(f, "Coronal"),
            Panel::Axial => write!(f, "Axial"),
            Panel::Projection => write!(f, "MIP"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_axes_exclude_slice_axis() {
        for axis in Axis::ALL {
            let (h, v) = axis.plane_axes();
            assert_ne!(h, axis);
            assert_ne!(v, axis);
            assert!(h.index() < v.index());
        }
    }

    #[test]
    fn test_projection_panel_follows_projection_axis() {
        assert_eq!(Panel::Projection.slice_axis(Axis::Coronal), Axis::Coronal);
        assert_eq!(Panel::Axial.slice_axis(Axis::Coronal), Axis::Axial);
    }

    #[test]
    fn test_axis_hotkeys() {
        assert_eq!(Axis::from_key('s'), Some(Axis::Sagittal));
        assert_eq!(Axis::from_key('c'), Some(Axis::Coronal));
        assert_eq!(Axis::from_key('a'), Some(Axis::Axial));
        assert_eq!(Axis::from_key('x'), None);
    }
}
