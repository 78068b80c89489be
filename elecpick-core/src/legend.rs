//! Device legend and status line.

use crate::registry::{AnnotationRegistry, AnnotationStore, DeviceId};

/// Number of distinct device colours before the palette wraps.
pub const PALETTE_LEN: usize = 17;

/// Device colours: the nine Set1 entries followed by the eight Set2 entries.
pub const PALETTE: [[u8; 3]; PALETTE_LEN] = [
    [0xe4, 0x1a, 0x1c],
    [0x37, 0x7e, 0xb8],
    [0x4d, 0xaf, 0x4a],
    [0x98, 0x4e, 0xa3],
    [0xff, 0x7f, 0x00],
    [0xff, 0xff, 0x33],
    [0xa6, 0x56, 0x28],
    [0xf7, 0x81, 0xbf],
    [0x99, 0x99, 0x99],
    [0x66, 0xc2, 0xa5],
    [0xfc, 0x8d, 0x62],
    [0x8d, 0xa0, 0xcb],
    [0xe7, 0x8a, 0xc3],
    [0xa6, 0xd8, 0x54],
    [0xff, 0xd9, 0x2f],
    [0xe5, 0xc4, 0x94],
    [0xb3, 0xb3, 0xb3],
];

/// Colour for a device index. Independent of how many devices exist.
#[must_use]
pub fn palette_color(index: DeviceId) -> [u8; 3] {
    PALETTE[index % PALETTE_LEN]
}

/// One legend row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    pub name: String,
    pub index: DeviceId,
    pub count: usize,
    pub color: [u8; 3],
}

/// Legend rows in device registration order.
pub fn legend<S: AnnotationStore>(registry: &AnnotationRegistry<S>) -> Vec<LegendEntry> {
    registry
        .devices()
        .iter()
        .map(|d| LegendEntry {
            name: d.name().to_string(),
            index: d.index(),
            count: d.count(),
            color: palette_color(d.index()),
        })
        .collect()
}

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusLevel {
    #[default]
    Info,
    Warning,
}

/// Single-line status shown above the panels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Status {
    pub text: String,
    pub level: StatusLevel,
}

impl Status {
    /// Informational message.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: StatusLevel::Info,
        }
    }

    /// Warning message (rendered in red).
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: StatusLevel::Warning,
        }
    }
}
