//! elecpick-core: Volume model, annotation registry and interaction session
//! for picking intracranial electrode positions on co-registered MRI and CT.
//!
//! This crate has no file or GUI dependencies. Loading NIfTI volumes and
//! persisting annotations live in `elecpick-io`; the viewer in `elecpick-gui`
//! drives a [`Session`] through the [`Surface`] trait.
//!

pub mod config;
pub mod error;
pub mod geometry;
pub mod legend;
pub mod registry;
pub mod session;
pub mod transform;
pub mod volume;

pub use config::SessionConfig;
pub use error::{Error, Result};
pub use geometry::{Axis, Panel};
pub use legend::{legend, palette_color, LegendEntry, Status, StatusLevel, PALETTE, PALETTE_LEN};
pub use registry::{
    device_tag, round_voxel, validate_device_name, AnnotationPoint, AnnotationRegistry,
    AnnotationStore, Device, DeviceId, MemoryStore,
};
pub use session::{
    Flow, Frame, InputEvent, Key, PanelFrame, Session, Surface, ViewBounds, HELP_TEXT, WELCOME_TEXT,
};
pub use transform::{Affine, VoxelTransform, SURFACE_RAS_VOX2RAS};
pub use volume::{Layer, ProjectionWindow, VolumeStore};
