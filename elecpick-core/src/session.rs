//! Interaction controller.
//!
//! A [`Session`] owns the volumes, the annotation registry and all view
//! state. Front-ends feed it [`InputEvent`]s and receive rendered [`Frame`]s
//! through the [`Surface`] trait, so the controller runs the same way under a
//! real window and under a scripted test surface.
//!
//! Naming a device is a modal sub-state: `n` opens the prompt, and the
//! session then waits for [`InputEvent::TextSubmitted`] or
//! [`InputEvent::TextCancelled`] instead of blocking on a read.
#![allow(clippy::cast_precision_loss)]

use log::{debug, info, warn};
use ndarray::Array2;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::geometry::{Axis, Panel};
use crate::legend::{legend, LegendEntry, Status};
use crate::registry::{
    device_tag, round_voxel, AnnotationPoint, AnnotationRegistry, AnnotationStore, DeviceId,
};
use crate::transform::VoxelTransform;
use crate::volume::{Layer, VolumeStore};

/// Key help shown for `h`.
pub const HELP_TEXT: &str = "'n': name device, 'e': add electrode, 'u': remove electrode | \
    MIP view: 's' sagittal, 'c' coronal, 'a' axial | \
    scroll to zoom, arrows to pan, PgUp/PgDn or click to change slice";

/// Status shown when the session starts.
pub const WELCOME_TEXT: &str =
    "Press 'n' to name a device, 'e' to add an electrode at the crosshair, 'h' for help";

/// Keys the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    Escape,
}

/// Input delivered by a front-end.
///
/// Panel coordinates are in display units: `x` along the panel's horizontal
/// voxel axis, `y` along its vertical one.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer click inside a panel.
    Click { panel: Panel, x: f64, y: f64 },
    /// Scroll wheel over a panel; positive steps zoom in.
    Scroll { panel: Panel, steps: f64 },
    /// Key press; `panel` is the panel under the pointer, if any.
    Key { panel: Option<Panel>, key: Key },
    /// Device name entered in the prompt.
    TextSubmitted(String),
    /// Prompt dismissed without a name.
    TextCancelled,
}

/// Whether the event loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Visible region of a panel in display units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl ViewBounds {
    /// Bounds covering a `width` x `height` plane.
    #[must_use]
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            x: (0.0, width as f64),
            y: (0.0, height as f64),
        }
    }

    /// Move every edge inward by `amount` (outward if negative), keeping the
    /// centre fixed and never going below `min_extent`.
    pub fn zoom(&mut self, amount: f64, min_extent: f64) {
        self.x = shrink(self.x, amount, min_extent);
        self.y = shrink(self.y, amount, min_extent);
    }

    /// Shift the bounds.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.x = (self.x.0 + dx, self.x.1 + dx);
        self.y = (self.y.0 + dy, self.y.1 + dy);
    }

    /// Width and height.
    #[must_use]
    pub fn extent(&self) -> (f64, f64) {
        (self.x.1 - self.x.0, self.y.1 - self.y.0)
    }
}

fn shrink((lo, hi): (f64, f64), amount: f64, min_extent: f64) -> (f64, f64) {
    let (new_lo, new_hi) = (lo + amount, hi - amount);
    if new_hi - new_lo >= min_extent {
        (new_lo, new_hi)
    } else {
        let center = (lo + hi) / 2.0;
        (center - min_extent / 2.0, center + min_extent / 2.0)
    }
}

/// Everything needed to draw one panel.
#[derive(Debug, Clone)]
pub struct PanelFrame {
    pub panel: Panel,
    /// Axis the panel slices (or projects) along.
    pub axis: Axis,
    /// MRI slice, or the CT projection for [`Panel::Projection`].
    pub base: Array2<f32>,
    /// CT slice drawn over the MRI; `None` for the projection panel.
    pub ct: Option<Array2<f32>>,
    /// Annotation overlay slice through the cursor.
    pub overlay: Array2<f32>,
    /// Cursor position in panel coordinates.
    pub cursor: [f64; 2],
    pub bounds: ViewBounds,
    /// Horizontal and vertical axis labels.
    pub labels: (&'static str, &'static str),
}

/// A complete view of the session state.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Panels in [`Panel::ALL`] order.
    pub panels: Vec<PanelFrame>,
    pub legend: Vec<LegendEntry>,
    pub status: Status,
    /// Whether the device-name prompt is open.
    pub prompt: bool,
    /// Name of the device new electrodes go to.
    pub device: Option<String>,
    pub projection_axis: Axis,
    pub cursor: [f64; 3],
    /// Cursor in surface RAS.
    pub anatomical: [f64; 3],
    /// Grayscale window for the MRI.
    pub mri_window: (f32, f32),
    /// Colormap range for the CT.
    pub ct_range: (f32, f32),
}

/// Rendering and input capability the controller drives.
pub trait Surface {
    /// Draw all panel images, the legend and the status line.
    fn render_panels(&mut self, frame: &Frame);

    /// Draw the crosshair of `panel` at `position` (panel coordinates).
    fn draw_cursor(&mut self, panel: Panel, position: [f64; 2]);

    /// Next pending input, or `None` when there is none (or the surface
    /// closed).
    fn capture_input(&mut self) -> Option<InputEvent>;
}

/// One annotation session over a subject's volumes.
#[derive(Debug)]
pub struct Session<S> {
    volumes: VolumeStore,
    transform: VoxelTransform,
    registry: AnnotationRegistry<S>,
    config: SessionConfig,
    cursor: [f64; 3],
    projection_axis: Axis,
    bounds: [ViewBounds; 4],
    current: Option<DeviceId>,
    last_added: Option<DeviceId>,
    status: Status,
    prompt: bool,
    initial_frame: bool,
    mri_window: (f32, f32),
}

impl<S: AnnotationStore> Session<S> {
    /// Start a session with the cursor at the volume centre.
    pub fn new(
        volumes: VolumeStore,
        transform: VoxelTransform,
        store: S,
        config: SessionConfig,
    ) -> Self {
        let shape = volumes.shape();
        let (low_pct, high_pct) = config.mri_percentiles;
        let mri_window = volumes
            .intensity_window(Layer::Mri, low_pct, high_pct)
            .unwrap_or((0.0, 1.0));
        let bounds = Panel::ALL.map(|panel| {
            let (h, v) = panel.slice_axis(Axis::Sagittal).plane_axes();
            ViewBounds::full(shape[h.index()], shape[v.index()])
        });
        info!(
            "Session over {}x{}x{} volume, MRI window {:.1}..{:.1}",
            shape[0], shape[1], shape[2], mri_window.0, mri_window.1
        );

        Self {
            volumes,
            transform,
            registry: AnnotationRegistry::new(store),
            config,
            cursor: shape.map(|n| (n / 2) as f64),
            projection_axis: Axis::Sagittal,
            bounds,
            current: None,
            last_added: None,
            status: Status::info(WELCOME_TEXT),
            prompt: false,
            initial_frame: true,
            mri_window,
        }
    }

    pub fn volumes(&self) -> &VolumeStore {
        &self.volumes
    }

    pub fn registry(&self) -> &AnnotationRegistry<S> {
        &self.registry
    }

    pub fn transform(&self) -> &VoxelTransform {
        &self.transform
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn cursor(&self) -> [f64; 3] {
        self.cursor
    }

    /// Move the cursor, clamping every axis to the volume.
    ///
    /// Non-finite components leave that axis unchanged.
    pub fn set_cursor(&mut self, cursor: [f64; 3]) {
        for axis in Axis::ALL {
            self.set_cursor_axis(axis, cursor[axis.index()]);
        }
    }

    fn set_cursor_axis(&mut self, axis: Axis, value: f64) {
        if !value.is_finite() {
            debug!("Ignoring non-finite {axis} cursor value");
            return;
        }
        let max = self.volumes.len(axis).saturating_sub(1) as f64;
        self.cursor[axis.index()] = value.clamp(0.0, max);
    }

    /// Cursor rounded to voxel indices.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn cursor_index(&self) -> [usize; 3] {
        let shape = self.volumes.shape();
        let mut idx = [0; 3];
        for i in 0..3 {
            let max = shape[i].saturating_sub(1);
            idx[i] = (self.cursor[i].round().max(0.0) as usize).min(max);
        }
        idx
    }

    pub fn projection_axis(&self) -> Axis {
        self.projection_axis
    }

    /// Change the axis the projection panel collapses.
    pub fn set_projection_axis(&mut self, axis: Axis) {
        if axis == self.projection_axis {
            return;
        }
        self.projection_axis = axis;
        let (h, v) = axis.plane_axes();
        self.bounds[Panel::Projection.index()] =
            ViewBounds::full(self.volumes.len(h), self.volumes.len(v));
        debug!("Projection axis set to {axis}");
    }

    pub fn bounds(&self, panel: Panel) -> ViewBounds {
        self.bounds[panel.index()]
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_prompting(&self) -> bool {
        self.prompt
    }

    /// Device new electrodes are added to.
    pub fn current_device(&self) -> Option<DeviceId> {
        self.current
    }

    /// Apply one input event.
    pub fn handle(&mut self, event: InputEvent) -> Flow {
        debug!("Input: {event:?}");
        if self.prompt {
            self.handle_prompt(event);
            return Flow::Continue;
        }
        match event {
            InputEvent::Click { panel, x, y } => self.click(panel, x, y),
            InputEvent::Scroll { panel, steps } => {
                let amount = self.config.zoom_step * steps;
                self.bounds[panel.index()].zoom(amount, self.config.min_view_extent);
            }
            InputEvent::Key { panel, key } => return self.key(panel, key),
            InputEvent::TextSubmitted(_) | InputEvent::TextCancelled => {
                debug!("Text input without an open prompt");
            }
        }
        Flow::Continue
    }

    fn handle_prompt(&mut self, event: InputEvent) {
        match event {
            InputEvent::TextSubmitted(name) => {
                self.prompt = false;
                if let Err(e) = self.select_device(&name) {
                    warn!("Device selection failed: {e}");
                    self.status = Status::warning(format!("Could not select device: {e}"));
                }
            }
            InputEvent::TextCancelled
            | InputEvent::Key {
                key: Key::Escape, ..
            } => {
                self.prompt = false;
                self.status = Status::info("Device naming cancelled");
            }
            _ => {}
        }
    }

    fn click(&mut self, panel: Panel, x: f64, y: f64) {
        let (h, v) = panel.slice_axis(self.projection_axis).plane_axes();
        self.set_cursor_axis(h, x);
        self.set_cursor_axis(v, y);
    }

    fn key(&mut self, panel: Option<Panel>, key: Key) -> Flow {
        match key {
            Key::Escape => {
                info!("Session closed");
                return Flow::Quit;
            }
            Key::Char('n') => {
                self.prompt = true;
                self.status = Status::info("Enter electrode device name");
            }
            Key::Char('e') => self.add_from_key(),
            Key::Char('u') => self.undo_from_key(),
            Key::Char('h') => self.status = Status::info(HELP_TEXT),
            Key::Char(c) => {
                if let Some(axis) = Axis::from_key(c) {
                    self.set_projection_axis(axis);
                }
            }
            Key::PageUp | Key::PageDown => {
                let delta = if key == Key::PageUp { 1.0 } else { -1.0 };
                if let Some(panel) = panel {
                    let axis = panel.slice_axis(self.projection_axis);
                    self.set_cursor_axis(axis, self.cursor[axis.index()] + delta);
                }
            }
            Key::Up | Key::Down | Key::Left | Key::Right => {
                if let Some(panel) = panel {
                    let step = self.config.pan_step;
                    let (dx, dy) = match key {
                        Key::Up => (0.0, -step),
                        Key::Down => (0.0, step),
                        Key::Left => (step, 0.0),
                        _ => (-step, 0.0),
                    };
                    self.bounds[panel.index()].pan(dx, dy);
                }
            }
        }
        Flow::Continue
    }

    fn add_from_key(&mut self) {
        match self.add_annotation() {
            Ok(_) => {}
            Err(Error::NoDeviceSelected) => {
                self.status = Status::warning(
                    "Please name device with 'n' key before selecting electrode with 'e'",
                );
            }
            Err(e) => {
                warn!("Adding electrode failed: {e}");
                self.status = Status::warning(format!("Could not add electrode: {e}"));
            }
        }
    }

    fn undo_from_key(&mut self) {
        match self.undo() {
            Ok(_) => {}
            Err(Error::NoAnnotationToRemove) => {
                self.status = Status::info("Nothing to remove");
            }
            Err(e) => {
                warn!("Removing electrode failed: {e}");
                self.status = Status::warning(format!("Could not remove electrode: {e}"));
            }
        }
    }

    /// Make `name` the current device, registering it if new.
    ///
    /// A device without points picks up any previously persisted record,
    /// whose markers are redrawn on the overlay.
    ///
    /// # Errors
    /// Returns the registry's error for invalid names or unreadable records.
    pub fn select_device(&mut self, name: &str) -> Result<DeviceId> {
        let id = self.registry.select_device(name)?;
        let loaded = self.registry.load_existing(id, &self.transform)?;
        let device = self.registry.device(id)?;
        if loaded > 0 {
            let tag = device_tag(id);
            for point in device.points() {
                self.volumes
                    .stamp_sphere(point.voxel, self.config.stamp_radius, tag);
            }
        }
        let text = if loaded > 0 {
            format!(
                "Click on electrodes for device number {id}, {} (loaded {loaded} saved electrode(s), next is e{})",
                device.name(),
                device.count()
            )
        } else {
            format!("Click on electrodes for device number {id}, {}", device.name())
        };
        self.status = Status::info(text);
        self.current = Some(id);
        Ok(id)
    }

    /// Annotate the current device at the cursor.
    ///
    /// Returns the new electrode number.
    ///
    /// # Errors
    /// Returns [`Error::NoDeviceSelected`] without a current device, or the
    /// store's error (the overlay is then left untouched).
    pub fn add_annotation(&mut self) -> Result<usize> {
        let id = self.current.ok_or(Error::NoDeviceSelected)?;
        let voxel = self.cursor.map(round_voxel);
        let anatomical = self.transform.to_anatomical(self.cursor);
        let number = self.registry.add(id, anatomical, voxel)?;
        self.volumes
            .stamp_sphere(voxel, self.config.stamp_radius, device_tag(id));
        self.last_added = Some(id);

        let name = self.registry.device(id)?.name();
        self.status = Status::info(format!(
            "{name} e{number} surface RAS = [{:.3}, {:.3}, {:.3}]",
            anatomical[0], anatomical[1], anatomical[2]
        ));
        info!("{name} e{number} at voxel {voxel:?}, RAS {anatomical:?}");
        Ok(number)
    }

    /// Remove the session's most recent annotation.
    ///
    /// Undo is single-level: after one removal there is nothing left to
    /// undo until the next annotation is added.
    ///
    /// # Errors
    /// Returns [`Error::NoAnnotationToRemove`] when there is nothing to
    /// undo, or the store's error.
    pub fn undo(&mut self) -> Result<AnnotationPoint> {
        let id = self.last_added.ok_or(Error::NoAnnotationToRemove)?;
        let point = self.registry.remove_last(id)?;
        self.last_added = None;
        let stamps = self.registry.stamps();
        self.volumes
            .repaint_sphere(point.voxel, self.config.stamp_radius, &stamps);

        let device = self.registry.device(id)?;
        self.status = Status::info(format!("Removed {} e{}", device.name(), device.count()));
        info!("Removed {} e{}", device.name(), device.count());
        Ok(point)
    }

    /// Build the frame for the current state.
    ///
    /// # Errors
    /// Only fails if the cursor is outside the volume, which clamping
    /// prevents.
    pub fn frame(&self) -> Result<Frame> {
        let idx = self.cursor_index();
        let panels = Panel::ALL
            .iter()
            .map(|&panel| self.panel_frame(panel, idx))
            .collect::<Result<Vec<_>>>()?;
        Ok(Frame {
            panels,
            legend: legend(&self.registry),
            status: self.status.clone(),
            prompt: self.prompt,
            device: self
                .current
                .and_then(|id| self.registry.device(id).ok())
                .map(|d| d.name().to_string()),
            projection_axis: self.projection_axis,
            cursor: self.cursor,
            anatomical: self.transform.to_anatomical(self.cursor),
            mri_window: self.mri_window,
            ct_range: self.config.ct_display_range,
        })
    }

    fn panel_frame(&self, panel: Panel, idx: [usize; 3]) -> Result<PanelFrame> {
        let axis = panel.slice_axis(self.projection_axis);
        let index = idx[axis.index()];
        let (base, ct) = if panel == Panel::Projection {
            let window = if self.initial_frame {
                self.config.initial_projection
            } else {
                self.config.projection
            };
            (self.volumes.projection(axis, index, window), None)
        } else {
            (
                self.volumes.slice(Layer::Mri, axis, index)?,
                Some(self.volumes.slice(Layer::Ct, axis, index)?),
            )
        };
        let (h, v) = axis.plane_axes();
        Ok(PanelFrame {
            panel,
            axis,
            base,
            ct,
            overlay: self.volumes.slice(Layer::Overlay, axis, index)?,
            cursor: [self.cursor[h.index()], self.cursor[v.index()]],
            bounds: self.bounds[panel.index()],
            labels: panel.axis_labels(self.projection_axis),
        })
    }

    /// Re-derive every panel from the current state and push it to
    /// `surface`.
    ///
    /// # Errors
    /// Propagates [`Session::frame`] errors.
    pub fn refresh<D: Surface + ?Sized>(&mut self, surface: &mut D) -> Result<()> {
        let frame = self.frame()?;
        self.initial_frame = false;
        surface.render_panels(&frame);
        for panel in &frame.panels {
            surface.draw_cursor(panel.panel, panel.cursor);
        }
        Ok(())
    }

    /// Blocking event loop: refresh after every event until the surface
    /// runs dry or the user quits.
    ///
    /// # Errors
    /// Propagates [`Session::refresh`] errors.
    pub fn run<D: Surface + ?Sized>(&mut self, surface: &mut D) -> Result<()> {
        self.refresh(surface)?;
        while let Some(event) = surface.capture_input() {
            if self.handle(event) == Flow::Quit {
                break;
            }
            self.refresh(surface)?;
        }
        Ok(())
    }

    /// Non-blocking step for immediate-mode front-ends: apply all pending
    /// events, then refresh once if anything happened.
    ///
    /// # Errors
    /// Propagates [`Session::refresh`] errors.
    pub fn pump<D: Surface + ?Sized>(&mut self, surface: &mut D) -> Result<Flow> {
        let mut dirty = self.initial_frame;
        while let Some(event) = surface.capture_input() {
            dirty = true;
            if self.handle(event) == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }
        if dirty {
            self.refresh(surface)?;
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryStore;
    use approx::assert_abs_diff_eq;
    use ndarray::Array3;

    fn session(n: usize) -> Session<MemoryStore> {
        session_with_store(n, MemoryStore::new())
    }

    fn session_with_store(n: usize, store: MemoryStore) -> Session<MemoryStore> {
        let mri = Array3::from_shape_fn((n, n, n), |(i, j, k)| (i + j + k) as f32);
        let ct = Array3::from_elem((n, n, n), f32::NAN);
        let volumes = VolumeStore::new(mri, ct).unwrap();
        Session::new(
            volumes,
            VoxelTransform::surface_ras([n, n, n]),
            store,
            SessionConfig::default(),
        )
    }

    fn key(s: &mut Session<MemoryStore>, c: char) -> Flow {
        s.handle(InputEvent::Key {
            panel: Some(Panel::Axial),
            key: Key::Char(c),
        })
    }

    fn name_device(s: &mut Session<MemoryStore>, name: &str) {
        key(s, 'n');
        s.handle(InputEvent::TextSubmitted(name.to_string()));
    }

    #[test]
    fn test_cursor_starts_centered() {
        let s = session(32);
        assert_eq!(s.cursor(), [16.0, 16.0, 16.0]);
    }

    #[test]
    fn test_click_sets_in_plane_axes() {
        let mut s = session(32);
        s.handle(InputEvent::Click {
            panel: Panel::Coronal,
            x: 3.4,
            y: 20.0,
        });
        assert_eq!(s.cursor(), [3.4, 16.0, 20.0]);

        s.handle(InputEvent::Click {
            panel: Panel::Sagittal,
            x: 100.0,
            y: -4.0,
        });
        assert_eq!(s.cursor(), [3.4, 31.0, 0.0]);
    }

    #[test]
    fn test_click_on_projection_follows_axis() {
        let mut s = session(32);
        key(&mut s, 'a');
        s.handle(InputEvent::Click {
            panel: Panel::Projection,
            x: 5.0,
            y: 6.0,
        });
        assert_eq!(s.cursor(), [5.0, 6.0, 16.0]);
    }

    #[test]
    fn test_page_keys_move_along_focused_axis() {
        let mut s = session(32);
        s.handle(InputEvent::Key {
            panel: Some(Panel::Coronal),
            key: Key::PageUp,
        });
        assert_eq!(s.cursor(), [16.0, 17.0, 16.0]);
        s.handle(InputEvent::Key {
            panel: Some(Panel::Projection),
            key: Key::PageDown,
        });
        assert_eq!(s.cursor(), [15.0, 17.0, 16.0]);
        s.handle(InputEvent::Key {
            panel: None,
            key: Key::PageDown,
        });
        assert_eq!(s.cursor(), [15.0, 17.0, 16.0]);
    }

    #[test]
    fn test_page_keys_clamp_at_edge() {
        let mut s = session(4);
        for _ in 0..10 {
            s.handle(InputEvent::Key {
                panel: Some(Panel::Axial),
                key: Key::PageUp,
            });
        }
        assert_eq!(s.cursor()[2], 3.0);
    }

    #[test]
    fn test_scroll_zooms_about_center() {
        let mut s = session(256);
        s.handle(InputEvent::Scroll {
            panel: Panel::Axial,
            steps: 1.0,
        });
        let b = s.bounds(Panel::Axial);
        assert_abs_diff_eq!(b.x.0, 10.0);
        assert_abs_diff_eq!(b.x.1, 246.0);
        assert_abs_diff_eq!(b.y.0, 10.0);
        assert_eq!(s.bounds(Panel::Sagittal), ViewBounds::full(256, 256));
        assert_eq!(s.cursor(), [128.0, 128.0, 128.0]);
    }

    #[test]
    fn test_zoom_never_collapses() {
        let mut b = ViewBounds::full(20, 20);
        b.zoom(50.0, 1.0);
        assert_abs_diff_eq!(b.extent().0, 1.0);
        assert_abs_diff_eq!(b.x.0, 9.5);
    }

    #[test]
    fn test_arrows_pan_without_moving_cursor() {
        let mut s = session(64);
        s.handle(InputEvent::Key {
            panel: Some(Panel::Sagittal),
            key: Key::Right,
        });
        s.handle(InputEvent::Key {
            panel: Some(Panel::Sagittal),
            key: Key::Up,
        });
        let b = s.bounds(Panel::Sagittal);
        assert_abs_diff_eq!(b.x.0, -1.0);
        assert_abs_diff_eq!(b.y.0, -1.0);
        assert_eq!(s.cursor(), [32.0, 32.0, 32.0]);
    }

    #[test]
    fn test_add_without_device_warns() {
        let mut s = session(32);
        key(&mut s, 'e');
        assert_eq!(s.status().level, crate::legend::StatusLevel::Warning);
        assert!(s.registry().devices().is_empty());
        assert!(s
            .volumes()
            .layer(Layer::Overlay)
            .iter()
            .all(|v| v.is_nan()));
    }

    #[test]
    fn test_prompt_swallows_other_input() {
        let mut s = session(32);
        key(&mut s, 'n');
        assert!(s.is_prompting());
        s.handle(InputEvent::Click {
            panel: Panel::Axial,
            x: 1.0,
            y: 1.0,
        });
        assert_eq!(s.cursor(), [16.0, 16.0, 16.0]);
        assert_eq!(key(&mut s, 'e'), Flow::Continue);
        s.handle(InputEvent::TextSubmitted("grid".to_string()));
        assert!(!s.is_prompting());
        assert_eq!(s.current_device(), Some(0));
    }

    #[test]
    fn test_prompt_escape_cancels_instead_of_quitting() {
        let mut s = session(32);
        key(&mut s, 'n');
        let flow = s.handle(InputEvent::Key {
            panel: None,
            key: Key::Escape,
        });
        assert_eq!(flow, Flow::Continue);
        assert!(!s.is_prompting());
        assert_eq!(s.current_device(), None);
        assert_eq!(
            s.handle(InputEvent::Key {
                panel: None,
                key: Key::Escape
            }),
            Flow::Quit
        );
    }

    #[test]
    fn test_invalid_name_keeps_previous_device() {
        let mut s = session(32);
        name_device(&mut s, "grid");
        name_device(&mut s, "   ");
        assert_eq!(s.current_device(), Some(0));
        assert_eq!(s.status().level, crate::legend::StatusLevel::Warning);
    }

    #[test]
    fn test_add_stamps_overlay_with_device_tag() {
        let mut s = session(32);
        name_device(&mut s, "a");
        name_device(&mut s, "b");
        key(&mut s, 'e');
        let overlay = s.volumes().layer(Layer::Overlay);
        assert_abs_diff_eq!(overlay[[16, 16, 16]], 1.0);
        assert_abs_diff_eq!(overlay[[16, 16, 18]], 1.0);
        assert!(overlay[[16, 16, 19]].is_nan());
        assert!(s.status().text.starts_with("b e0 surface RAS"));
    }

    #[test]
    fn test_undo_is_single_level() {
        let mut s = session(32);
        name_device(&mut s, "grid");
        key(&mut s, 'e');
        s.set_cursor([5.0, 5.0, 5.0]);
        key(&mut s, 'e');
        key(&mut s, 'u');
        assert_eq!(s.registry().device(0).unwrap().count(), 1);
        key(&mut s, 'u');
        assert_eq!(s.registry().device(0).unwrap().count(), 1);
        assert_eq!(s.status().text, "Nothing to remove");
    }

    #[test]
    fn test_reselecting_device_loads_saved_points_once() {
        let store = MemoryStore::new().with_record("depth", vec![[0.0, 0.0, 0.0]]);
        let mut s = session_with_store(256, store);
        name_device(&mut s, "depth");
        assert_eq!(s.registry().device(0).unwrap().count(), 1);
        assert_abs_diff_eq!(s.volumes().layer(Layer::Overlay)[[128, 128, 128]], 0.0);
        name_device(&mut s, "depth");
        assert_eq!(s.registry().device(0).unwrap().count(), 1);
        assert_eq!(s.registry().store().writes(), 0);
    }

    #[test]
    fn test_projection_axis_keys() {
        let mut s = session(16);
        key(&mut s, 'c');
        assert_eq!(s.projection_axis(), Axis::Coronal);
        key(&mut s, 'x');
        assert_eq!(s.projection_axis(), Axis::Coronal);
        key(&mut s, 's');
        assert_eq!(s.projection_axis(), Axis::Sagittal);
    }

    #[test]
    fn test_frame_cursor_positions() {
        let mut s = session(32);
        s.set_cursor([1.0, 2.0, 3.0]);
        key(&mut s, 'a');
        let frame = s.frame().unwrap();
        assert_eq!(frame.panels[0].cursor, [2.0, 3.0]);
        assert_eq!(frame.panels[1].cursor, [1.0, 3.0]);
        assert_eq!(frame.panels[2].cursor, [1.0, 2.0]);
        assert_eq!(frame.panels[3].cursor, [1.0, 2.0]);
        assert_eq!(frame.panels[3].axis, Axis::Axial);
        assert!(frame.panels[3].ct.is_none());
    }

    #[test]
    fn test_escape_quits() {
        let mut s = session(8);
        assert_eq!(
            s.handle(InputEvent::Key {
                panel: None,
                key: Key::Escape
            }),
            Flow::Quit
        );
    }
}
