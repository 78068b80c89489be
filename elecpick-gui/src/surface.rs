//! egui adapter for the session's [`Surface`] trait.
//!
//! egui is immediate-mode, so the adapter only buffers: input gathered while
//! drawing a frame is queued for the next [`Session::pump`], and rendered
//! frames are kept until the UI turns them into textures.
//!
//! [`Session::pump`]: elecpick_core::Session::pump

use std::collections::VecDeque;

use elecpick_core::{Frame, InputEvent, Panel, Surface};

/// Buffering [`Surface`] for the egui front-end.
#[derive(Debug, Default)]
pub struct EguiSurface {
    queue: VecDeque<InputEvent>,
    frame: Option<Frame>,
    cursors: [[f64; 2]; 4],
    fresh: bool,
}

impl EguiSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for the session.
    pub fn push(&mut self, event: InputEvent) {
        self.queue.push_back(event);
    }

    /// Whether input is waiting to be handled.
    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Latest rendered frame.
    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// Crosshair position last drawn for `panel`.
    pub fn cursor(&self, panel: Panel) -> [f64; 2] {
        self.cursors[panel.index()]
    }

    /// Returns true once per newly rendered frame.
    pub fn take_fresh(&mut self) -> bool {
        std::mem::take(&mut self.fresh)
    }
}

impl Surface for EguiSurface {
    fn render_panels(&mut self, frame: &Frame) {
        self.frame = Some(frame.clone());
        self.fresh = true;
    }

    fn draw_cursor(&mut self, panel: Panel, position: [f64; 2]) {
        self.cursors[panel.index()] = position;
    }

    fn capture_input(&mut self) -> Option<InputEvent> {
        self.queue.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elecpick_core::{
        Flow, Key, Layer, MemoryStore, Session, SessionConfig, VolumeStore, VoxelTransform,
    };
    use ndarray::Array3;

    fn session() -> Session<MemoryStore> {
        let volumes = VolumeStore::new(
            Array3::from_elem((16, 16, 16), 1.0),
            Array3::from_elem((16, 16, 16), f32::NAN),
        )
        .unwrap();
        Session::new(
            volumes,
            VoxelTransform::surface_ras([16, 16, 16]),
            MemoryStore::new(),
            SessionConfig::default(),
        )
    }

    #[test]
    fn test_pump_through_adapter() {
        let mut s = session();
        let mut surface = EguiSurface::new();
        assert_eq!(s.pump(&mut surface).unwrap(), Flow::Continue);
        assert!(surface.take_fresh());
        assert!(!surface.take_fresh());
        assert_eq!(surface.cursor(Panel::Axial), [8.0, 8.0]);

        surface.push(InputEvent::Key {
            panel: None,
            key: Key::Char('n'),
        });
        surface.push(InputEvent::TextSubmitted("grid".into()));
        surface.push(InputEvent::Click {
            panel: Panel::Axial,
            x: 3.0,
            y: 4.0,
        });
        surface.push(InputEvent::Key {
            panel: Some(Panel::Axial),
            key: Key::Char('e'),
        });
        s.pump(&mut surface).unwrap();
        assert!(!surface.has_pending());
        assert!(surface.take_fresh());
        assert_eq!(surface.cursor(Panel::Axial), [3.0, 4.0]);
        assert_eq!(surface.frame().unwrap().legend[0].count, 1);
        assert!((s.volumes().layer(Layer::Overlay)[[3, 4, 8]]).abs() < f32::EPSILON);
    }
}
