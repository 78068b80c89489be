#![allow(clippy::uninlined_format_args)]
use approx::assert_abs_diff_eq;
use elecpick_core::{
    AnnotationStore, Flow, Frame, InputEvent, Key, Layer, MemoryStore, Panel, Session,
    SessionConfig, Surface, VolumeStore, VoxelTransform,
};
use ndarray::Array3;
use std::collections::VecDeque;

/// Surface that replays a fixed script and records what was drawn.
#[derive(Default)]
struct ScriptedSurface {
    events: VecDeque<InputEvent>,
    frames: Vec<Frame>,
    cursors: Vec<(Panel, [f64; 2])>,
}

impl ScriptedSurface {
    fn new(events: Vec<InputEvent>) -> Self {
        Self {
            events: events.into(),
            ..Self::default()
        }
    }
}

impl Surface for ScriptedSurface {
    fn render_panels(&mut self, frame: &Frame) {
        self.frames.push(frame.clone());
    }

    fn draw_cursor(&mut self, panel: Panel, position: [f64; 2]) {
        self.cursors.push((panel, position));
    }

    fn capture_input(&mut self) -> Option<InputEvent> {
        self.events.pop_front()
    }
}

fn brain_session<S: AnnotationStore>(n: usize, store: S) -> Session<S> {
    let mri = Array3::from_elem((n, n, n), 100.0_f32);
    let mut ct = Array3::from_elem((n, n, n), f32::NAN);
    ct[[(n / 2 + 30).min(n - 1), n / 2, n / 2]] = 2500.0;
    let volumes = VolumeStore::new(mri, ct).unwrap();
    Session::new(
        volumes,
        VoxelTransform::surface_ras([n, n, n]),
        store,
        SessionConfig::default(),
    )
}

fn key(c: char) -> InputEvent {
    InputEvent::Key {
        panel: Some(Panel::Axial),
        key: Key::Char(c),
    }
}

fn named(name: &str) -> Vec<InputEvent> {
    vec![key('n'), InputEvent::TextSubmitted(name.to_string())]
}

#[test]
fn test_annotate_and_undo_at_center() {
    let mut session = brain_session(256, MemoryStore::new());
    let mut script = named("grid1");
    script.push(key('e'));
    let mut surface = ScriptedSurface::new(script);
    session.run(&mut surface).unwrap();

    let device = session.registry().device(0).unwrap();
    assert_eq!(device.name(), "grid1");
    assert_eq!(device.count(), 1);
    let p = device.points()[0];
    assert_abs_diff_eq!(p.anatomical[0], 0.0);
    assert_abs_diff_eq!(p.anatomical[1], 0.0);
    assert_abs_diff_eq!(p.anatomical[2], 0.0);
    assert_eq!(
        session.registry().store().record("grid1").unwrap(),
        &[[0.0, 0.0, 0.0]]
    );
    assert_abs_diff_eq!(
        session.volumes().layer(Layer::Overlay)[[128, 128, 128]],
        0.0
    );
    let last = surface.frames.last().unwrap();
    assert_eq!(last.legend[0].count, 1);
    assert!(last.status.text.contains("grid1 e0"));

    let mut surface = ScriptedSurface::new(vec![key('u')]);
    session.run(&mut surface).unwrap();
    assert!(session.registry().device(0).unwrap().points().is_empty());
    assert!(session
        .registry()
        .store()
        .record("grid1")
        .unwrap()
        .is_empty());
    assert!(session
        .volumes()
        .layer(Layer::Overlay)
        .iter()
        .all(|v| v.is_nan()));
}

#[test]
fn test_small_volumes_build_sessions() {
    for n in [16, 32] {
        let session = brain_session(n, MemoryStore::new());
        assert_eq!(session.volumes().shape(), [n, n, n]);
        assert_abs_diff_eq!(
            session.volumes().layer(Layer::Ct)[[n - 1, n / 2, n / 2]],
            2500.0
        );
    }
}

#[test]
fn test_run_refreshes_after_every_event() {
    let mut session = brain_session(32, MemoryStore::new());
    let mut surface = ScriptedSurface::new(vec![
        InputEvent::Click {
            panel: Panel::Axial,
            x: 4.0,
            y: 5.0,
        },
        InputEvent::Scroll {
            panel: Panel::Axial,
            steps: 1.0,
        },
    ]);
    session.run(&mut surface).unwrap();
    assert_eq!(surface.frames.len(), 3);
    assert_eq!(surface.cursors.len(), 12);
    assert!(surface
        .cursors
        .contains(&(Panel::Axial, [4.0, 5.0])));
}

#[test]
fn test_run_stops_at_escape() {
    let mut session = brain_session(16, MemoryStore::new());
    let mut surface = ScriptedSurface::new(vec![
        InputEvent::Key {
            panel: None,
            key: Key::Escape,
        },
        key('n'),
    ]);
    session.run(&mut surface).unwrap();
    assert_eq!(surface.frames.len(), 1);
    assert_eq!(surface.events.len(), 1);
    assert!(!session.is_prompting());
}

#[test]
fn test_pump_batches_events() {
    let mut session = brain_session(16, MemoryStore::new());
    let mut surface = ScriptedSurface::default();
    assert_eq!(session.pump(&mut surface).unwrap(), Flow::Continue);
    assert_eq!(surface.frames.len(), 1);

    assert_eq!(session.pump(&mut surface).unwrap(), Flow::Continue);
    assert_eq!(surface.frames.len(), 1);

    surface.events.extend([key('c'), key('a')]);
    session.pump(&mut surface).unwrap();
    assert_eq!(surface.frames.len(), 2);
    assert_eq!(surface.frames[1].projection_axis, elecpick_core::Axis::Axial);

    surface.events.push_back(InputEvent::Key {
        panel: None,
        key: Key::Escape,
    });
    assert_eq!(session.pump(&mut surface).unwrap(), Flow::Quit);
}

#[test]
fn test_first_projection_uses_initial_window() {
    // The only bright CT voxel sits 30 slices lateral of centre: outside the
    // initial band [-50, -20] and outside the live band [-15, 15] until the
    // cursor moves.
    let mut session = brain_session(64, MemoryStore::new());
    let mut surface = ScriptedSurface::new(vec![InputEvent::Click {
        panel: Panel::Coronal,
        x: 62.0,
        y: 32.0,
    }]);
    session.run(&mut surface).unwrap();

    let first = &surface.frames[0].panels[3];
    assert!(first.base.iter().all(|v| v.is_nan()));
    let second = &surface.frames[1].panels[3];
    assert_abs_diff_eq!(second.base[[32, 32]], 2500.0);
}

#[test]
fn test_devices_keep_colours_and_files_apart() {
    let mut session = brain_session(64, MemoryStore::new());
    let mut script = named("grid");
    script.push(key('e'));
    script.extend(named("strip"));
    script.push(InputEvent::Click {
        panel: Panel::Axial,
        x: 10.0,
        y: 10.0,
    });
    script.push(key('e'));
    script.push(key('e'));
    script.extend(named("grid"));
    script.push(key('e'));
    let mut surface = ScriptedSurface::new(script);
    session.run(&mut surface).unwrap();

    let store = session.registry().store();
    assert_eq!(store.record("grid").unwrap().len(), 2);
    assert_eq!(store.record("strip").unwrap().len(), 2);
    assert_eq!(store.writes(), 4);

    let legend = &surface.frames.last().unwrap().legend;
    assert_eq!(legend.len(), 2);
    assert_eq!(legend[0].name, "grid");
    assert_eq!(legend[1].color, elecpick_core::PALETTE[1]);
    // Both devices marked the same voxel; the most recent marker wins.
    assert_abs_diff_eq!(
        session.volumes().layer(Layer::Overlay)[[10, 10, 32]],
        0.0
    );
}

#[test]
fn test_undo_keeps_overlapping_neighbour() {
    let mut session = brain_session(64, MemoryStore::new());
    let mut script = named("depth");
    script.push(key('e'));
    script.push(InputEvent::Click {
        panel: Panel::Axial,
        x: 34.0,
        y: 32.0,
    });
    script.push(key('e'));
    script.push(key('u'));
    let mut surface = ScriptedSurface::new(script);
    session.run(&mut surface).unwrap();

    let overlay = session.volumes().layer(Layer::Overlay);
    assert_abs_diff_eq!(overlay[[32, 32, 32]], 0.0);
    assert_abs_diff_eq!(overlay[[33, 32, 32]], 0.0);
    assert!(overlay[[36, 32, 32]].is_nan());
    assert_eq!(session.registry().device(0).unwrap().count(), 1);
}
