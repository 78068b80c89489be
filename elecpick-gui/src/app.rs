//! Main application state and logic.
//!
//! Contains the `ElecpickApp` struct which owns the annotation session,
//! forwards egui input to it and turns its frames into textures.

use eframe::egui;
use elecpick_core::{Flow, InputEvent, Key, Panel, Session};
use elecpick_io::JsonFileStore;
use log::error;

use crate::surface::EguiSurface;
use crate::ui::theme;
use crate::viewer::compose_panel;

/// Main application state.
pub struct ElecpickApp {
    /// Annotation session for the loaded subject.
    pub(crate) session: Session<JsonFileStore>,
    /// Input/frame buffer between egui and the session.
    pub(crate) surface: EguiSurface,
    /// One texture per panel, in [`Panel::ALL`] order.
    pub(crate) textures: [Option<egui::TextureHandle>; 4],
    /// Panel under the pointer, if any.
    pub(crate) focused: Option<Panel>,
    /// Text typed into the device-name prompt.
    pub(crate) prompt_text: String,
    /// Subject directory shown in the top bar.
    pub(crate) subject: String,
    /// Dark mode of the last applied theme.
    last_dark: Option<bool>,
}

impl ElecpickApp {
    pub fn new(session: Session<JsonFileStore>, subject: String) -> Self {
        Self {
            session,
            surface: EguiSurface::new(),
            textures: Default::default(),
            focused: None,
            prompt_text: String::new(),
            subject,
            last_dark: None,
        }
    }

    /// Queue an input event for the next pump.
    pub(crate) fn push_input(&mut self, event: InputEvent) {
        self.surface.push(event);
    }

    /// Translate pressed keys into session input.
    ///
    /// While the device-name prompt is open its text field owns the
    /// keyboard.
    fn collect_keys(&mut self, ctx: &egui::Context) {
        if self.session.is_prompting() {
            return;
        }
        let keys: Vec<egui::Key> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Key {
                        key, pressed: true, ..
                    } => Some(*key),
                    _ => None,
                })
                .collect()
        });
        for key in keys.into_iter().filter_map(map_key) {
            let panel = self.focused;
            self.push_input(InputEvent::Key { panel, key });
        }
    }

    /// Hand queued input to the session and refresh textures if it
    /// produced a new frame.
    fn pump(&mut self, ctx: &egui::Context) {
        match self.session.pump(&mut self.surface) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
            Err(e) => error!("Session refresh failed: {e}"),
        }
        if self.surface.take_fresh() {
            self.update_textures(ctx);
        }
    }

    fn update_textures(&mut self, ctx: &egui::Context) {
        let Some(frame) = self.surface.frame() else {
            return;
        };
        for panel in &frame.panels {
            let image = compose_panel(panel, frame);
            let slot = &mut self.textures[panel.panel.index()];
            match slot {
                Some(handle) => handle.set(image, egui::TextureOptions::NEAREST),
                None => {
                    *slot = Some(ctx.load_texture(
                        format!("panel-{}", panel.panel),
                        image,
                        egui::TextureOptions::NEAREST,
                    ));
                }
            }
        }
    }
}

/// Keys the session understands.
fn map_key(key: egui::Key) -> Option<Key> {
    let mapped = match key {
        egui::Key::N => Key::Char('n'),
        egui::Key::E => Key::Char('e'),
        egui::Key::U => Key::Char('u'),
        egui::Key::H => Key::Char('h'),
        egui::Key::S => Key::Char('s'),
        egui::Key::C => Key::Char('c'),
        egui::Key::A => Key::Char('a'),
        egui::Key::PageUp => Key::PageUp,
        egui::Key::PageDown => Key::PageDown,
        egui::Key::ArrowUp => Key::Up,
        egui::Key::ArrowDown => Key::Down,
        egui::Key::ArrowLeft => Key::Left,
        egui::Key::ArrowRight => Key::Right,
        egui::Key::Escape => Key::Escape,
        _ => return None,
    };
    Some(mapped)
}

impl eframe::App for ElecpickApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        theme::apply_system_theme(ctx, &mut self.last_dark);
        self.pump(ctx);

        self.render_top_panel(ctx);
        self.render_bottom_panel(ctx);
        self.render_side_panel(ctx);
        self.render_central_panel(ctx);
        self.render_prompt(ctx);
        self.collect_keys(ctx);

        if self.surface.has_pending() {
            ctx.request_repaint();
        }
    }
}
