//! Modal device-name prompt.

use eframe::egui;
use elecpick_core::InputEvent;

use crate::app::ElecpickApp;

impl ElecpickApp {
    /// Show the prompt while the session waits for a device name.
    pub(crate) fn render_prompt(&mut self, ctx: &egui::Context) {
        if !self.session.is_prompting() {
            return;
        }

        let mut result = None;
        egui::Window::new("Device name")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Name of the grid, strip or depth:");
                let edit = ui.text_edit_singleline(&mut self.prompt_text);
                edit.request_focus();
                let (enter, escape) = ui.input(|i| {
                    (i.key_pressed(egui::Key::Enter), i.key_pressed(egui::Key::Escape))
                });
                ui.horizontal(|ui| {
                    if ui.button("OK").clicked() || enter {
                        result = Some(InputEvent::TextSubmitted(self.prompt_text.clone()));
                    }
                    if ui.button("Cancel").clicked() || escape {
                        result = Some(InputEvent::TextCancelled);
                    }
                });
            });

        if let Some(event) = result {
            self.prompt_text.clear();
            self.push_input(event);
            ctx.request_repaint();
        }
    }
}
