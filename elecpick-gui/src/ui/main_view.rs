//! Main view (central panel) rendering.
//!
//! Four linked plots in a 2x2 grid: sagittal, coronal and axial slices
//! through the cursor, and the CT projection.

use eframe::egui;
use egui_plot::{HLine, Plot, PlotBounds, PlotImage, PlotPoint, VLine};
use elecpick_core::{InputEvent, Panel};

use super::theme::accent;
use crate::app::ElecpickApp;
use crate::util::usize_to_f64;

impl ElecpickApp {
    /// Render the central panel with the four views.
    pub(crate) fn render_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.surface.frame().is_none() {
                ui.centered_and_justified(|ui| ui.label("Loading..."));
                return;
            }

            let spacing = ui.spacing().item_spacing;
            let avail = ui.available_size();
            let cell = egui::vec2(
                ((avail.x - spacing.x) / 2.0).max(64.0),
                ((avail.y - spacing.y) / 2.0).max(64.0),
            );

            let mut hovered = None;
            for row in Panel::ALL.chunks(2) {
                ui.horizontal(|ui| {
                    for &panel in row {
                        ui.allocate_ui(cell, |ui| {
                            if self.render_panel(ui, panel, cell) {
                                hovered = Some(panel);
                            }
                        });
                    }
                });
            }
            self.focused = hovered;
        });
    }

    /// Draw one panel and queue its pointer input. Returns whether the
    /// pointer is over it.
    #[allow(clippy::cast_possible_truncation)]
    fn render_panel(&mut self, ui: &mut egui::Ui, panel: Panel, size: egui::Vec2) -> bool {
        let Some(frame) = self.surface.frame() else {
            return false;
        };
        let Some(view) = frame.panels.get(panel.index()) else {
            return false;
        };
        let (width, height) = view.base.dim();
        let (w, h) = (usize_to_f64(width), usize_to_f64(height));
        let bounds = view.bounds;
        let (x_label, y_label) = view.labels;
        let title = format!("{panel} ({})", view.axis);
        let cursor = self.surface.cursor(panel);
        let texture = self.textures[panel.index()].clone();

        let response = Plot::new(format!("plot-{panel}"))
            .width(size.x)
            .height(size.y)
            .data_aspect(1.0)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false)
            .allow_double_click_reset(false)
            .show_grid(false)
            .x_axis_label(x_label)
            .y_axis_label(y_label)
            .show(ui, |plot_ui| {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                    [bounds.x.0, bounds.y.0],
                    [bounds.x.1, bounds.y.1],
                ));
                if let Some(tex) = &texture {
                    // Pixel centres sit on integer voxel coordinates.
                    plot_ui.image(PlotImage::new(
                        tex,
                        PlotPoint::new((w - 1.0) / 2.0, (h - 1.0) / 2.0),
                        [w as f32, h as f32],
                    ));
                }
                plot_ui.vline(VLine::new(cursor[0]).color(accent::CROSSHAIR).width(1.0));
                plot_ui.hline(HLine::new(cursor[1]).color(accent::CROSSHAIR).width(1.0));
                plot_ui.pointer_coordinate()
            });

        ui.painter().text(
            response.response.rect.left_top() + egui::vec2(6.0, 4.0),
            egui::Align2::LEFT_TOP,
            title,
            egui::FontId::monospace(11.0),
            accent::CROSSHAIR,
        );

        let hovered = response.response.hovered();
        if response.response.clicked() {
            if let Some(p) = response.inner {
                self.push_input(InputEvent::Click {
                    panel,
                    x: p.x,
                    y: p.y,
                });
            }
        }
        if hovered {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                // Scrolling down zooms in.
                let steps = if scroll < 0.0 { 1.0 } else { -1.0 };
                self.push_input(InputEvent::Scroll { panel, steps });
            }
        }
        hovered
    }
}
