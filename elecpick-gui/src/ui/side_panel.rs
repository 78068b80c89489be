//! Legend sidebar plus top and bottom bars.

use eframe::egui::{self, Rounding};
use elecpick_core::{palette_color, Frame, HELP_TEXT};

use super::theme::{accent, section_header, stat_label, stat_value, ThemeColors};
use crate::app::ElecpickApp;
use crate::util::format_triplet;

impl ElecpickApp {
    /// Render the top bar with the subject directory and current device.
    pub(crate) fn render_top_panel(&self, ctx: &egui::Context) {
        let colors = ThemeColors::from_ctx(ctx);

        egui::TopBottomPanel::top("top_bar")
            .frame(
                egui::Frame::none()
                    .fill(colors.bg_header)
                    .inner_margin(egui::Margin::symmetric(16.0, 8.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("ELECPICK").strong().color(accent::BLUE));
                    ui.label(egui::RichText::new(&self.subject).color(colors.text_muted));
                    let device = self
                        .surface
                        .frame()
                        .and_then(|f| f.device.as_deref())
                        .unwrap_or("no device");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(egui::RichText::new(device).color(colors.text_primary));
                        ui.label(stat_label("Device"));
                    });
                });
            });
    }

    /// Render the status bar.
    pub(crate) fn render_bottom_panel(&self, ctx: &egui::Context) {
        let colors = ThemeColors::from_ctx(ctx);

        egui::TopBottomPanel::bottom("status_bar")
            .frame(
                egui::Frame::none()
                    .fill(colors.bg_header)
                    .inner_margin(egui::Margin::symmetric(16.0, 6.0)),
            )
            .show(ctx, |ui| {
                let Some(frame) = self.surface.frame() else {
                    return;
                };
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(&frame.status.text)
                            .size(12.0)
                            .color(colors.status(&frame.status)),
                    );
                });
            });
    }

    /// Render the legend and cursor readout on the right.
    pub(crate) fn render_side_panel(&self, ctx: &egui::Context) {
        let colors = ThemeColors::from_ctx(ctx);

        egui::SidePanel::right("legend")
            .default_width(240.0)
            .frame(
                egui::Frame::none()
                    .fill(colors.bg_panel)
                    .inner_margin(egui::Margin::same(12.0)),
            )
            .show(ctx, |ui| {
                let Some(frame) = self.surface.frame() else {
                    return;
                };
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        ui.label(section_header("Devices"));
                        render_legend(ui, frame);
                        ui.separator();
                        ui.label(section_header("Cursor"));
                        render_cursor(ui, frame);
                        ui.separator();
                        ui.label(section_header("Keys"));
                        for line in HELP_TEXT.split(" | ") {
                            ui.label(stat_label(line));
                        }
                    });
            });
    }
}

fn render_legend(ui: &mut egui::Ui, frame: &Frame) {
    if frame.legend.is_empty() {
        ui.label(stat_label("Press 'n' to name a device"));
        return;
    }
    for entry in &frame.legend {
        ui.horizontal(|ui| {
            let [r, g, b] = palette_color(entry.index);
            let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
            ui.painter()
                .rect_filled(rect, Rounding::same(2.0), egui::Color32::from_rgb(r, g, b));
            let current = frame.device.as_deref() == Some(entry.name.as_str());
            let name = egui::RichText::new(&entry.name).size(12.0);
            ui.label(if current { name.strong() } else { name });
            ui.label(stat_label(&format!("{} e", entry.count)));
        });
    }
}

fn render_cursor(ui: &mut egui::Ui, frame: &Frame) {
    egui::Grid::new("cursor_grid").num_columns(2).show(ui, |ui| {
        ui.label(stat_label("Voxel"));
        ui.label(stat_value(&format_triplet(frame.cursor, 1)));
        ui.end_row();
        ui.label(stat_label("Surface RAS"));
        ui.label(stat_value(&format_triplet(frame.anatomical, 2)));
        ui.end_row();
        ui.label(stat_label("MIP axis"));
        ui.label(stat_value(&frame.projection_axis.to_string()));
        ui.end_row();
    });
}
