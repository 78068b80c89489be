//! Application theme and color definitions.
//!
//! Provides light and dark themes with monospace fonts, following system preference.

use eframe::egui::{
    self, Color32, FontFamily, FontId, Rounding, Stroke, TextStyle, Theme, Visuals,
};
use elecpick_core::{Status, StatusLevel};

/// Color palette for the application (dark theme).
pub mod dark {
    use eframe::egui::Color32;

    pub const BG_DARK: Color32 = Color32::from_rgb(0x12, 0x12, 0x12);
    pub const BG_PANEL: Color32 = Color32::from_rgb(0x1c, 0x1c, 0x1c);
    pub const BG_HEADER: Color32 = Color32::from_rgb(0x24, 0x24, 0x24);
    pub const BG_INPUT: Color32 = Color32::from_rgb(0x2a, 0x2a, 0x2a);

    pub const BORDER: Color32 = Color32::from_rgb(0x33, 0x33, 0x33);
    pub const BORDER_LIGHT: Color32 = Color32::from_rgb(0x44, 0x44, 0x44);

    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(0xe0, 0xe0, 0xe0);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(0x88, 0x88, 0x88);

    pub const BUTTON_HOVER: Color32 = Color32::from_rgb(0x3a, 0x3a, 0x3a);
}

/// Color palette for the application (light theme).
pub mod light {
    use eframe::egui::Color32;

    pub const BG_DARK: Color32 = Color32::from_rgb(0xf5, 0xf5, 0xf5);
    pub const BG_PANEL: Color32 = Color32::from_rgb(0xff, 0xff, 0xff);
    pub const BG_HEADER: Color32 = Color32::from_rgb(0xfa, 0xfa, 0xfa);
    pub const BG_INPUT: Color32 = Color32::from_rgb(0xf0, 0xf0, 0xf0);

    pub const BORDER: Color32 = Color32::from_rgb(0xd0, 0xd0, 0xd0);
    pub const BORDER_LIGHT: Color32 = Color32::from_rgb(0xc0, 0xc0, 0xc0);

    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(0x1a, 0x1a, 0x1a);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(0x66, 0x66, 0x66);

    pub const BUTTON_HOVER: Color32 = Color32::from_rgb(0xdd, 0xdd, 0xdd);
}

/// Shared accent colors (same for both themes).
pub mod accent {
    use eframe::egui::Color32;

    pub const BLUE: Color32 = Color32::from_rgb(0x4a, 0x9e, 0xff);
    pub const RED: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);
    /// Crosshair lines on the panels.
    pub const CROSSHAIR: Color32 = Color32::from_rgb(0x00, 0xd0, 0xff);
}

/// Theme-aware color accessor.
#[derive(Clone, Copy)]
pub struct ThemeColors {
    pub bg_panel: Color32,
    pub bg_header: Color32,
    pub text_primary: Color32,
    pub text_muted: Color32,
}

impl ThemeColors {
    /// Get colors for the current theme from context.
    pub fn from_ctx(ctx: &egui::Context) -> Self {
        Self::from_dark_mode(ctx.style().visuals.dark_mode)
    }

    /// Get colors based on dark mode flag.
    pub fn from_dark_mode(is_dark: bool) -> Self {
        if is_dark {
            Self {
                bg_panel: dark::BG_PANEL,
                bg_header: dark::BG_HEADER,
                text_primary: dark::TEXT_PRIMARY,
                text_muted: dark::TEXT_MUTED,
            }
        } else {
            Self {
                bg_panel: light::BG_PANEL,
                bg_header: light::BG_HEADER,
                text_primary: light::TEXT_PRIMARY,
                text_muted: light::TEXT_MUTED,
            }
        }
    }

    /// Text color for a status message.
    pub fn status(self, status: &Status) -> Color32 {
        match status.level {
            StatusLevel::Info => self.text_primary,
            StatusLevel::Warning => accent::RED,
        }
    }
}

/// Configure egui style for the given theme.
pub fn configure_style_for_theme(ctx: &egui::Context, theme: Theme) {
    let visuals = match theme {
        Theme::Dark => build_visuals(Visuals::dark(), true),
        Theme::Light => build_visuals(Visuals::light(), false),
    };

    ctx.set_visuals(visuals);
    configure_fonts_and_spacing(ctx);
}

/// Configure style based on current visuals (dark/light mode).
pub fn configure_style(ctx: &egui::Context) {
    let is_dark = ctx.style().visuals.dark_mode;
    let theme = if is_dark { Theme::Dark } else { Theme::Light };
    configure_style_for_theme(ctx, theme);
}

fn build_visuals(mut visuals: Visuals, is_dark: bool) -> Visuals {
    let (bg_dark, bg_panel, bg_input, border, border_light, text, muted, hover) = if is_dark {
        (
            dark::BG_DARK,
            dark::BG_PANEL,
            dark::BG_INPUT,
            dark::BORDER,
            dark::BORDER_LIGHT,
            dark::TEXT_PRIMARY,
            dark::TEXT_MUTED,
            dark::BUTTON_HOVER,
        )
    } else {
        (
            light::BG_DARK,
            light::BG_PANEL,
            light::BG_INPUT,
            light::BORDER,
            light::BORDER_LIGHT,
            light::TEXT_PRIMARY,
            light::TEXT_MUTED,
            light::BUTTON_HOVER,
        )
    };

    visuals.window_fill = bg_panel;
    visuals.panel_fill = bg_panel;
    visuals.faint_bg_color = bg_dark;
    visuals.extreme_bg_color = bg_dark;

    let widgets = &mut visuals.widgets;
    widgets.noninteractive.bg_fill = bg_input;
    widgets.noninteractive.fg_stroke = Stroke::new(1.0, muted);
    widgets.noninteractive.bg_stroke = Stroke::new(1.0, border);
    widgets.inactive.bg_fill = bg_input;
    widgets.inactive.fg_stroke = Stroke::new(1.0, text);
    widgets.inactive.bg_stroke = Stroke::new(1.0, border_light);
    widgets.hovered.bg_fill = hover;
    widgets.hovered.fg_stroke = Stroke::new(1.0, text);
    widgets.hovered.bg_stroke = Stroke::new(1.0, accent::BLUE);
    widgets.active.bg_fill = accent::BLUE;
    widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);
    widgets.active.bg_stroke = Stroke::new(1.0, accent::BLUE);
    for w in [
        &mut widgets.noninteractive,
        &mut widgets.inactive,
        &mut widgets.hovered,
        &mut widgets.active,
        &mut widgets.open,
    ] {
        w.rounding = Rounding::same(4.0);
    }

    visuals.selection.bg_fill = accent::BLUE.gamma_multiply(if is_dark { 0.3 } else { 0.2 });
    visuals.selection.stroke = Stroke::new(1.0, accent::BLUE);

    visuals
}

/// Configure fonts and spacing (theme-independent).
fn configure_fonts_and_spacing(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    // Use monospace for everything
    style.text_styles = [
        (TextStyle::Small, FontId::new(10.0, FontFamily::Monospace)),
        (TextStyle::Body, FontId::new(12.0, FontFamily::Monospace)),
        (TextStyle::Button, FontId::new(12.0, FontFamily::Monospace)),
        (TextStyle::Heading, FontId::new(14.0, FontFamily::Monospace)),
        (
            TextStyle::Monospace,
            FontId::new(12.0, FontFamily::Monospace),
        ),
    ]
    .into();

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(10.0, 6.0);

    ctx.set_style(style);
}

/// Create a section header label.
pub fn section_header(text: &str) -> egui::RichText {
    egui::RichText::new(text.to_uppercase()).size(11.0).strong()
}

/// Create a stat label (left column).
pub fn stat_label(text: &str) -> egui::RichText {
    egui::RichText::new(text).size(11.0).weak()
}

/// Create a stat value (right column).
pub fn stat_value(text: &str) -> egui::RichText {
    egui::RichText::new(text).size(11.0)
}

/// Theme to apply when the context reports `is_dark`, given the mode
/// applied last (`None` before the first frame). `None` when nothing changed.
#[must_use]
pub fn theme_change(last_dark: Option<bool>, is_dark: bool) -> Option<Theme> {
    if last_dark == Some(is_dark) {
        return None;
    }
    Some(if is_dark { Theme::Dark } else { Theme::Light })
}

/// Re-apply styles when the system theme differs from `last_dark`, which
/// is updated to the current mode.
pub fn apply_system_theme(ctx: &egui::Context, last_dark: &mut Option<bool>) {
    let is_dark = ctx.style().visuals.dark_mode;
    if let Some(theme) = theme_change(*last_dark, is_dark) {
        configure_style_for_theme(ctx, theme);
    }
    *last_dark = Some(is_dark);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_applied_on_first_frame_and_on_change() {
        assert_eq!(theme_change(None, true), Some(Theme::Dark));
        assert_eq!(theme_change(Some(true), true), None);
        assert_eq!(theme_change(Some(true), false), Some(Theme::Light));
        assert_eq!(theme_change(Some(false), false), None);
    }
}
