//! Dark slate theme with one accent per mode

use egui::Color32;

use crate::core::{Mode, Rgb, Rgba};

/// Slate palette
pub mod colors {
    use super::Color32;

    // === Backgrounds ===
    pub const BG_PRIMARY: Color32 = Color32::from_rgb(11, 17, 32);      // #0b1120 - chrome
    pub const BG_CANVAS: Color32 = Color32::from_rgb(15, 23, 42);       // #0f172a - canvas well
    pub const BG_ELEVATED: Color32 = Color32::from_rgb(21, 30, 46);     // #151e2e - cards
    pub const BG_HOVER: Color32 = Color32::from_rgb(30, 41, 59);        // #1e293b

    // === Text ===
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(226, 232, 240); // #e2e8f0
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(148, 163, 184); // #94a3b8
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(71, 85, 105);     // #475569

    pub const BORDER: Color32 = Color32::from_rgb(30, 41, 59);

    // === Accents ===
    pub const CYAN: Color32 = Color32::from_rgb(34, 211, 238);
    pub const BLUE: Color32 = Color32::from_rgb(96, 165, 250);
    pub const GREEN: Color32 = Color32::from_rgb(74, 222, 128);
    pub const PURPLE: Color32 = Color32::from_rgb(192, 132, 252);
    pub const PINK: Color32 = Color32::from_rgb(244, 114, 182);
    pub const YELLOW: Color32 = Color32::from_rgb(250, 204, 21);
    pub const RED: Color32 = Color32::from_rgb(239, 68, 68);

    /// Terminal green
    pub const TERMINAL: Color32 = Color32::from_rgb(74, 222, 128);
}

pub fn mode_accent(mode: Mode) -> Color32 {
    match mode {
        Mode::Mesh => colors::BLUE,
        Mode::Energy => colors::GREEN,
        Mode::Nano => colors::PURPLE,
    }
}

pub fn rgb(c: Rgb) -> Color32 {
    Color32::from_rgb(c.0, c.1, c.2)
}

pub fn rgba(c: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(c.0, c.1, c.2, c.3)
}

/// Create the slate egui Visuals
pub fn nexus_visuals() -> egui::Visuals {
    use colors::*;

    let mut visuals = egui::Visuals::dark();

    visuals.panel_fill = BG_PRIMARY;
    visuals.window_fill = BG_PRIMARY;
    visuals.extreme_bg_color = egui::Color32::BLACK;
    visuals.faint_bg_color = BG_ELEVATED;

    visuals.override_text_color = Some(TEXT_PRIMARY);

    visuals.widgets.noninteractive.bg_fill = BG_PRIMARY;
    visuals.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, TEXT_SECONDARY);
    visuals.widgets.noninteractive.bg_stroke = egui::Stroke::new(1.0, BORDER);

    visuals.widgets.inactive.bg_fill = BG_ELEVATED;
    visuals.widgets.inactive.fg_stroke = egui::Stroke::new(1.0, TEXT_SECONDARY);
    visuals.widgets.inactive.bg_stroke = egui::Stroke::new(1.0, BORDER);
    visuals.widgets.inactive.weak_bg_fill = BG_ELEVATED;

    visuals.widgets.hovered.bg_fill = BG_HOVER;
    visuals.widgets.hovered.fg_stroke = egui::Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, CYAN);
    visuals.widgets.hovered.weak_bg_fill = BG_HOVER;

    visuals.widgets.active.bg_fill = BG_HOVER;
    visuals.widgets.active.fg_stroke = egui::Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.active.bg_stroke = egui::Stroke::new(1.0, CYAN);
    visuals.widgets.active.weak_bg_fill = BG_HOVER;

    visuals.selection.bg_fill = Color32::from_rgb(8, 51, 68);
    visuals.selection.stroke = egui::Stroke::new(1.0, CYAN);

    visuals.hyperlink_color = CYAN;

    visuals.window_shadow = egui::Shadow::NONE;
    visuals.popup_shadow = egui::Shadow::NONE;

    visuals
}
