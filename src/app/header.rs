//! Header bar with view tabs and status

use eframe::egui;

use crate::core::Mode;
use crate::theme::{colors, mode_accent};
use crate::time::now_seconds;

use super::{SandboxApp, View};

impl SandboxApp {
    pub(crate) fn render_header(&mut self, ui: &mut egui::Ui) {
        self.fps_counter.tick();

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("SIG").strong().color(colors::TEXT_PRIMARY));
            ui.label(egui::RichText::new("NEXUS").strong().color(colors::CYAN));

            ui.add_space(16.0);

            let mut tabs: Vec<(View, &str, egui::Color32)> = vec![
                (View::Canvas(Mode::Mesh), "Mesh", mode_accent(Mode::Mesh)),
                (View::Canvas(Mode::Energy), "Grid", mode_accent(Mode::Energy)),
                (View::Canvas(Mode::Nano), "Nano", mode_accent(Mode::Nano)),
                (View::Chat, "Chat", colors::PINK),
            ];
            if self.shell.labs_unlocked() {
                tabs.push((View::Labs, "Labs", colors::YELLOW));
            }

            for (view, label, accent) in tabs {
                let active = self.view == view;
                let color = if active { accent } else { colors::TEXT_MUTED };
                if ui
                    .selectable_label(active, egui::RichText::new(label).color(color))
                    .clicked()
                {
                    self.view = view;
                }
            }

            // RIGHT: status (right-to-left order)
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let unlocked = self.shell.achievements.unlocked().len();
                if ui
                    .button(format!("🏆 {unlocked}"))
                    .on_hover_text("View Achievements")
                    .clicked()
                {
                    self.show_achievements = !self.show_achievements;
                }

                ui.add_space(10.0);

                ui.label(
                    egui::RichText::new(format!("{:.0} fps", self.fps_counter.fps()))
                        .color(colors::TEXT_SECONDARY),
                );

                if let Some(canvas) = &self.canvas {
                    let session = canvas.session();
                    ui.label(egui::RichText::new("/").color(colors::TEXT_MUTED));
                    ui.label(egui::RichText::new(session.geo().to_string()).color(colors::TEXT_MUTED));
                    ui.label(egui::RichText::new("/").color(colors::TEXT_MUTED));
                    ui.label(egui::RichText::new(session.id()).color(colors::CYAN));
                }

                let flags = self.shell.modifiers.flags();
                if flags.overclock {
                    ui.label(egui::RichText::new("OVERCLOCK").color(colors::YELLOW));
                }
                if flags.gravity_failure {
                    ui.label(egui::RichText::new("ZERO-G").color(colors::PURPLE));
                }
            });
        });
    }
}

/// FPS counter using platform-agnostic time
pub struct FpsCounter {
    frames: Vec<f64>,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            frames: Vec::with_capacity(60),
        }
    }

    pub fn tick(&mut self) {
        self.frames.push(now_seconds());
        if self.frames.len() > 60 {
            self.frames.remove(0);
        }
    }

    pub fn fps(&self) -> f64 {
        let (Some(first), Some(last)) = (self.frames.first(), self.frames.last()) else {
            return 0.0;
        };
        let elapsed = last - first;
        if self.frames.len() < 2 || elapsed <= 0.0 {
            return 0.0;
        }
        (self.frames.len() as f64 - 1.0) / elapsed
    }
}
