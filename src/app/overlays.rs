//! Floating windows and screen effects driven by the shell

use eframe::egui;
use egui::{Align2, Color32, Id, LayerId, Order};

use crate::core::achievements::AchievementId;
use crate::core::modifiers::{Modifier, QUEST_STEPS};
use crate::core::terminal::PROMPT;
use crate::theme::colors;
use crate::time::now_seconds;

use super::{AuditState, SandboxApp};

/// Horizontal tear bars drawn per frame while glitching
const GLITCH_BARS: u32 = 6;

/// Cheap deterministic scramble so the glitch needs no RNG.
fn scramble(seed: u32) -> u32 {
    let mut x = seed.wrapping_mul(0x9E37_79B9);
    x ^= x >> 15;
    x = x.wrapping_mul(0x85EB_CA6B);
    x ^ (x >> 13)
}

impl SandboxApp {
    pub(crate) fn render_overlays(&mut self, ctx: &egui::Context) {
        self.render_terminal(ctx);
        self.render_achievements(ctx);
        self.render_audit(ctx);
        self.render_modifier_windows(ctx);
        self.render_toasts(ctx);
        self.render_glitch(ctx);
    }

    fn render_terminal(&mut self, ctx: &egui::Context) {
        if !self.shell.terminal_open() {
            return;
        }
        let mut open = true;
        egui::Window::new("Nexus Shell")
            .open(&mut open)
            .default_size([560.0, 320.0])
            .frame(egui::Frame::window(&ctx.style()).fill(colors::BG_PRIMARY))
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .max_height(260.0)
                    .stick_to_bottom(true)
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        for line in self.shell.terminal.history() {
                            ui.label(egui::RichText::new(line).monospace().color(colors::TERMINAL));
                        }
                    });
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(PROMPT).monospace().color(colors::GREEN));
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.terminal_input)
                            .font(egui::TextStyle::Monospace)
                            .frame(false)
                            .desired_width(f32::INFINITY),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        let line = std::mem::take(&mut self.terminal_input);
                        self.shell.run_command(&line, now_seconds(), &self.config);
                        response.request_focus();
                    }
                });
            });
        if !open {
            self.shell.set_terminal_open(false);
        }
    }

    fn render_achievements(&mut self, ctx: &egui::Context) {
        if !self.show_achievements {
            return;
        }
        let mut open = true;
        egui::Window::new("Nexus Medals")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::RIGHT_TOP, [-12.0, 48.0])
            .show(ctx, |ui| {
                for id in AchievementId::ALL {
                    let unlocked = self.shell.achievements.is_unlocked(id);
                    let (icon, color) = if unlocked {
                        (id.icon(), colors::TEXT_PRIMARY)
                    } else {
                        ("🔒", colors::TEXT_MUTED)
                    };
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(icon).size(18.0));
                        ui.label(egui::RichText::new(id.title()).color(color));
                    });
                }
            });
        self.show_achievements = open;
    }

    fn render_audit(&mut self, ctx: &egui::Context) {
        let report = match &*self.audit.borrow() {
            AuditState::Ready(text) => text.clone(),
            _ => return,
        };
        let mut open = true;
        egui::Window::new("Analysis Results")
            .open(&mut open)
            .collapsible(false)
            .default_width(420.0)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().max_height(360.0).show(ui, |ui| {
                    ui.label(egui::RichText::new(report).color(colors::TEXT_PRIMARY));
                });
            });
        if !open {
            *self.audit.borrow_mut() = AuditState::Idle;
        }
    }

    fn render_modifier_windows(&mut self, ctx: &egui::Context) {
        let flags = self.shell.modifiers.flags();

        if flags.manifesto {
            let mut open = true;
            egui::Window::new("Founder Manifesto")
                .open(&mut open)
                .collapsible(false)
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(egui::RichText::new("sigmax-infinity force NET").strong().color(colors::CYAN));
                    ui.label("Every node is a voice. Every packet a promise.");
                    ui.label("Build the mesh that no single failure can silence.");
                });
            if !open {
                self.shell.modifiers.deactivate(Modifier::Manifesto);
            }
        }

        if flags.library {
            let mut open = true;
            egui::Window::new("Bridge Library")
                .open(&mut open)
                .collapsible(false)
                .show(ctx, |ui| {
                    ui.label(format!("Quest progress {}/{}", flags.quest_progress, QUEST_STEPS));
                    ui.add(
                        egui::ProgressBar::new(flags.quest_progress as f32 / QUEST_STEPS as f32)
                            .fill(colors::PURPLE),
                    );
                    if flags.quest_progress >= QUEST_STEPS {
                        ui.colored_label(colors::GREEN, "Archive fully decoded.");
                    }
                });
            if !open {
                self.shell.modifiers.deactivate(Modifier::Library);
            }
        }

        if flags.minigame {
            let mut open = true;
            egui::Window::new("Defense Drill")
                .open(&mut open)
                .collapsible(false)
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(egui::RichText::new("HOLD THE PERIMETER").strong().color(colors::RED));
                    ui.label("Perimeter sensors armed. Close this window to stand down.");
                });
            if !open {
                self.shell.modifiers.deactivate(Modifier::Minigame);
            }
        }

        if flags.gravity_failure || flags.overclock {
            let text = match (flags.gravity_failure, flags.overclock) {
                (true, true) => "GRAVITY FAILURE / OVERCLOCK",
                (true, false) => "GRAVITY FAILURE",
                _ => "OVERCLOCK",
            };
            egui::Area::new(Id::new("modifier_banner"))
                .anchor(Align2::CENTER_TOP, [0.0, 44.0])
                .interactable(false)
                .show(ctx, |ui| {
                    ui.label(egui::RichText::new(text).strong().color(colors::YELLOW));
                });
        }
    }

    fn render_toasts(&self, ctx: &egui::Context) {
        if self.toasts.is_empty() {
            return;
        }
        egui::Area::new(Id::new("toasts"))
            .anchor(Align2::RIGHT_BOTTOM, [-16.0, -16.0])
            .interactable(false)
            .show(ctx, |ui| {
                for (id, _) in &self.toasts {
                    egui::Frame::new()
                        .fill(colors::BG_ELEVATED)
                        .stroke(egui::Stroke::new(1.0, colors::YELLOW))
                        .corner_radius(8.0)
                        .inner_margin(10.0)
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.label(egui::RichText::new(id.icon()).size(20.0));
                                ui.vertical(|ui| {
                                    ui.label(
                                        egui::RichText::new("ACHIEVEMENT UNLOCKED")
                                            .small()
                                            .color(colors::YELLOW),
                                    );
                                    ui.label(egui::RichText::new(id.title()).strong());
                                });
                            });
                        });
                    ui.add_space(6.0);
                }
            });
    }

    fn render_glitch(&self, ctx: &egui::Context) {
        if !self.shell.modifiers.flags().glitch {
            return;
        }
        let screen = ctx.screen_rect();
        let painter = ctx.layer_painter(LayerId::new(Order::Foreground, Id::new("glitch")));
        let seed = (now_seconds() * 20.0) as u32;
        for i in 0..GLITCH_BARS {
            let r = scramble(seed.wrapping_add(i));
            let y = screen.top() + (r % 1000) as f32 / 1000.0 * screen.height();
            let h = 2.0 + (r >> 10) as f32 % 12.0;
            let shift = ((r >> 4) % 40) as f32 - 20.0;
            let color = if r & 1 == 0 {
                Color32::from_rgba_unmultiplied(6, 182, 212, 40)
            } else {
                Color32::from_rgba_unmultiplied(236, 72, 153, 40)
            };
            let rect = egui::Rect::from_min_size(
                egui::pos2(screen.left() + shift, y),
                egui::vec2(screen.width(), h),
            );
            painter.rect_filled(rect, 0.0, color);
        }
    }
}
