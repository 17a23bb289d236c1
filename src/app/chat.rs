//! Chat view: character list and transcript

use eframe::egui;
use tracing::debug;

use crate::core::chat::{ChatAction, Speaker, CHARACTERS};
use crate::core::entities::Rgb;
use crate::core::Collaborator;
use crate::theme::{colors, rgb};
use crate::time::unix_millis;

use super::SandboxApp;

impl SandboxApp {
    pub(crate) fn render_chat(&mut self, ui: &mut egui::Ui) {
        egui::SidePanel::left("characters")
            .resizable(false)
            .exact_width(240.0)
            .frame(egui::Frame::new().fill(colors::BG_PRIMARY).inner_margin(10.0))
            .show_inside(ui, |ui| {
                ui.label(egui::RichText::new("CONTACTS").small().color(colors::TEXT_MUTED));
                ui.separator();
                let selected = self.shell.chat.selected().id;
                for c in CHARACTERS.iter() {
                    let active = c.id == selected;
                    let text = egui::RichText::new(format!("{} {}\n{}", c.avatar, c.name, c.role))
                        .color(if active { rgb(Rgb::hex(c.accent)) } else { colors::TEXT_SECONDARY });
                    if ui
                        .selectable_label(active, text)
                        .on_hover_text(c.description)
                        .clicked()
                    {
                        self.shell.chat.select(c.id);
                    }
                }
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(colors::BG_CANVAS).inner_margin(16.0))
            .show_inside(ui, |ui| self.render_transcript(ui));
    }

    fn render_transcript(&mut self, ui: &mut egui::Ui) {
        let character = self.shell.chat.selected();
        let accent = rgb(Rgb::hex(character.accent));
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(character.avatar).size(22.0));
            ui.label(egui::RichText::new(character.name).strong().color(accent));
            ui.label(egui::RichText::new(character.role).color(colors::TEXT_MUTED));
        });
        ui.separator();

        let input_height = 40.0;
        egui::ScrollArea::vertical()
            .max_height((ui.available_height() - input_height).max(0.0))
            .stick_to_bottom(true)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for line in self.shell.chat.transcript(character.id) {
                    match line.speaker {
                        Speaker::User => {
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::TOP), |ui| {
                                ui.label(egui::RichText::new(&line.text).color(colors::TEXT_PRIMARY));
                            });
                        }
                        Speaker::Ai => {
                            ui.label(egui::RichText::new(&line.text).color(accent));
                        }
                    }
                    ui.add_space(6.0);
                }
                if self.shell.chat.is_pending() {
                    ui.label(egui::RichText::new("...").color(colors::TEXT_MUTED));
                }
            });

        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.chat_input)
                    .hint_text(format!("Message {}...", character.name))
                    .desired_width((ui.available_width() - 80.0).max(80.0)),
            );
            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let send = ui
                .add_enabled(!self.shell.chat.is_pending(), egui::Button::new("Send"))
                .clicked();
            if (send || enter) && !self.shell.chat.is_pending() {
                let text = std::mem::take(&mut self.chat_input);
                self.submit_chat(&text);
                response.request_focus();
            }
        });
    }

    fn submit_chat(&mut self, text: &str) {
        match self.shell.chat_input(text, unix_millis()) {
            Some(ChatAction::Send { character, text }) => {
                let gemini = self.gemini.clone();
                let slot = self.chat_reply.clone();
                debug!(character, "Chat request");
                wasm_bindgen_futures::spawn_local(async move {
                    let result = gemini.respond(character, &text).await;
                    *slot.borrow_mut() = Some(result);
                });
            }
            // The shell already opened the terminal or the drill
            Some(ChatAction::OpenTerminal | ChatAction::Minigame) | None => {}
        }
    }
}
