//! Sidebar: palette, actions, live readouts, audit and mesh chat

use eframe::egui;
use tracing::debug;

use crate::core::catalog::{ELEMENT_SPECS, ENERGY_SPECS, PEER_SPECS};
use crate::core::messages::MessageStatus;
use crate::core::render::format_watts;
use crate::core::signal::BROADCAST_TARGET;
use crate::core::{AchievementId, Collaborator, DropPayload, Mode, Snapshot};
use crate::core::collaborator::summary_or_fallback;
use crate::core::entities::NodeVariant;
use crate::theme::{colors, mode_accent, rgb};
use crate::time::unix_millis;

use super::session::CanvasSession;
use super::{AuditState, SandboxApp};

fn section(ui: &mut egui::Ui, title: &str) {
    ui.add_space(10.0);
    ui.label(egui::RichText::new(title).small().color(colors::TEXT_MUTED));
    ui.separator();
}

/// One draggable palette tile
fn tile(ui: &mut egui::Ui, mode: Mode, subtype: &str, label: String, swatch: egui::Color32) {
    let id = egui::Id::new(("palette", subtype));
    ui.dnd_drag_source(id, DropPayload::new(mode, subtype), |ui| {
        egui::Frame::new()
            .fill(colors::BG_ELEVATED)
            .stroke(egui::Stroke::new(1.0, colors::BORDER))
            .corner_radius(6.0)
            .inner_margin(6.0)
            .show(ui, |ui| {
                ui.set_width(100.0);
                ui.horizontal(|ui| {
                    let (rect, _) = ui.allocate_exact_size(egui::vec2(8.0, 8.0), egui::Sense::hover());
                    ui.painter().circle_filled(rect.center(), 4.0, swatch);
                    ui.label(egui::RichText::new(label).small());
                });
            });
    });
}

fn readouts(ui: &mut egui::Ui, snap: &Snapshot) {
    let row = |ui: &mut egui::Ui, k: &str, v: String| {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(k).color(colors::TEXT_SECONDARY));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(egui::RichText::new(v).monospace());
            });
        });
    };
    match snap.mode {
        Mode::Mesh => {
            row(ui, "Nodes", snap.mesh.nodes.to_string());
            row(ui, "Remote peers", snap.mesh.remote_peers.to_string());
            row(ui, "Packets in flight", snap.mesh.packets.to_string());
        }
        Mode::Energy => {
            row(ui, "Components", snap.energy.components.len().to_string());
            row(ui, "Generation", format_watts(snap.energy.total_gen));
            row(ui, "Load", format_watts(snap.energy.total_load));
            row(ui, "Net", format_watts(snap.energy.net));
            if snap.energy.running_on_storage() {
                ui.colored_label(colors::YELLOW, "Running on storage");
            }
        }
        Mode::Nano => {
            row(ui, "Atoms", snap.nano.atoms.to_string());
            row(ui, "Bonds", snap.nano.bonds.to_string());
            let (color, label) = if snap.nano.stable {
                (colors::GREEN, "STABLE")
            } else {
                (colors::TEXT_MUTED, "UNSTABLE")
            };
            row(ui, "Molecule", String::new());
            ui.colored_label(color, label);
        }
    }
}

impl SandboxApp {
    pub(crate) fn render_sidebar(&mut self, ui: &mut egui::Ui) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        let mode = canvas.session().mode();

        ui.label(
            egui::RichText::new(mode.label())
                .strong()
                .size(16.0)
                .color(mode_accent(mode)),
        );

        section(ui, "PALETTE");
        ui.horizontal_wrapped(|ui| match mode {
            Mode::Mesh => {
                for spec in PEER_SPECS {
                    tile(ui, mode, spec.subtype, spec.role.to_string(), rgb(spec.color));
                }
            }
            Mode::Energy => {
                for spec in ENERGY_SPECS {
                    let label = format!("{} {}", spec.label, format_watts(spec.power));
                    tile(ui, mode, spec.subtype, label, rgb(spec.color));
                }
            }
            Mode::Nano => {
                for spec in ELEMENT_SPECS {
                    tile(ui, mode, spec.symbol, spec.symbol.to_string(), rgb(spec.color));
                }
            }
        });
        ui.label(
            egui::RichText::new("Drag onto the canvas. Right-click removes.")
                .small()
                .color(colors::TEXT_MUTED),
        );

        if mode == Mode::Mesh {
            ui.add_space(6.0);
            if ui.button("📡 Ping mesh").clicked() {
                canvas.session_mut().ping_all();
                self.shell.award([AchievementId::FirstPing]);
            }
        }

        section(ui, "TELEMETRY");
        readouts(ui, &canvas.session().snapshot());

        section(ui, "NEXUS AUDIT");
        let scanning = matches!(*self.audit.borrow(), AuditState::Scanning);
        let label = if scanning { "Scanning..." } else { "Audit" };
        if ui.add_enabled(!scanning, egui::Button::new(label)).clicked() {
            start_audit(self, mode);
        }

        if mode == Mode::Mesh {
            if let Some(canvas) = self.canvas.as_mut() {
                mesh_chat(ui, canvas, &mut self.mesh_input);
            }
        }
    }
}

fn start_audit(app: &mut SandboxApp, mode: Mode) {
    let Some(canvas) = app.canvas.as_ref() else {
        return;
    };
    let snapshot = canvas.session().snapshot();
    *app.audit.borrow_mut() = AuditState::Scanning;
    let slot = app.audit.clone();
    let gemini = app.gemini.clone();
    debug!(%mode, "Audit requested");
    wasm_bindgen_futures::spawn_local(async move {
        let report = summary_or_fallback(gemini.summarize(mode, &snapshot).await);
        *slot.borrow_mut() = AuditState::Ready(report);
    });
}

/// Conversation with the selected node, plus broadcast.
fn mesh_chat(ui: &mut egui::Ui, canvas: &mut CanvasSession, input: &mut String) {
    let session = canvas.session();
    let Some(node) = session.selected_node() else {
        section(ui, "MESH CHAT");
        ui.label(
            egui::RichText::new("Select a peer to open a link.")
                .small()
                .color(colors::TEXT_MUTED),
        );
        return;
    };
    if node.variant == NodeVariant::Local {
        return;
    }
    let peer_id = node.id.clone();

    section(ui, &format!("LINKED NODE: {peer_id}"));
    egui::ScrollArea::vertical()
        .max_height(220.0)
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for m in session.messages().conversation(&peer_id) {
                let incoming = m.sender_id == peer_id;
                let layout = if incoming {
                    egui::Layout::left_to_right(egui::Align::TOP)
                } else {
                    egui::Layout::right_to_left(egui::Align::TOP)
                };
                ui.with_layout(layout, |ui| {
                    let status = match m.status {
                        MessageStatus::Sending => "SENDING",
                        MessageStatus::Delivered => "DELIVERED",
                        MessageStatus::Received => "RECEIVED",
                    };
                    ui.label(format!("{}  ", m.text));
                    ui.label(egui::RichText::new(status).small().color(colors::TEXT_MUTED));
                });
            }
        });

    let mut send_to: Option<&str> = None;
    ui.horizontal(|ui| {
        let response = ui.add(
            egui::TextEdit::singleline(input)
                .hint_text("Inject command...")
                .desired_width(140.0),
        );
        let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Send").clicked() || enter {
            send_to = Some(peer_id.as_str());
        }
        if ui.button("All").on_hover_text("Broadcast to every peer").clicked() {
            send_to = Some(BROADCAST_TARGET);
        }
    });
    if ui.small_button("Close link").clicked() {
        canvas.session_mut().select_node(None);
        return;
    }

    if let Some(target) = send_to {
        let target = target.to_string();
        canvas
            .session_mut()
            .send_message(&target, input, unix_millis());
        input.clear();
    }
}
