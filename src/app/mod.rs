//! Browser front-end
//!
//! A thin egui layer over `core`: the app owns the process-wide `Shell`
//! and at most one mounted `CanvasSession`, which exists only while a
//! canvas view is shown.

mod canvas;
mod chat;
mod header;
mod overlays;
mod session;
mod sidebar;

use std::cell::RefCell;
use std::rc::Rc;

use eframe::egui;
use tracing::{debug, info, warn};

use crate::core::{AchievementId, CollaboratorError, Mode, SandboxConfig, Shell};
use crate::gemini_wasm::BrowserGemini;
use crate::theme::{colors, nexus_visuals};
use crate::time::{now_seconds, unix_millis};

use session::CanvasSession;

/// Seconds an achievement toast stays on screen
const TOAST_SECONDS: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum View {
    Canvas(Mode),
    Chat,
    Labs,
}

#[derive(Debug, Default)]
pub(crate) enum AuditState {
    #[default]
    Idle,
    Scanning,
    Ready(String),
}

/// Slot an in-flight collaborator call writes its result into
pub(crate) type Pending<T> = Rc<RefCell<Option<T>>>;

pub struct SandboxApp {
    config: SandboxConfig,
    pub(crate) shell: Shell,
    pub(crate) view: View,
    pub(crate) canvas: Option<CanvasSession>,
    pub(crate) gemini: BrowserGemini,
    pub(crate) fps_counter: header::FpsCounter,
    pub(crate) audit: Rc<RefCell<AuditState>>,
    pub(crate) chat_reply: Pending<Result<String, CollaboratorError>>,
    /// Newly unlocked achievements and when they were unlocked
    pub(crate) toasts: Vec<(AchievementId, f64)>,
    pub(crate) show_achievements: bool,
    pub(crate) terminal_input: String,
    pub(crate) chat_input: String,
    pub(crate) mesh_input: String,
}

/// Config from `window.__sandbox_config` (a JSON string), else defaults.
fn load_config() -> SandboxConfig {
    let Some(json) = js_sys::eval("window.__sandbox_config")
        .ok()
        .and_then(|v| v.as_string())
    else {
        return SandboxConfig::default();
    };
    match SandboxConfig::from_json(&json) {
        Ok(config) => {
            info!("Config loaded from page");
            config
        }
        Err(e) => {
            warn!(error = %e, "Invalid page config, using defaults");
            SandboxConfig::default()
        }
    }
}

impl SandboxApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(nexus_visuals());

        let gemini = BrowserGemini::from_window();
        if !gemini.has_key() {
            warn!("No collaborator API key, chat and audit will fall back");
        }

        Self {
            config: load_config(),
            shell: Shell::new(),
            view: View::Canvas(Mode::Mesh),
            canvas: None,
            gemini,
            fps_counter: header::FpsCounter::new(),
            audit: Rc::new(RefCell::new(AuditState::Idle)),
            chat_reply: Rc::new(RefCell::new(None)),
            toasts: Vec::new(),
            show_achievements: false,
            terminal_input: String::new(),
            chat_input: String::new(),
            mesh_input: String::new(),
        }
    }

    /// Toast everything the shell unlocked since the last frame.
    fn collect_toasts(&mut self, now: f64) {
        for id in self.shell.drain_recent() {
            self.toasts.push((id, now));
        }
        self.toasts.retain(|(_, at)| now - at < TOAST_SECONDS);
    }

    /// Mount, retarget or drop the canvas to match the current view.
    fn sync_canvas(&mut self) {
        match self.view {
            View::Canvas(mode) => match self.canvas.as_mut() {
                Some(canvas) => {
                    if canvas.session().mode() != mode {
                        canvas.session_mut().set_mode(mode);
                    }
                }
                None => {
                    let bounds = crate::core::Bounds::new(
                        self.config.default_width,
                        self.config.default_height,
                    );
                    self.canvas = Some(CanvasSession::mount(self.config.clone(), bounds, mode));
                }
            },
            View::Chat | View::Labs => {
                if self.canvas.take().is_some() {
                    debug!("Canvas unmounted");
                }
            }
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let combo = |key| ctx.input(|i| i.modifiers.ctrl && i.modifiers.shift && i.key_pressed(key));
        if combo(egui::Key::G) {
            self.shell.toggle_glitch();
        }
        if combo(egui::Key::T) {
            let open = self.shell.terminal_open();
            self.shell.set_terminal_open(!open);
        }
        if combo(egui::Key::L) {
            self.shell.unlock_labs();
            self.view = View::Labs;
        }
    }

    fn render_labs(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(60.0);
            ui.label(egui::RichText::new("🧪").size(72.0));
            ui.label(
                egui::RichText::new("EXPERIMENTAL LABS")
                    .size(36.0)
                    .strong()
                    .color(colors::PURPLE),
            );
            ui.label(
                egui::RichText::new("Void protocol 0-X is active. Proceed with extreme caution.")
                    .color(colors::TEXT_SECONDARY),
            );
            ui.add_space(30.0);
            ui.horizontal(|ui| {
                ui.add_space((ui.available_width() - 420.0).max(0.0) / 2.0);
                if ui
                    .add_sized([200.0, 60.0], egui::Button::new("Instability Matrix"))
                    .on_hover_text("Trigger visual sensor glitches and reality shifting.")
                    .clicked()
                {
                    self.shell.toggle_glitch();
                }
                ui.add_space(20.0);
                if ui
                    .add_sized([200.0, 60.0], egui::Button::new("Nexus Shell"))
                    .on_hover_text("Access root level command line interface for advanced tuning.")
                    .clicked()
                {
                    self.shell.set_terminal_open(true);
                }
            });
        });
    }
}

impl eframe::App for SandboxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Request continuous repaint for the animation loop
        ctx.request_repaint();

        let now = now_seconds();
        self.handle_shortcuts(ctx);
        for m in self.shell.tick(now) {
            debug!(modifier = ?m, "Modifier expired");
        }
        if let Some(result) = self.chat_reply.borrow_mut().take() {
            self.shell.chat.complete(result, unix_millis());
        }
        self.sync_canvas();
        let flags = self.shell.modifiers.flags();
        if let Some(canvas) = self.canvas.as_mut() {
            let report = canvas.frame(now, flags);
            for event in &report.signals {
                debug!(?event, "Signal");
            }
            self.shell.award(report.achievements);
        }

        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::new().fill(colors::BG_PRIMARY).inner_margin(8.0))
            .show(ctx, |ui| self.render_header(ui));

        if matches!(self.view, View::Canvas(_)) {
            egui::SidePanel::left("sidebar")
                .resizable(false)
                .exact_width(260.0)
                .frame(egui::Frame::new().fill(colors::BG_PRIMARY).inner_margin(10.0))
                .show(ctx, |ui| self.render_sidebar(ui));
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(colors::BG_CANVAS))
            .show(ctx, |ui| match self.view {
                View::Canvas(_) => {
                    if let Some(canvas) = self.canvas.as_mut() {
                        let awards = canvas::show(ui, canvas.session_mut());
                        self.shell.award(awards);
                    }
                }
                View::Chat => self.render_chat(ui),
                View::Labs => self.render_labs(ui),
            });

        self.collect_toasts(now);
        self.render_overlays(ctx);
    }
}
