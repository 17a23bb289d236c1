//! Process-wide state that outlives a canvas mount
//!
//! Modifiers, achievements, the root terminal and the AI chat belong to
//! the whole app, not to one canvas session.

use tracing::info;

use super::achievements::{AchievementId, Achievements};
use super::chat::{ChatAction, ChatSession};
use super::config::SandboxConfig;
use super::modifiers::{Modifier, Modifiers};
use super::terminal::{Terminal, TerminalEffect};

#[derive(Debug, Default)]
pub struct Shell {
    pub modifiers: Modifiers,
    pub achievements: Achievements,
    pub terminal: Terminal,
    pub chat: ChatSession,
    labs_unlocked: bool,
    terminal_open: bool,
    /// Unlocked since the host last drained them
    recent: Vec<AchievementId>,
}

impl Shell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labs_unlocked(&self) -> bool {
        self.labs_unlocked
    }

    pub fn unlock_labs(&mut self) {
        if !self.labs_unlocked {
            info!("Labs unlocked");
        }
        self.labs_unlocked = true;
    }

    pub fn terminal_open(&self) -> bool {
        self.terminal_open
    }

    pub fn set_terminal_open(&mut self, open: bool) {
        self.terminal_open = open;
    }

    fn unlock(&mut self, id: AchievementId) -> bool {
        let new = self.achievements.unlock(id);
        if new {
            self.recent.push(id);
        }
        new
    }

    /// Achievements unlocked since the last call, oldest first.
    pub fn drain_recent(&mut self) -> Vec<AchievementId> {
        std::mem::take(&mut self.recent)
    }

    /// Flip the glitch overlay; turning it on awards the hunter badge.
    pub fn toggle_glitch(&mut self) -> bool {
        let on = self.modifiers.toggle(Modifier::Glitch);
        if on {
            self.unlock(AchievementId::GlitchHunter);
        }
        on
    }

    /// Unlock each id, returning those that were new.
    pub fn award(&mut self, ids: impl IntoIterator<Item = AchievementId>) -> Vec<AchievementId> {
        ids.into_iter().filter(|&id| self.unlock(id)).collect()
    }

    /// Run a terminal line and apply what it asks for.
    pub fn run_command(&mut self, input: &str, now: f64, config: &SandboxConfig) -> Option<TerminalEffect> {
        let effect = self.terminal.execute(input)?;
        self.apply(effect, now, config);
        Some(effect)
    }

    pub fn apply(&mut self, effect: TerminalEffect, now: f64, config: &SandboxConfig) {
        match effect {
            TerminalEffect::UnlockLabs => self.unlock_labs(),
            TerminalEffect::ToggleGlitch => {
                self.toggle_glitch();
            }
            TerminalEffect::Manifesto => self.modifiers.activate(Modifier::Manifesto),
            TerminalEffect::Library => {
                self.modifiers.activate(Modifier::Library);
                self.modifiers.advance_quest();
            }
            TerminalEffect::GravityFailure => {
                self.modifiers
                    .activate_for(Modifier::GravityFailure, now, config.gravity_duration)
            }
            TerminalEffect::Overclock => {
                self.modifiers
                    .activate_for(Modifier::Overclock, now, config.overclock_duration)
            }
            TerminalEffect::Minigame => self.modifiers.activate(Modifier::Minigame),
            TerminalEffect::Close => self.terminal_open = false,
        }
    }

    /// Submit chat input; handles the commands the chat box understands.
    pub fn chat_input(&mut self, input: &str, now_ms: u64) -> Option<ChatAction> {
        let action = self.chat.begin(input, now_ms)?;
        match &action {
            ChatAction::Send { .. } => {
                self.unlock(AchievementId::DeepConversationalist);
            }
            ChatAction::OpenTerminal => self.terminal_open = true,
            ChatAction::Minigame => self.modifiers.activate(Modifier::Minigame),
        }
        Some(action)
    }

    /// Expire timed modifiers.
    pub fn tick(&mut self, now: f64) -> Vec<Modifier> {
        self.modifiers.tick(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_command_is_timed() {
        let config = SandboxConfig::default();
        let mut shell = Shell::new();
        assert_eq!(shell.run_command("moonwalk", 100.0, &config), Some(TerminalEffect::GravityFailure));
        assert!(shell.modifiers.is_active(Modifier::GravityFailure));
        shell.tick(100.0 + config.gravity_duration - 0.1);
        assert!(shell.modifiers.is_active(Modifier::GravityFailure));
        shell.tick(100.0 + config.gravity_duration);
        assert!(!shell.modifiers.is_active(Modifier::GravityFailure));
    }

    #[test]
    fn library_advances_quest() {
        let config = SandboxConfig::default();
        let mut shell = Shell::new();
        shell.run_command("SAANVI", 0.0, &config);
        shell.run_command("saanvi", 0.0, &config);
        assert!(shell.modifiers.flags().library);
        assert_eq!(shell.modifiers.flags().quest_progress, 2);
    }

    #[test]
    fn glitch_awards_once() {
        let config = SandboxConfig::default();
        let mut shell = Shell::new();
        shell.run_command("glitch", 0.0, &config);
        assert!(shell.modifiers.flags().glitch);
        assert!(shell.achievements.is_unlocked(AchievementId::GlitchHunter));
        assert!(!shell.toggle_glitch());
        assert_eq!(shell.award([AchievementId::GlitchHunter, AchievementId::FirstPing]), vec![AchievementId::FirstPing]);
    }

    #[test]
    fn chat_commands_route_through_shell() {
        let mut shell = Shell::new();
        assert_eq!(shell.chat_input("/terminal", 0), Some(ChatAction::OpenTerminal));
        assert!(shell.terminal_open());
        shell.run_command("exit", 0.0, &SandboxConfig::default());
        assert!(!shell.terminal_open());

        assert!(matches!(shell.chat_input("hello", 0), Some(ChatAction::Send { .. })));
        assert!(shell.achievements.is_unlocked(AchievementId::DeepConversationalist));
    }

    #[test]
    fn recent_unlocks_drain_once() {
        let mut shell = Shell::new();
        shell.toggle_glitch();
        shell.award([AchievementId::FirstPing, AchievementId::GlitchHunter]);
        assert_eq!(
            shell.drain_recent(),
            vec![AchievementId::GlitchHunter, AchievementId::FirstPing]
        );
        assert!(shell.drain_recent().is_empty());
    }

    #[test]
    fn labs_unlock_command() {
        let mut shell = Shell::new();
        shell.run_command("LingInfinity", 0.0, &SandboxConfig::default());
        assert!(shell.labs_unlocked());
    }
}
