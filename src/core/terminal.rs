//! Hidden root console
//!
//! Commands are matched case-insensitively. The terminal only records
//! history and reports an effect; the caller applies it.

use std::collections::VecDeque;
use tracing::debug;

pub const HISTORY_LIMIT: usize = 200;
pub const PROMPT: &str = "arch@nexus:~$";

const BANNER: [&str; 2] = ["SIG-NEXUS PRO ROOT v4.2", "Authorized Access Only."];

/// Side effect a command asks the host to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalEffect {
    UnlockLabs,
    ToggleGlitch,
    Manifesto,
    Library,
    GravityFailure,
    Overclock,
    Minigame,
    Close,
}

#[derive(Debug)]
pub struct Terminal {
    history: VecDeque<String>,
}

impl Default for Terminal {
    fn default() -> Self {
        Self {
            history: BANNER.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Terminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    pub fn execute(&mut self, input: &str) -> Option<TerminalEffect> {
        let cmd = input.trim();
        if cmd.is_empty() {
            return None;
        }
        let (response, effect) = match cmd.to_ascii_lowercase().as_str() {
            "help" => (
                "CMDS: STATUS, SCAN, LINGINFINITY, GLITCH, RITANKAR, SAANVI, SATYAKI, CLEAR, EXIT\n\
                 TRIGGERS: BEL-IQ-Z, TAIQ, MOONWALK, SPIDERSTRANGE, POWERLINGX"
                    .to_string(),
                None,
            ),
            "status" => ("KERNEL: OPTIMAL\nENCRYPTION: QUANTUM_OK".to_string(), None),
            "linginfinity" => (
                "BYPASSING SECURITY... DIAN'S LABS UNLOCKED.".to_string(),
                Some(TerminalEffect::UnlockLabs),
            ),
            "glitch" => ("BREACH INITIATED.".to_string(), Some(TerminalEffect::ToggleGlitch)),
            "ritankar" | "spiderstrange" | "powerlingx" => (
                "FOUNDER KEY DETECTED. OPENING sigmax-infinity force NET.ExEz...".to_string(),
                Some(TerminalEffect::Manifesto),
            ),
            "saanvi" => (
                "BRIDGE LIBRARY ACCESS GRANTED.".to_string(),
                Some(TerminalEffect::Library),
            ),
            "bel-iq-z" | "moonwalk" => (
                "GRAVITY_UNIT_FAILURE: IBHAN DIPLOMACY ACTIVATED. OBJECTS DISPLACED.".to_string(),
                Some(TerminalEffect::GravityFailure),
            ),
            "taiq" | "overclock" => (
                "SOUMYADEEPTA TURBO MODE: 500% BOOST ACTIVATED.".to_string(),
                Some(TerminalEffect::Overclock),
            ),
            "satyaki" => (
                "DEFENSE DRILL ONLINE. HOLD THE PERIMETER.".to_string(),
                Some(TerminalEffect::Minigame),
            ),
            "clear" => {
                self.history.clear();
                return None;
            }
            "exit" => return Some(TerminalEffect::Close),
            _ => (format!("ACCEPTED: {}", cmd.to_ascii_uppercase()), None),
        };

        debug!(command = cmd, ?effect, "Terminal command");
        self.push(format!("{PROMPT} {cmd}"));
        for line in response.lines() {
            self.push(line.to_string());
        }
        effect
    }

    fn push(&mut self, line: String) {
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_case_insensitive() {
        let mut t = Terminal::new();
        assert_eq!(t.execute("MoonWalk"), Some(TerminalEffect::GravityFailure));
        assert_eq!(t.execute("  taiq "), Some(TerminalEffect::Overclock));
        assert_eq!(t.execute("SpiderStrange"), Some(TerminalEffect::Manifesto));
        assert_eq!(t.execute("exit"), Some(TerminalEffect::Close));
    }

    #[test]
    fn unknown_command_is_echoed() {
        let mut t = Terminal::new();
        assert_eq!(t.execute("scan sector 7"), None);
        let lines: Vec<_> = t.history().collect();
        assert_eq!(lines[lines.len() - 2], "arch@nexus:~$ scan sector 7");
        assert_eq!(lines[lines.len() - 1], "ACCEPTED: SCAN SECTOR 7");
    }

    #[test]
    fn clear_empties_history() {
        let mut t = Terminal::new();
        t.execute("status");
        t.execute("clear");
        assert_eq!(t.history().count(), 0);
    }

    #[test]
    fn history_is_bounded() {
        let mut t = Terminal::new();
        for i in 0..300 {
            t.execute(&format!("cmd{i}"));
        }
        assert_eq!(t.history().count(), HISTORY_LIMIT);
        assert_eq!(t.history().last(), Some("ACCEPTED: CMD299"));
    }
}
