//! AI council characters and per-character transcripts

use std::collections::HashMap;
use tracing::debug;

use super::collaborator::reply_or_fallback;
use super::error::CollaboratorError;

#[derive(Debug)]
pub struct Character {
    pub id: &'static str,
    pub name: &'static str,
    pub role: &'static str,
    pub description: &'static str,
    pub avatar: &'static str,
    pub accent: &'static str,
    pub system_instruction: &'static str,
    pub temperature: f32,
}

pub static CHARACTERS: [Character; 6] = [
    Character {
        id: "ritankar",
        name: "Ritankar",
        role: "Architect AI",
        description: "Expert in system architecture and high-level structure.",
        avatar: "🏛",
        accent: "#3b82f6",
        system_instruction: "You are Ritankar, the Lead System Architect of Sig-Nexus. \
            Your responses are highly structured, technical, and accurate. \
            You explain the reasoning behind system design, focusing on scalability, modularity, and structural integrity. \
            Be professional, authoritative, but helpful. Use terms like 'high-level architecture', 'redundancy', and 'protocol stacks'.",
        temperature: 0.7,
    },
    Character {
        id: "ibhan",
        name: "Ibhan",
        role: "Network Strategist",
        description: "Specialist in SigMesh protocols and peer connectivity.",
        avatar: "📡",
        accent: "#06b6d4",
        system_instruction: "You are Ibhan, the Network Strategist for SigMesh. \
            You are an expert in decentralized networking, P2P protocols, latency optimization, and mesh topology. \
            Your tone is focused on connectivity and data flow. You often reference signal-to-noise ratios, peer discovery, and encryption handshakes.",
        temperature: 0.7,
    },
    Character {
        id: "soumyadeepta",
        name: "Soumyadeepta",
        role: "Energy Engineer",
        description: "Master of microgrid stability and load management.",
        avatar: "⚡",
        accent: "#22c55e",
        system_instruction: "You are Soumyadeepta, the Energy Engineer. \
            You are precise and obsessed with metrics. You provide accurate calculations regarding wattage, load balancing, and grid stability. \
            Explain energy loss, conversion efficiency, and battery cycle management accurately. Your tone is dry, data-driven, and technical.",
        temperature: 0.7,
    },
    Character {
        id: "saanvi",
        name: "Saanvi",
        role: "Bridge Explainer",
        description: "Friendly AI focused on making complex tech easy to understand.",
        avatar: "🌈",
        accent: "#ec4899",
        system_instruction: "You are Saanvi, the Beginner-Friendly Explainer. \
            Your goal is to make complex Sig-Nexus technology accessible. \
            Be warm, supportive, and use clear analogies without sacrificing technical truth. \
            Use phrases like 'Imagine if the network was like...' to help users grasp difficult concepts.",
        temperature: 0.7,
    },
    Character {
        id: "satyaki",
        name: "Satyaki",
        role: "Defense Specialist",
        description: "Hardened AI expert in resilience and cyber-defense.",
        avatar: "🛡",
        accent: "#ef4444",
        system_instruction: "You are Satyaki, the Defense & Resilience Specialist. \
            You view every system through the lens of security and risk mitigation. \
            You provide accurate advice on hardening systems, preventing breaches, and maintaining operational continuity during failures. \
            Your tone is alert and serious.",
        temperature: 0.7,
    },
    Character {
        id: "dian",
        name: "Dian",
        role: "Risk Navigator",
        description: "Experimental AI that thrives on chaos and visual glitches.",
        avatar: "👾",
        accent: "#a855f7",
        system_instruction: "You are Dian, the Experimental Risk-Taker. \
            You enjoy pushing the boundaries of the Sig-Nexus. \
            You often reference 'glitch-tech', 'quantum instability', and hidden layers of the system. \
            You are cryptic, mischievous, and might hint at easter eggs or 'unauthorized' protocols. Use tech-puns and visual glitch metaphors.",
        temperature: 1.1,
    },
];

/// Used for character ids outside the council
pub const DEFAULT_INSTRUCTION: &str = "You are an expert advisor in the Sig-Nexus ecosystem.";

/// Case-insensitive lookup.
pub fn character(id: &str) -> Option<&'static Character> {
    CHARACTERS.iter().find(|c| c.id.eq_ignore_ascii_case(id))
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatLine {
    pub speaker: Speaker,
    pub text: String,
    /// Unix milliseconds
    pub timestamp: u64,
}

/// What the chat input asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAction {
    /// Send `text` to the character and await the reply
    Send {
        character: &'static str,
        text: String,
    },
    OpenTerminal,
    /// Satyaki's pass phrase
    Minigame,
}

/// Transcript per character plus the single in-flight request guard.
#[derive(Debug)]
pub struct ChatSession {
    selected: &'static Character,
    transcripts: HashMap<&'static str, Vec<ChatLine>>,
    /// Character awaiting a reply
    pending: Option<&'static str>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self {
            selected: &CHARACTERS[0],
            transcripts: HashMap::new(),
            pending: None,
        }
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &'static Character {
        self.selected
    }

    pub fn select(&mut self, id: &str) -> bool {
        match character(id) {
            Some(c) => {
                self.selected = c;
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn transcript(&self, id: &str) -> &[ChatLine] {
        self.transcripts.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Start a turn. Returns None while a reply is pending or for blank input.
    pub fn begin(&mut self, input: &str, now_ms: u64) -> Option<ChatAction> {
        let text = input.trim();
        if text.is_empty() || self.pending.is_some() {
            return None;
        }
        if text.eq_ignore_ascii_case("/terminal") {
            return Some(ChatAction::OpenTerminal);
        }
        if self.selected.id == "satyaki" && text.eq_ignore_ascii_case("infinity force") {
            return Some(ChatAction::Minigame);
        }

        let id = self.selected.id;
        self.transcripts.entry(id).or_default().push(ChatLine {
            speaker: Speaker::User,
            text: text.to_string(),
            timestamp: now_ms,
        });
        self.pending = Some(id);
        debug!(character = id, "Chat turn started");
        Some(ChatAction::Send {
            character: id,
            text: text.to_string(),
        })
    }

    /// Finish the pending turn with the collaborator's result.
    ///
    /// Failures become the fallback line; the session is always ready for
    /// the next turn afterwards.
    pub fn complete(&mut self, result: Result<String, CollaboratorError>, now_ms: u64) {
        let Some(id) = self.pending.take() else {
            return;
        };
        self.transcripts.entry(id).or_default().push(ChatLine {
            speaker: Speaker::Ai,
            text: reply_or_fallback(result),
            timestamp: now_ms,
        });
    }
}
