//! One-shot achievements

use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AchievementId {
    FirstPing,
    BlackoutSurvivor,
    QuantumAlloy,
    GlitchHunter,
    DeepConversationalist,
}

impl AchievementId {
    pub const ALL: [AchievementId; 5] = [
        AchievementId::FirstPing,
        AchievementId::BlackoutSurvivor,
        AchievementId::QuantumAlloy,
        AchievementId::GlitchHunter,
        AchievementId::DeepConversationalist,
    ];

    pub fn key(self) -> &'static str {
        match self {
            AchievementId::FirstPing => "first_ping",
            AchievementId::BlackoutSurvivor => "blackout_survivor",
            AchievementId::QuantumAlloy => "quantum_alloy",
            AchievementId::GlitchHunter => "glitch_hunter",
            AchievementId::DeepConversationalist => "deep_conversationalist",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AchievementId::FirstPing => "Network Pulse",
            AchievementId::BlackoutSurvivor => "Grid Resilient",
            AchievementId::QuantumAlloy => "Nano-Smith",
            AchievementId::GlitchHunter => "System Cracker",
            AchievementId::DeepConversationalist => "AI Whisperer",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            AchievementId::FirstPing => "📡",
            AchievementId::BlackoutSurvivor => "🔋",
            AchievementId::QuantumAlloy => "⚛",
            AchievementId::GlitchHunter => "👾",
            AchievementId::DeepConversationalist => "🧠",
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Achievements {
    unlocked: Vec<AchievementId>,
}

impl Achievements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true only on the first unlock.
    pub fn unlock(&mut self, id: AchievementId) -> bool {
        if self.is_unlocked(id) {
            return false;
        }
        info!(achievement = id.key(), title = id.title(), "Achievement unlocked");
        self.unlocked.push(id);
        true
    }

    pub fn is_unlocked(&self, id: AchievementId) -> bool {
        self.unlocked.contains(&id)
    }

    /// Unlock order
    pub fn unlocked(&self) -> &[AchievementId] {
        &self.unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_is_one_shot() {
        let mut a = Achievements::new();
        assert!(a.unlock(AchievementId::QuantumAlloy));
        assert!(!a.unlock(AchievementId::QuantumAlloy));
        assert!(a.is_unlocked(AchievementId::QuantumAlloy));
        assert!(!a.is_unlocked(AchievementId::FirstPing));
        assert_eq!(a.unlocked(), &[AchievementId::QuantumAlloy]);
    }

    #[test]
    fn keys_are_distinct() {
        let mut keys: Vec<_> = AchievementId::ALL.iter().map(|a| a.key()).collect();
        keys.dedup();
        assert_eq!(keys.len(), 5);
    }
}
