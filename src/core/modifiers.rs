//! Process-wide cosmetic modifiers with auto-expiry
//!
//! Expiry is deadline-based and polled once per frame: re-activating a
//! modifier replaces its deadline, so the latest activation is the only
//! one that can expire it.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use super::config::SandboxConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    GravityFailure,
    Overclock,
    Manifesto,
    Minigame,
    Library,
    Glitch,
}

/// Current flag values, cheap to copy into a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GlobalModifiers {
    pub gravity_failure: bool,
    pub overclock: bool,
    pub manifesto: bool,
    pub minigame: bool,
    pub library: bool,
    pub glitch: bool,
    /// Library quest steps completed (0..=QUEST_STEPS)
    pub quest_progress: u8,
}

pub const QUEST_STEPS: u8 = 5;

impl GlobalModifiers {
    pub fn get(&self, m: Modifier) -> bool {
        match m {
            Modifier::GravityFailure => self.gravity_failure,
            Modifier::Overclock => self.overclock,
            Modifier::Manifesto => self.manifesto,
            Modifier::Minigame => self.minigame,
            Modifier::Library => self.library,
            Modifier::Glitch => self.glitch,
        }
    }

    fn slot(&mut self, m: Modifier) -> &mut bool {
        match m {
            Modifier::GravityFailure => &mut self.gravity_failure,
            Modifier::Overclock => &mut self.overclock,
            Modifier::Manifesto => &mut self.manifesto,
            Modifier::Minigame => &mut self.minigame,
            Modifier::Library => &mut self.library,
            Modifier::Glitch => &mut self.glitch,
        }
    }

    /// Motion multiplier for packets, drift and flow animation
    pub fn speed_multiplier(&self, config: &SandboxConfig) -> f32 {
        if self.overclock {
            config.overclock_multiplier
        } else {
            1.0
        }
    }
}

#[derive(Debug, Default)]
pub struct Modifiers {
    flags: GlobalModifiers,
    /// Pending auto-expiry deadline per modifier (seconds, app clock)
    deadlines: HashMap<Modifier, f64>,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flags(&self) -> GlobalModifiers {
        self.flags
    }

    pub fn is_active(&self, m: Modifier) -> bool {
        self.flags.get(m)
    }

    /// Turn on until `now + duration`, replacing any earlier deadline.
    pub fn activate_for(&mut self, m: Modifier, now: f64, duration: f64) {
        *self.flags.slot(m) = true;
        self.deadlines.insert(m, now + duration);
        debug!(modifier = ?m, expires_at = now + duration, "Modifier activated");
    }

    /// Turn on with no expiry.
    pub fn activate(&mut self, m: Modifier) {
        *self.flags.slot(m) = true;
        self.deadlines.remove(&m);
        debug!(modifier = ?m, "Modifier activated");
    }

    pub fn deactivate(&mut self, m: Modifier) {
        *self.flags.slot(m) = false;
        self.deadlines.remove(&m);
    }

    /// Flip a modifier with no expiry; returns the new state.
    pub fn toggle(&mut self, m: Modifier) -> bool {
        if self.is_active(m) {
            self.deactivate(m);
            false
        } else {
            self.activate(m);
            true
        }
    }

    pub fn advance_quest(&mut self) -> u8 {
        self.flags.quest_progress = (self.flags.quest_progress + 1).min(QUEST_STEPS);
        self.flags.quest_progress
    }

    /// Expire every modifier whose deadline has passed.
    pub fn tick(&mut self, now: f64) -> Vec<Modifier> {
        let expired: Vec<Modifier> = self
            .deadlines
            .iter()
            .filter(|(_, &deadline)| now >= deadline)
            .map(|(&m, _)| m)
            .collect();
        for &m in &expired {
            self.deactivate(m);
            debug!(modifier = ?m, "Modifier expired");
        }
        expired
    }

    pub fn deadline(&self, m: Modifier) -> Option<f64> {
        self.deadlines.get(&m).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_modifier_expires() {
        let mut m = Modifiers::new();
        m.activate_for(Modifier::GravityFailure, 10.0, 5.0);
        assert!(m.tick(14.9).is_empty());
        assert!(m.is_active(Modifier::GravityFailure));
        assert_eq!(m.tick(15.0), vec![Modifier::GravityFailure]);
        assert!(!m.is_active(Modifier::GravityFailure));
    }

    #[test]
    fn reactivation_replaces_deadline() {
        let mut m = Modifiers::new();
        m.activate_for(Modifier::GravityFailure, 0.0, 5.0);
        m.activate_for(Modifier::GravityFailure, 4.0, 5.0);
        // The first activation's deadline no longer applies
        assert!(m.tick(6.0).is_empty());
        assert!(m.is_active(Modifier::GravityFailure));
        assert_eq!(m.deadline(Modifier::GravityFailure), Some(9.0));
        assert_eq!(m.tick(9.0).len(), 1);
    }

    #[test]
    fn manual_deactivate_cancels_timer() {
        let mut m = Modifiers::new();
        m.activate_for(Modifier::Overclock, 0.0, 1.0);
        m.deactivate(Modifier::Overclock);
        assert_eq!(m.deadline(Modifier::Overclock), None);
        assert!(m.tick(100.0).is_empty());
    }

    #[test]
    fn toggle_and_quest_cap() {
        let mut m = Modifiers::new();
        assert!(m.toggle(Modifier::Glitch));
        assert!(!m.toggle(Modifier::Glitch));
        for _ in 0..10 {
            m.advance_quest();
        }
        assert_eq!(m.flags().quest_progress, QUEST_STEPS);
    }

    #[test]
    fn overclock_scales_speed() {
        let config = SandboxConfig::default();
        let mut m = Modifiers::new();
        assert_eq!(m.flags().speed_multiplier(&config), 1.0);
        m.activate(Modifier::Overclock);
        assert_eq!(m.flags().speed_multiplier(&config), 5.0);
    }
}
