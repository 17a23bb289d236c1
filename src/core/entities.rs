//! Simulation entities for the three canvas modes
//!
//! This module contains:
//! - Geometry and color primitives shared by every mode
//! - Mesh nodes and in-flight packets
//! - Energy grid components
//! - Atoms and bonds

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Basic Types
// ============================================================================

/// Store-assigned id for packets, components, atoms and bonds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Canvas-local coordinate in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Linear interpolation, `t = 0` is `self`, `t = 1` is `other`.
    #[inline]
    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// Opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    /// Parse `#rrggbb`. Invalid input yields white.
    pub const fn hex(s: &str) -> Rgb {
        const fn nibble(c: u8) -> Option<u8> {
            match c {
                b'0'..=b'9' => Some(c - b'0'),
                b'a'..=b'f' => Some(c - b'a' + 10),
                b'A'..=b'F' => Some(c - b'A' + 10),
                _ => None,
            }
        }
        const fn byte(b: &[u8], i: usize) -> Option<u8> {
            match (nibble(b[i]), nibble(b[i + 1])) {
                (Some(hi), Some(lo)) => Some(hi * 16 + lo),
                _ => None,
            }
        }

        let b = s.as_bytes();
        if b.len() != 7 || b[0] != b'#' {
            return Rgb::WHITE;
        }
        match (byte(b, 1), byte(b, 3), byte(b, 5)) {
            (Some(r), Some(g), Some(bl)) => Rgb(r, g, bl),
            _ => Rgb::WHITE,
        }
    }
}

/// Active canvas mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Mesh,
    Energy,
    Nano,
}

impl Mode {
    pub const ALL: &'static [Mode] = &[Mode::Mesh, Mode::Energy, Mode::Nano];

    /// Wire name used in drop payloads and snapshots.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Mesh => "mesh",
            Mode::Energy => "energy",
            Mode::Nano => "nano",
        }
    }

    pub fn parse(s: &str) -> Option<Mode> {
        Mode::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Mesh => "SigMesh",
            Mode::Energy => "Microgrid",
            Mode::Nano => "NanoForge",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Mesh
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeVariant {
    /// This session's own identity
    Local,
    /// Placed from the palette
    Simulated,
    /// Discovered through the signal channel
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoCoord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshNode {
    pub id: String,
    pub role: String,
    pub pos: Point,
    /// Current drawn radius (grows toward `target_radius`)
    pub radius: f32,
    pub target_radius: f32,
    pub variant: NodeVariant,
    pub geo: Option<GeoCoord>,
}

impl MeshNode {
    pub fn new(
        id: impl Into<String>,
        role: impl Into<String>,
        pos: Point,
        target_radius: f32,
        variant: NodeVariant,
    ) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            pos,
            radius: 0.0,
            target_radius,
            variant,
            geo: None,
        }
    }

    /// Grow one animation step; returns true while still growing.
    pub fn grow(&mut self, rate: f32) -> bool {
        if self.radius < self.target_radius {
            self.radius = (self.radius + rate).min(self.target_radius);
        }
        self.radius < self.target_radius
    }

    /// Hit test against the visual radius plus `margin`.
    ///
    /// Uses the target radius so a node is clickable during its grow-in.
    #[inline]
    pub fn contains(&self, p: Point, margin: f32) -> bool {
        self.pos.distance(p) < self.target_radius.max(self.radius) + margin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketKind {
    Ping,
    Message,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub id: EntityId,
    pub source: Point,
    pub target: Point,
    pub kind: PacketKind,
    /// Always in [0, 1]
    pub progress: f32,
    /// Progress per frame before multipliers
    pub speed: f32,
    pub payload: Option<String>,
}

impl Packet {
    /// Advance by one frame. Returns true once the packet has arrived.
    pub fn advance(&mut self, multiplier: f32) -> bool {
        self.progress = (self.progress + self.speed * multiplier).min(1.0);
        self.progress >= 1.0
    }

    #[inline]
    pub fn position(&self) -> Point {
        self.source.lerp(self.target, self.progress)
    }
}

// ============================================================================
// Energy
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnergyCategory {
    Generation,
    Storage,
    Load,
    Experimental,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnergyComponent {
    pub id: EntityId,
    pub subtype: &'static str,
    pub category: EnergyCategory,
    /// Center of the component
    pub pos: Point,
    pub width: f32,
    pub height: f32,
    pub color: Rgb,
    /// Watts; positive generates, negative consumes. Fixed by subtype.
    pub power: f32,
    pub health: f32,
    pub label: &'static str,
    pub dragging: bool,
}

impl EnergyComponent {
    pub fn contains(&self, p: Point, margin: f32) -> bool {
        (p.x - self.pos.x).abs() <= self.width / 2.0 + margin
            && (p.y - self.pos.y).abs() <= self.height / 2.0 + margin
    }
}

// ============================================================================
// Nano
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub id: EntityId,
    pub element: &'static str,
    pub pos: Point,
    pub color: Rgb,
    pub radius: f32,
    pub charge: i8,
    pub dragging: bool,
}

impl Atom {
    #[inline]
    pub fn contains(&self, p: Point, margin: f32) -> bool {
        self.pos.distance(p) < self.radius + margin
    }
}

/// Edge between two atoms, referenced by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    pub id: EntityId,
    pub a: EntityId,
    pub b: EntityId,
    pub strength: f32,
}

impl Bond {
    /// Order-independent key for the atom pair.
    #[inline]
    pub fn pair_key(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse() {
        assert_eq!(Rgb::hex("#f59e0b"), Rgb(0xf5, 0x9e, 0x0b));
        assert_eq!(Rgb::hex("#FFFFFF"), Rgb::WHITE);
        assert_eq!(Rgb::hex("nope"), Rgb::WHITE);
        assert_eq!(Rgb::hex("#zz0000"), Rgb::WHITE);
    }

    #[test]
    fn packet_progress_is_clamped() {
        let mut p = Packet {
            id: EntityId(1),
            source: Point::new(0.0, 0.0),
            target: Point::new(100.0, 0.0),
            kind: PacketKind::Ping,
            progress: 0.0,
            speed: 0.4,
            payload: None,
        };
        assert!(!p.advance(1.0));
        assert!(!p.advance(1.0));
        assert!(p.advance(1.0));
        assert_eq!(p.progress, 1.0);
        assert_eq!(p.position(), Point::new(100.0, 0.0));
    }

    #[test]
    fn node_grows_to_target_exactly() {
        let mut n = MeshNode::new("AI-1", "Relay", Point::default(), 1.2, NodeVariant::Simulated);
        assert!(n.grow(0.5));
        assert!(n.grow(0.5));
        assert!(!n.grow(0.5));
        assert_eq!(n.radius, 1.2);
    }

    #[test]
    fn bond_pair_key_is_unordered() {
        assert_eq!(
            Bond::pair_key(EntityId(7), EntityId(3)),
            Bond::pair_key(EntityId(3), EntityId(7))
        );
    }

    #[test]
    fn mode_round_trips_wire_name() {
        for &m in Mode::ALL {
            assert_eq!(Mode::parse(m.as_str()), Some(m));
        }
        assert_eq!(Mode::parse("NANO"), Some(Mode::Nano));
        assert_eq!(Mode::parse("chat"), None);
    }
}
