//! Per-frame simulation step
//!
//! Advances everything that moves between two draws. Elapsed time is
//! whatever the host scheduler gives us; motion is per-frame, not per-second.

use tracing::trace;

use super::config::SandboxConfig;
use super::entities::{EntityId, Mode, PacketKind, Point};
use super::modifiers::GlobalModifiers;
use super::store::EntityStore;

/// Drawable area in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// A packet that reached its target this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrival {
    pub id: EntityId,
    pub kind: PacketKind,
    pub payload: Option<String>,
}

#[derive(Debug, Default)]
pub struct Simulation {
    frame: u64,
    /// Energy flow indicator phase in [0, 1)
    flow_phase: f32,
    /// Nano electron marker phase in [0, 1)
    electron_phase: f32,
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn flow_phase(&self) -> f32 {
        self.flow_phase
    }

    pub fn electron_phase(&self) -> f32 {
        self.electron_phase
    }

    /// Advance one frame for the active mode. Returns packets that arrived.
    pub fn step(
        &mut self,
        store: &mut EntityStore,
        mode: Mode,
        modifiers: GlobalModifiers,
        config: &SandboxConfig,
        bounds: Bounds,
    ) -> Vec<Arrival> {
        self.frame += 1;
        let speed = modifiers.speed_multiplier(config);

        if modifiers.gravity_failure {
            drift_upward(store, mode, config.gravity_step * speed, bounds);
        }

        match mode {
            Mode::Mesh => {
                let arrivals = advance_packets(store, speed);
                for node in store.nodes_mut() {
                    node.grow(config.radius_growth);
                }
                arrivals
            }
            Mode::Energy => {
                self.flow_phase = (self.flow_phase + config.flow_speed * speed).fract();
                Vec::new()
            }
            Mode::Nano => {
                self.electron_phase = (self.electron_phase + config.electron_speed * speed).fract();
                Vec::new()
            }
        }
    }
}

/// Advance in-flight packets, removing each exactly once on arrival.
///
/// Iterates back-to-front so removal never skips or revisits a packet.
fn advance_packets(store: &mut EntityStore, speed: f32) -> Vec<Arrival> {
    let packets = store.packets_mut();
    let mut arrivals = Vec::new();
    for i in (0..packets.len()).rev() {
        if packets[i].advance(speed) {
            let p = packets.remove(i);
            trace!(id = %p.id, kind = ?p.kind, "Packet arrived");
            arrivals.push(Arrival {
                id: p.id,
                kind: p.kind,
                payload: p.payload,
            });
        }
    }
    // Report in creation order
    arrivals.reverse();
    arrivals
}

/// Gravity-failure drift: everything floats up and wraps to the bottom.
fn drift_upward(store: &mut EntityStore, mode: Mode, step: f32, bounds: Bounds) {
    let wrap = |p: &mut Point| {
        p.y -= step;
        if p.y < 0.0 {
            p.y = bounds.height;
        }
    };
    match mode {
        Mode::Mesh => store.nodes_mut().for_each(|n| wrap(&mut n.pos)),
        Mode::Energy => store
            .components_mut()
            .iter_mut()
            .filter(|c| !c.dragging)
            .for_each(|c| wrap(&mut c.pos)),
        Mode::Nano => store
            .atoms_mut()
            .iter_mut()
            .filter(|a| !a.dragging)
            .for_each(|a| wrap(&mut a.pos)),
    }
}
