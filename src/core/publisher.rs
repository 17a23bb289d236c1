//! State snapshots for the readout panel and the analysis collaborator

use serde::Serialize;
use tracing::trace;

use super::entities::{EnergyCategory, Mode, NodeVariant};
use super::store::EntityStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshSummary {
    pub nodes: usize,
    #[serde(rename = "remotePeers")]
    pub remote_peers: usize,
    pub packets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentSummary {
    pub subtype: &'static str,
    pub power: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergySummary {
    pub components: Vec<ComponentSummary>,
    /// Sum of positive power ratings (W)
    pub total_gen: f32,
    /// Sum of |negative power ratings| (W)
    pub total_load: f32,
    /// `total_gen - total_load`
    pub net: f32,
    pub storage_units: usize,
}

impl EnergySummary {
    /// Load exceeds generation while storage is on the grid
    pub fn running_on_storage(&self) -> bool {
        self.total_load > self.total_gen && self.storage_units > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NanoSummary {
    pub atoms: usize,
    /// Bonds with both endpoints present
    pub bonds: usize,
    pub stable: bool,
}

/// Serializable view of the store, keyed by mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub mode: Mode,
    pub frame: u64,
    pub mesh: MeshSummary,
    pub energy: EnergySummary,
    pub nano: NanoSummary,
}

impl Snapshot {
    /// Read the store as it is right now.
    pub fn capture(store: &EntityStore, mode: Mode, frame: u64) -> Self {
        let components: Vec<ComponentSummary> = store
            .components()
            .iter()
            .map(|c| ComponentSummary {
                subtype: c.subtype,
                power: c.power,
            })
            .collect();
        let total_gen: f32 = components.iter().map(|c| c.power.max(0.0)).sum();
        let total_load: f32 = components.iter().map(|c| (-c.power).max(0.0)).sum();
        let storage_units = store
            .components()
            .iter()
            .filter(|c| c.category == EnergyCategory::Storage)
            .count();

        Self {
            mode,
            frame,
            mesh: MeshSummary {
                nodes: store.node_count(),
                remote_peers: store
                    .peers()
                    .iter()
                    .filter(|n| n.variant == NodeVariant::Remote)
                    .count(),
                packets: store.packets().len(),
            },
            energy: EnergySummary {
                components,
                total_gen,
                total_load,
                net: total_gen - total_load,
                storage_units,
            },
            nano: NanoSummary {
                atoms: store.atoms().len(),
                bonds: store.live_bond_count(),
                stable: store.is_stable(),
            },
        }
    }

    pub fn to_json(&self) -> String {
        // Only plain numbers and strings; serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Emits a fresh snapshot every `every` frames.
#[derive(Debug)]
pub struct StatePublisher {
    every: u64,
    latest: Option<Snapshot>,
}

impl StatePublisher {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            latest: None,
        }
    }

    /// Called once per frame; returns the snapshot when the cadence fires.
    pub fn on_frame(&mut self, store: &EntityStore, mode: Mode, frame: u64) -> Option<&Snapshot> {
        if frame % self.every != 0 {
            return None;
        }
        let snap = Snapshot::capture(store, mode, frame);
        trace!(frame, nodes = snap.mesh.nodes, atoms = snap.nano.atoms, "Snapshot published");
        self.latest = Some(snap);
        self.latest.as_ref()
    }

    /// Last published snapshot, for the readout panel.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.latest.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{element_spec, energy_spec};
    use crate::core::entities::{MeshNode, Point};

    fn store() -> EntityStore {
        EntityStore::new(MeshNode::new(
            "PEER-1000",
            "Field Engineer",
            Point::new(400.0, 300.0),
            20.0,
            NodeVariant::Local,
        ))
    }

    #[test]
    fn energy_aggregates() {
        let mut s = store();
        for sub in ["solar", "wind", "battery", "home"] {
            s.insert_component(energy_spec(sub).unwrap(), Point::default());
        }
        let snap = Snapshot::capture(&s, Mode::Energy, 0);
        assert_eq!(snap.energy.total_gen, 750.0);
        assert_eq!(snap.energy.total_load, 2000.0);
        assert_eq!(snap.energy.net, -1250.0);
        assert_eq!(snap.energy.storage_units, 1);
        assert!(snap.energy.running_on_storage());
    }

    #[test]
    fn snapshot_is_keyed_by_mode() {
        let mut s = store();
        let c = element_spec("C").unwrap();
        let a = s.insert_atom(c, Point::default());
        let b = s.insert_atom(c, Point::default());
        s.add_bond(a, b, 3);
        let json: serde_json::Value = serde_json::from_str(&Snapshot::capture(&s, Mode::Nano, 7).to_json()).unwrap();
        assert_eq!(json["mode"], "nano");
        assert_eq!(json["mesh"]["nodes"], 1);
        assert_eq!(json["nano"]["bonds"], 1);
        assert_eq!(json["energy"]["totalGen"], 0.0);
    }

    #[test]
    fn capture_is_never_stale() {
        let mut s = store();
        let mut publisher = StatePublisher::new(1);
        assert_eq!(publisher.on_frame(&s, Mode::Mesh, 1).unwrap().mesh.packets, 0);
        s.push_packet(Point::default(), Point::default(), crate::core::entities::PacketKind::Ping, 0.1, None);
        assert_eq!(publisher.on_frame(&s, Mode::Mesh, 2).unwrap().mesh.packets, 1);
    }

    #[test]
    fn cadence() {
        let s = store();
        let mut publisher = StatePublisher::new(60);
        let fired = (1..=180).filter(|&f| publisher.on_frame(&s, Mode::Mesh, f).is_some()).count();
        assert_eq!(fired, 3);
        assert_eq!(publisher.latest().unwrap().frame, 180);
    }
}
