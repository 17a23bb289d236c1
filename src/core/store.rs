//! Entity store - authoritative collections for one canvas session
//!
//! The local identity node is held apart from the peer collection, so
//! there is always exactly one and finding it needs no scan. All other
//! entities live in plain vectors mutated in place each frame.

use std::collections::HashSet;
use tracing::{debug, trace};

use super::catalog::{ElementSpec, EnergySpec};
use super::entities::{
    Atom, Bond, EnergyComponent, EntityId, MeshNode, NodeVariant, Packet, PacketKind, Point,
};

/// Result of a bond request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondOutcome {
    /// Bond created; `became_stable` is true only on the call that
    /// crossed the stability threshold
    Formed { id: EntityId, became_stable: bool },
    /// The unordered pair is already bonded
    Duplicate,
    /// Both endpoints are the same atom
    SelfBond,
    /// One of the atoms does not exist
    MissingAtom,
}

pub struct EntityStore {
    /// This session's identity node
    local: MeshNode,
    /// Simulated and remote peers, in insertion order
    peers: Vec<MeshNode>,
    packets: Vec<Packet>,
    components: Vec<EnergyComponent>,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// Unordered atom pairs that already have a bond
    bond_pairs: HashSet<(EntityId, EntityId)>,
    /// Sticky: set once the bond threshold is reached, never cleared
    stable: bool,
    next_id: u64,
}

impl EntityStore {
    pub fn new(mut local: MeshNode) -> Self {
        local.variant = NodeVariant::Local;
        debug!(id = %local.id, "Entity store created");
        Self {
            local,
            peers: Vec::new(),
            packets: Vec::new(),
            components: Vec::new(),
            atoms: Vec::new(),
            bonds: Vec::new(),
            bond_pairs: HashSet::new(),
            stable: false,
            next_id: 1,
        }
    }

    /// Allocate a fresh store-unique id
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    // ------------------------------------------------------------------
    // Mesh nodes
    // ------------------------------------------------------------------

    pub fn local(&self) -> &MeshNode {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut MeshNode {
        &mut self.local
    }

    pub fn local_id(&self) -> &str {
        &self.local.id
    }

    pub fn peers(&self) -> &[MeshNode] {
        &self.peers
    }

    pub fn peers_mut(&mut self) -> &mut [MeshNode] {
        &mut self.peers
    }

    /// Local node first, then peers in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &MeshNode> {
        std::iter::once(&self.local).chain(self.peers.iter())
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut MeshNode> {
        std::iter::once(&mut self.local).chain(self.peers.iter_mut())
    }

    pub fn node_count(&self) -> usize {
        self.peers.len() + 1
    }

    pub fn node(&self, id: &str) -> Option<&MeshNode> {
        self.nodes().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut MeshNode> {
        if self.local.id == id {
            return Some(&mut self.local);
        }
        self.peers.iter_mut().find(|n| n.id == id)
    }

    /// Insert a peer. Rejects the local variant and ids already present.
    pub fn insert_peer(&mut self, node: MeshNode) -> bool {
        if node.variant == NodeVariant::Local || self.node(&node.id).is_some() {
            trace!(id = %node.id, "Peer insert rejected");
            return false;
        }
        debug!(id = %node.id, variant = ?node.variant, x = node.pos.x, y = node.pos.y, "Peer inserted");
        self.peers.push(node);
        true
    }

    /// Remove a peer by id. The local node cannot be removed.
    pub fn remove_peer(&mut self, id: &str) -> Option<MeshNode> {
        let idx = self.peers.iter().position(|n| n.id == id)?;
        debug!(id, "Peer removed");
        Some(self.peers.remove(idx))
    }

    // ------------------------------------------------------------------
    // Packets
    // ------------------------------------------------------------------

    pub fn push_packet(
        &mut self,
        source: Point,
        target: Point,
        kind: PacketKind,
        speed: f32,
        payload: Option<String>,
    ) -> EntityId {
        let id = self.next_id();
        trace!(%id, ?kind, "Packet queued");
        self.packets.push(Packet {
            id,
            source,
            target,
            kind,
            progress: 0.0,
            speed,
            payload,
        });
        id
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    /// Structural access for the frame loop (arrival removal)
    pub fn packets_mut(&mut self) -> &mut Vec<Packet> {
        &mut self.packets
    }

    // ------------------------------------------------------------------
    // Energy components
    // ------------------------------------------------------------------

    pub fn insert_component(&mut self, spec: &EnergySpec, pos: Point) -> EntityId {
        let id = self.next_id();
        debug!(%id, subtype = spec.subtype, power = spec.power, "Component placed");
        self.components.push(EnergyComponent {
            id,
            subtype: spec.subtype,
            category: spec.category,
            pos,
            width: spec.width,
            height: spec.height,
            color: spec.color,
            power: spec.power,
            health: 100.0,
            label: spec.label,
            dragging: false,
        });
        id
    }

    pub fn components(&self) -> &[EnergyComponent] {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut [EnergyComponent] {
        &mut self.components
    }

    pub fn component(&self, id: EntityId) -> Option<&EnergyComponent> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn component_mut(&mut self, id: EntityId) -> Option<&mut EnergyComponent> {
        self.components.iter_mut().find(|c| c.id == id)
    }

    pub fn remove_component(&mut self, id: EntityId) -> Option<EnergyComponent> {
        let idx = self.components.iter().position(|c| c.id == id)?;
        debug!(%id, "Component removed");
        Some(self.components.remove(idx))
    }

    // ------------------------------------------------------------------
    // Atoms and bonds
    // ------------------------------------------------------------------

    pub fn insert_atom(&mut self, spec: &ElementSpec, pos: Point) -> EntityId {
        let id = self.next_id();
        debug!(%id, element = spec.symbol, "Atom placed");
        self.atoms.push(Atom {
            id,
            element: spec.symbol,
            pos,
            color: spec.color,
            radius: spec.radius,
            charge: spec.charge,
            dragging: false,
        });
        id
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }

    pub fn atom(&self, id: EntityId) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.id == id)
    }

    pub fn atom_mut(&mut self, id: EntityId) -> Option<&mut Atom> {
        self.atoms.iter_mut().find(|a| a.id == id)
    }

    /// Remove an atom. Bonds that reference it stay but become inert.
    pub fn remove_atom(&mut self, id: EntityId) -> Option<Atom> {
        let idx = self.atoms.iter().position(|a| a.id == id)?;
        debug!(%id, "Atom removed");
        Some(self.atoms.remove(idx))
    }

    /// Bond two atoms, enforcing unordered-pair uniqueness.
    pub fn add_bond(&mut self, a: EntityId, b: EntityId, threshold: usize) -> BondOutcome {
        if a == b {
            return BondOutcome::SelfBond;
        }
        if self.atom(a).is_none() || self.atom(b).is_none() {
            return BondOutcome::MissingAtom;
        }
        let key = Bond::pair_key(a, b);
        if !self.bond_pairs.insert(key) {
            trace!(%a, %b, "Duplicate bond ignored");
            return BondOutcome::Duplicate;
        }

        let id = self.next_id();
        self.bonds.push(Bond {
            id,
            a,
            b,
            strength: 1.0,
        });

        let live = self.live_bond_count();
        let became_stable = !self.stable && live >= threshold;
        if became_stable {
            self.stable = true;
        }
        debug!(%id, %a, %b, live, stable = self.stable, "Bond formed");
        BondOutcome::Formed { id, became_stable }
    }

    /// Remove a bond. Does not affect the stable latch.
    pub fn remove_bond(&mut self, id: EntityId) -> Option<Bond> {
        let idx = self.bonds.iter().position(|b| b.id == id)?;
        let bond = self.bonds.remove(idx);
        self.bond_pairs.remove(&Bond::pair_key(bond.a, bond.b));
        debug!(%id, "Bond removed");
        Some(bond)
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Both endpoint atoms, or None if the bond is inert.
    pub fn bond_endpoints(&self, bond: &Bond) -> Option<(&Atom, &Atom)> {
        Some((self.atom(bond.a)?, self.atom(bond.b)?))
    }

    /// Bonds whose endpoints both still exist
    pub fn live_bond_count(&self) -> usize {
        self.bonds
            .iter()
            .filter(|b| self.bond_endpoints(b).is_some())
            .count()
    }

    pub fn is_stable(&self) -> bool {
        self.stable
    }
}
