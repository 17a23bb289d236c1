//! Pointer and drop interaction state machine
//!
//! Translates canvas-local pointer events into store mutations:
//! - Mesh: select a node, free-drag it
//! - Energy: grid-drag components
//! - Nano: grid-drag atoms and arm/complete bonds
//! - All modes: palette drops and secondary-click removal

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::catalog::{element_spec, energy_spec, peer_spec};
use super::config::SandboxConfig;
use super::entities::{EntityId, MeshNode, Mode, NodeVariant, Point};
use super::rng::RandomSource;
use super::store::{BondOutcome, EntityStore};

/// Drag-and-drop payload from the palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropPayload {
    /// Target mode wire name ("mesh", "energy", "nano")
    #[serde(rename = "type")]
    pub kind: String,
    /// Key into that mode's spec table
    pub subtype: String,
}

impl DropPayload {
    pub fn new(mode: Mode, subtype: impl Into<String>) -> Self {
        Self {
            kind: mode.as_str().to_string(),
            subtype: subtype.into(),
        }
    }
}

/// Entity created by a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placed {
    Node(String),
    Component(EntityId),
    Atom(EntityId),
}

/// Something the surrounding UI should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionEvent {
    /// Mesh selection changed (None = cleared)
    NodeSelected(Option<String>),
    Placed(Placed),
    BondFormed { id: EntityId, a: EntityId, b: EntityId },
    /// Raised exactly once per session, on the bond that crossed the threshold
    StabilityReached,
    Removed,
}

/// Entity currently held by a grid-drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grab {
    Component(EntityId),
    Atom(EntityId),
}

#[derive(Debug, Default)]
pub struct InteractionHandler {
    mode: Mode,
    /// Last known pointer position (None when outside the canvas)
    pointer: Option<Point>,
    selected_node: Option<String>,
    /// Node following the pointer in mesh free-drag
    dragging_node: Option<String>,
    grabbed: Option<Grab>,
    /// Armed bond source atom
    bond_source: Option<EntityId>,
    hovered_atom: Option<EntityId>,
}

impl InteractionHandler {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn selected_node(&self) -> Option<&str> {
        self.selected_node.as_deref()
    }

    pub fn bond_source(&self) -> Option<EntityId> {
        self.bond_source
    }

    pub fn hovered_atom(&self) -> Option<EntityId> {
        self.hovered_atom
    }

    /// Switch modes, releasing any in-progress drag without snapping.
    pub fn set_mode(&mut self, store: &mut EntityStore, mode: Mode) {
        if mode == self.mode {
            return;
        }
        self.cancel_drag(store);
        self.bond_source = None;
        self.hovered_atom = None;
        self.mode = mode;
        debug!(%mode, "Interaction mode changed");
    }

    /// Select a node from outside the canvas (e.g. closing the chat clears it).
    pub fn select_node(&mut self, id: Option<String>) {
        self.selected_node = id;
    }

    pub fn pointer_down(
        &mut self,
        store: &mut EntityStore,
        config: &SandboxConfig,
        p: Point,
    ) -> Vec<InteractionEvent> {
        self.pointer = Some(p);
        let margin = config.hit_margin;
        let mut events = Vec::new();

        match self.mode {
            Mode::Mesh => {
                // Topmost (last drawn) node wins
                let hit = store
                    .nodes()
                    .filter(|n| n.contains(p, margin))
                    .last()
                    .map(|n| n.id.clone());
                self.dragging_node = hit.clone();
                if hit.is_some() || self.selected_node.is_some() {
                    trace!(selected = ?hit, "Node selection");
                    self.selected_node = hit.clone();
                    events.push(InteractionEvent::NodeSelected(hit));
                }
            }
            Mode::Energy => {
                let hit = store
                    .components()
                    .iter()
                    .rev()
                    .find(|c| c.contains(p, 0.0))
                    .map(|c| c.id);
                if let Some(id) = hit {
                    if let Some(c) = store.component_mut(id) {
                        c.dragging = true;
                    }
                    self.grabbed = Some(Grab::Component(id));
                }
            }
            Mode::Nano => {
                let hit = store
                    .atoms()
                    .iter()
                    .rev()
                    .find(|a| a.contains(p, margin))
                    .map(|a| a.id);
                match (hit, self.bond_source) {
                    (Some(atom), Some(source)) if atom != source => {
                        self.bond_source = None;
                        if let BondOutcome::Formed { id, became_stable } =
                            store.add_bond(source, atom, config.stability_threshold)
                        {
                            events.push(InteractionEvent::BondFormed {
                                id,
                                a: source,
                                b: atom,
                            });
                            if became_stable {
                                events.push(InteractionEvent::StabilityReached);
                            }
                        }
                        self.grab_atom(store, atom);
                    }
                    (Some(atom), _) => {
                        self.bond_source = Some(atom);
                        self.grab_atom(store, atom);
                    }
                    (None, _) => {
                        self.bond_source = None;
                    }
                }
            }
        }
        events
    }

    fn grab_atom(&mut self, store: &mut EntityStore, id: EntityId) {
        if let Some(a) = store.atom_mut(id) {
            a.dragging = true;
            self.grabbed = Some(Grab::Atom(id));
        }
    }

    pub fn pointer_move(&mut self, store: &mut EntityStore, config: &SandboxConfig, p: Point) {
        self.pointer = Some(p);
        match self.mode {
            Mode::Mesh => {
                if let Some(id) = self.dragging_node.as_deref() {
                    if let Some(node) = store.node_mut(id) {
                        node.pos = p;
                    }
                }
            }
            Mode::Nano => {
                self.hovered_atom = store
                    .atoms()
                    .iter()
                    .rev()
                    .find(|a| a.contains(p, config.hit_margin))
                    .map(|a| a.id);
            }
            Mode::Energy => {}
        }
    }

    pub fn pointer_up(&mut self, store: &mut EntityStore, config: &SandboxConfig, p: Point) {
        self.pointer = Some(p);
        if let Some(id) = self.dragging_node.take() {
            if let Some(node) = store.node_mut(&id) {
                node.pos = p;
            }
        }
        let snapped = Point::new(config.snap(p.x), config.snap(p.y));
        match self.grabbed.take() {
            Some(Grab::Component(id)) => {
                if let Some(c) = store.component_mut(id) {
                    c.pos = snapped;
                    c.dragging = false;
                }
            }
            Some(Grab::Atom(id)) => {
                if let Some(a) = store.atom_mut(id) {
                    a.pos = snapped;
                    a.dragging = false;
                }
            }
            None => {}
        }
    }

    /// Pointer left the canvas
    pub fn pointer_leave(&mut self, store: &mut EntityStore) {
        self.cancel_drag(store);
        self.pointer = None;
        self.hovered_atom = None;
    }

    /// Release a drag in place, leaving stored positions untouched.
    pub fn cancel_drag(&mut self, store: &mut EntityStore) {
        self.dragging_node = None;
        match self.grabbed.take() {
            Some(Grab::Component(id)) => {
                if let Some(c) = store.component_mut(id) {
                    c.dragging = false;
                }
            }
            Some(Grab::Atom(id)) => {
                if let Some(a) = store.atom_mut(id) {
                    a.dragging = false;
                }
            }
            None => {}
        }
    }

    /// Create an entity from a palette drop. Mismatched modes and
    /// unknown subtypes are ignored.
    pub fn drop_item(
        &mut self,
        store: &mut EntityStore,
        config: &SandboxConfig,
        rng: &mut dyn RandomSource,
        payload: &DropPayload,
        p: Point,
    ) -> Option<InteractionEvent> {
        let mode = Mode::parse(&payload.kind)?;
        if mode != self.mode {
            trace!(payload = ?payload, active = %self.mode, "Drop for another mode ignored");
            return None;
        }

        let placed = match mode {
            Mode::Mesh => {
                let spec = peer_spec(&payload.subtype)?;
                let id = unique_node_id(store, rng, spec.id_prefix);
                let node = MeshNode::new(
                    id.clone(),
                    spec.role,
                    p,
                    config.simulated_radius,
                    NodeVariant::Simulated,
                );
                if !store.insert_peer(node) {
                    return None;
                }
                Placed::Node(id)
            }
            Mode::Energy => {
                let spec = energy_spec(&payload.subtype)?;
                Placed::Component(store.insert_component(spec, p))
            }
            Mode::Nano => {
                let spec = element_spec(&payload.subtype)?;
                Placed::Atom(store.insert_atom(spec, p))
            }
        };
        Some(InteractionEvent::Placed(placed))
    }

    /// Remove the topmost removable entity under the pointer.
    pub fn remove_at(
        &mut self,
        store: &mut EntityStore,
        config: &SandboxConfig,
        p: Point,
    ) -> Option<InteractionEvent> {
        let margin = config.hit_margin;
        match self.mode {
            Mode::Mesh => {
                let id = store
                    .peers()
                    .iter()
                    .rev()
                    .find(|n| n.contains(p, margin))
                    .map(|n| n.id.clone())?;
                store.remove_peer(&id)?;
                if self.selected_node.as_deref() == Some(id.as_str()) {
                    self.selected_node = None;
                }
                if self.dragging_node.as_deref() == Some(id.as_str()) {
                    self.dragging_node = None;
                }
            }
            Mode::Energy => {
                let id = store
                    .components()
                    .iter()
                    .rev()
                    .find(|c| c.contains(p, 0.0))
                    .map(|c| c.id)?;
                store.remove_component(id)?;
                if self.grabbed == Some(Grab::Component(id)) {
                    self.grabbed = None;
                }
            }
            Mode::Nano => {
                let id = store
                    .atoms()
                    .iter()
                    .rev()
                    .find(|a| a.contains(p, margin))
                    .map(|a| a.id)?;
                store.remove_atom(id)?;
                if self.bond_source == Some(id) {
                    self.bond_source = None;
                }
                if self.hovered_atom == Some(id) {
                    self.hovered_atom = None;
                }
                if self.grabbed == Some(Grab::Atom(id)) {
                    self.grabbed = None;
                }
            }
        }
        Some(InteractionEvent::Removed)
    }
}

/// Random draws before falling back to the store's id counter
const NODE_ID_ATTEMPTS: usize = 32;

/// A free `PREFIX-NNNN` id. After `NODE_ID_ATTEMPTS` collisions the suffix
/// comes from the store's monotonic counter instead.
pub(crate) fn unique_node_id(
    store: &mut EntityStore,
    rng: &mut dyn RandomSource,
    prefix: &str,
) -> String {
    for _ in 0..NODE_ID_ATTEMPTS {
        let id = format!("{prefix}{}", rng.range_u32(1000, 9999));
        if store.node(&id).is_none() {
            return id;
        }
    }
    debug!(prefix, "Random node ids exhausted, using counter");
    // Terminates: every pass draws a new counter value and peers are finite
    loop {
        let id = format!("{prefix}{}", store.next_id());
        if store.node(&id).is_none() {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::SequenceRandom;

    fn setup(mode: Mode) -> (InteractionHandler, EntityStore, SandboxConfig, SequenceRandom) {
        let store = EntityStore::new(MeshNode::new(
            "PEER-1000",
            "Field Engineer",
            Point::new(400.0, 300.0),
            20.0,
            NodeVariant::Local,
        ));
        (
            InteractionHandler::new(mode),
            store,
            SandboxConfig::default(),
            SequenceRandom::new([0.1, 0.2, 0.3, 0.4]),
        )
    }

    fn drop_atom(
        h: &mut InteractionHandler,
        s: &mut EntityStore,
        c: &SandboxConfig,
        r: &mut SequenceRandom,
        el: &str,
        x: f32,
        y: f32,
    ) -> EntityId {
        match h.drop_item(s, c, r, &DropPayload::new(Mode::Nano, el), Point::new(x, y)) {
            Some(InteractionEvent::Placed(Placed::Atom(id))) => id,
            other => panic!("unexpected {other:?}"),
        }
    }

    fn click(h: &mut InteractionHandler, s: &mut EntityStore, c: &SandboxConfig, x: f32, y: f32) -> Vec<InteractionEvent> {
        let p = Point::new(x, y);
        let events = h.pointer_down(s, c, p);
        h.pointer_up(s, c, p);
        events
    }

    #[test]
    fn drop_carbon_creates_one_atom_at_drop_point() {
        let (mut h, mut s, c, mut r) = setup(Mode::Nano);
        let id = drop_atom(&mut h, &mut s, &c, &mut r, "C", 100.0, 100.0);
        assert_eq!(s.atoms().len(), 1);
        let atom = s.atom(id).unwrap();
        assert_eq!(atom.element, "C");
        assert_eq!(atom.pos, Point::new(100.0, 100.0));
    }

    #[test]
    fn drop_for_other_mode_or_unknown_subtype_is_ignored() {
        let (mut h, mut s, c, mut r) = setup(Mode::Nano);
        let wrong_mode = DropPayload::new(Mode::Energy, "solar");
        assert!(h.drop_item(&mut s, &c, &mut r, &wrong_mode, Point::default()).is_none());
        let unknown = DropPayload::new(Mode::Nano, "Unobtainium");
        assert!(h.drop_item(&mut s, &c, &mut r, &unknown, Point::default()).is_none());
        let bogus_kind = DropPayload { kind: "labs".into(), subtype: "C".into() };
        assert!(h.drop_item(&mut s, &c, &mut r, &bogus_kind, Point::default()).is_none());
        assert!(s.atoms().is_empty());
        assert!(s.components().is_empty());
    }

    #[test]
    fn mesh_drop_creates_simulated_peer() {
        let (mut h, mut s, c, mut r) = setup(Mode::Mesh);
        let ev = h.drop_item(&mut s, &c, &mut r, &DropPayload::new(Mode::Mesh, "relay"), Point::new(10.0, 20.0));
        let Some(InteractionEvent::Placed(Placed::Node(id))) = ev else {
            panic!("expected node");
        };
        assert!(id.starts_with("AI-"));
        let node = s.node(&id).unwrap();
        assert_eq!(node.variant, NodeVariant::Simulated);
        assert_eq!(node.role, "Relay Node");
        assert_eq!(node.radius, 0.0);
        assert_eq!(s.node_count(), 2);
    }

    #[test]
    fn repeated_random_ids_fall_back_to_counter() {
        let (mut h, mut s, c, _) = setup(Mode::Mesh);
        let mut stuck = SequenceRandom::new([0.5]);
        let relay = DropPayload::new(Mode::Mesh, "relay");
        let first = h.drop_item(&mut s, &c, &mut stuck, &relay, Point::new(10.0, 10.0));
        let second = h.drop_item(&mut s, &c, &mut stuck, &relay, Point::new(50.0, 50.0));
        let third = h.drop_item(&mut s, &c, &mut stuck, &relay, Point::new(90.0, 90.0));

        let ids: Vec<String> = [first, second, third]
            .into_iter()
            .map(|ev| match ev {
                Some(InteractionEvent::Placed(Placed::Node(id))) => id,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(ids[0], "AI-5500");
        assert_ne!(ids[1], ids[0]);
        assert_ne!(ids[2], ids[1]);
        assert!(ids.iter().all(|id| id.starts_with("AI-")));
        assert_eq!(s.node_count(), 4);
    }

    #[test]
    fn grid_drag_snaps_on_release() {
        let (mut h, mut s, c, mut r) = setup(Mode::Energy);
        h.drop_item(&mut s, &c, &mut r, &DropPayload::new(Mode::Energy, "solar"), Point::new(100.0, 100.0));
        let id = s.components()[0].id;

        h.pointer_down(&mut s, &c, Point::new(105.0, 95.0));
        assert!(s.component(id).unwrap().dragging);
        h.pointer_move(&mut s, &c, Point::new(233.0, 187.0));
        // Stored position is untouched during the drag
        assert_eq!(s.component(id).unwrap().pos, Point::new(100.0, 100.0));

        h.pointer_up(&mut s, &c, Point::new(233.0, 187.0));
        let comp = s.component(id).unwrap();
        assert!(!comp.dragging);
        assert_eq!(comp.pos, Point::new(240.0, 180.0));
    }

    #[test]
    fn atom_drag_snaps_on_release() {
        let (mut h, mut s, c, mut r) = setup(Mode::Nano);
        let id = drop_atom(&mut h, &mut s, &c, &mut r, "O", 50.0, 50.0);
        h.pointer_down(&mut s, &c, Point::new(50.0, 50.0));
        h.pointer_up(&mut s, &c, Point::new(71.0, 129.0));
        assert_eq!(s.atom(id).unwrap().pos, Point::new(80.0, 120.0));
    }

    #[test]
    fn mesh_selection_and_free_drag() {
        let (mut h, mut s, c, _) = setup(Mode::Mesh);
        let events = h.pointer_down(&mut s, &c, Point::new(405.0, 305.0));
        assert_eq!(events, vec![InteractionEvent::NodeSelected(Some("PEER-1000".into()))]);
        h.pointer_move(&mut s, &c, Point::new(123.0, 457.0));
        assert_eq!(s.local().pos, Point::new(123.0, 457.0));
        h.pointer_up(&mut s, &c, Point::new(123.0, 457.0));
        // No snapping for mesh nodes
        assert_eq!(s.local().pos, Point::new(123.0, 457.0));
        assert_eq!(h.selected_node(), Some("PEER-1000"));

        let events = h.pointer_down(&mut s, &c, Point::new(10.0, 10.0));
        assert_eq!(events, vec![InteractionEvent::NodeSelected(None)]);
        assert_eq!(h.selected_node(), None);

        // Clicking empty space with nothing selected stays quiet
        assert!(h.pointer_down(&mut s, &c, Point::new(10.0, 10.0)).is_empty());
    }

    #[test]
    fn hit_radius_includes_margin() {
        let (mut h, mut s, c, _) = setup(Mode::Mesh);
        // Local radius 20 + margin 10: 29px away still hits
        let events = h.pointer_down(&mut s, &c, Point::new(429.0, 300.0));
        assert_eq!(events.len(), 1);
        h.pointer_up(&mut s, &c, Point::new(429.0, 300.0));
        let events = h.pointer_down(&mut s, &c, Point::new(500.0, 300.0));
        assert_eq!(events, vec![InteractionEvent::NodeSelected(None)]);
    }

    #[test]
    fn bonding_arm_then_complete() {
        let (mut h, mut s, c, mut r) = setup(Mode::Nano);
        let a = drop_atom(&mut h, &mut s, &c, &mut r, "C", 100.0, 100.0);
        let b = drop_atom(&mut h, &mut s, &c, &mut r, "H", 200.0, 100.0);

        assert!(click(&mut h, &mut s, &c, 100.0, 100.0).is_empty());
        assert_eq!(h.bond_source(), Some(a));

        let events = click(&mut h, &mut s, &c, 200.0, 100.0);
        assert!(matches!(events[0], InteractionEvent::BondFormed { a: x, b: y, .. } if x == a && y == b));
        assert_eq!(h.bond_source(), None);
        assert_eq!(s.bonds().len(), 1);
    }

    #[test]
    fn empty_click_disarms_without_bond() {
        let (mut h, mut s, c, mut r) = setup(Mode::Nano);
        drop_atom(&mut h, &mut s, &c, &mut r, "C", 100.0, 100.0);
        drop_atom(&mut h, &mut s, &c, &mut r, "H", 200.0, 100.0);
        click(&mut h, &mut s, &c, 100.0, 100.0);
        click(&mut h, &mut s, &c, 600.0, 500.0);
        assert_eq!(h.bond_source(), None);
        click(&mut h, &mut s, &c, 200.0, 100.0);
        assert!(s.bonds().is_empty());
        assert!(h.bond_source().is_some());
    }

    #[test]
    fn same_atom_twice_stays_armed() {
        let (mut h, mut s, c, mut r) = setup(Mode::Nano);
        let a = drop_atom(&mut h, &mut s, &c, &mut r, "C", 100.0, 100.0);
        click(&mut h, &mut s, &c, 100.0, 100.0);
        click(&mut h, &mut s, &c, 100.0, 100.0);
        assert_eq!(h.bond_source(), Some(a));
        assert!(s.bonds().is_empty());
    }

    #[test]
    fn third_bond_raises_stability_once_then_duplicates_are_noops() {
        let (mut h, mut s, c, mut r) = setup(Mode::Nano);
        let pts = [(100.0, 100.0), (200.0, 100.0), (300.0, 100.0), (400.0, 100.0)];
        for (i, &(x, y)) in pts.iter().enumerate() {
            drop_atom(&mut h, &mut s, &c, &mut r, ["C", "H", "O", "N"][i], x, y);
        }
        let mut stability_events = 0;
        for pair in [(0, 1), (1, 2), (2, 3)] {
            click(&mut h, &mut s, &c, pts[pair.0].0, pts[pair.0].1);
            let events = click(&mut h, &mut s, &c, pts[pair.1].0, pts[pair.1].1);
            stability_events += events
                .iter()
                .filter(|e| **e == InteractionEvent::StabilityReached)
                .count();
        }
        assert_eq!(s.bonds().len(), 3);
        assert!(s.is_stable());
        assert_eq!(stability_events, 1);

        // Duplicate attempt (reverse order)
        click(&mut h, &mut s, &c, pts[1].0, pts[1].1);
        let events = click(&mut h, &mut s, &c, pts[0].0, pts[0].1);
        assert!(events.is_empty());
        assert_eq!(s.bonds().len(), 3);
        assert!(s.is_stable());
    }

    #[test]
    fn secondary_remove_never_touches_local_node() {
        let (mut h, mut s, c, mut r) = setup(Mode::Mesh);
        assert!(h.remove_at(&mut s, &c, Point::new(400.0, 300.0)).is_none());
        h.drop_item(&mut s, &c, &mut r, &DropPayload::new(Mode::Mesh, "gateway"), Point::new(50.0, 50.0));
        assert_eq!(h.remove_at(&mut s, &c, Point::new(52.0, 48.0)), Some(InteractionEvent::Removed));
        assert_eq!(s.node_count(), 1);
    }

    #[test]
    fn removing_armed_atom_disarms() {
        let (mut h, mut s, c, mut r) = setup(Mode::Nano);
        drop_atom(&mut h, &mut s, &c, &mut r, "C", 100.0, 100.0);
        click(&mut h, &mut s, &c, 100.0, 100.0);
        assert!(h.bond_source().is_some());
        h.remove_at(&mut s, &c, Point::new(100.0, 100.0));
        assert_eq!(h.bond_source(), None);
        assert!(s.atoms().is_empty());
    }

    #[test]
    fn mode_switch_releases_drag_without_snapping() {
        let (mut h, mut s, c, mut r) = setup(Mode::Energy);
        h.drop_item(&mut s, &c, &mut r, &DropPayload::new(Mode::Energy, "battery"), Point::new(101.0, 99.0));
        h.pointer_down(&mut s, &c, Point::new(101.0, 99.0));
        h.set_mode(&mut s, Mode::Nano);
        let comp = &s.components()[0];
        assert!(!comp.dragging);
        assert_eq!(comp.pos, Point::new(101.0, 99.0));
    }
}
