//! One canvas mount: store, interaction, frame loop and signal channel
//!
//! A `SandboxSession` is created when a canvas view is shown and stopped
//! when it goes away. Stopping (or dropping) releases the bus
//! subscription; the host cancels its own frame scheduling.

use tracing::{debug, info, warn};

use super::achievements::AchievementId;
use super::catalog::peer_spec;
use super::config::SandboxConfig;
use super::entities::{EntityId, GeoCoord, MeshNode, Mode, NodeVariant, PacketKind, Point};
use super::geo::GeoStatus;
use super::interaction::{unique_node_id, DropPayload, InteractionEvent, InteractionHandler};
use super::messages::MessageLog;
use super::modifiers::GlobalModifiers;
use super::publisher::{Snapshot, StatePublisher};
use super::render::{render, DrawList, FrameView};
use super::rng::RandomSource;
use super::signal::{apply_envelope, Envelope, PresenceBeacon, SignalBus, SignalEvent, BROADCAST_TARGET};
use super::simulation::{Arrival, Bounds, Simulation};
use super::store::EntityStore;

pub const LOCAL_PREFIX: &str = "PEER-";
pub const LOCAL_ROLE: &str = "Field Engineer";
/// Local id suffix range. Wide enough that tabs opened together rarely
/// collide; a collision would make each ignore the other as itself.
pub const LOCAL_ID_RANGE: (u32, u32) = (100_000, 999_999);

/// What happened during one frame.
#[derive(Debug, Default)]
pub struct FrameReport {
    pub arrivals: Vec<Arrival>,
    pub signals: Vec<SignalEvent>,
    /// Present on publish-cadence frames
    pub snapshot: Option<Snapshot>,
    /// Achievement triggers; the owner de-duplicates
    pub achievements: Vec<AchievementId>,
}

pub struct SandboxSession<B: SignalBus> {
    config: SandboxConfig,
    bounds: Bounds,
    store: EntityStore,
    interaction: InteractionHandler,
    simulation: Simulation,
    publisher: StatePublisher,
    beacon: PresenceBeacon,
    messages: MessageLog,
    geo: GeoStatus,
    bus: B,
    rng: Box<dyn RandomSource + Send>,
    /// Flags seen by the last frame, used by `render`
    modifiers: GlobalModifiers,
    stopped: bool,
}

impl<B: SignalBus> SandboxSession<B> {
    pub fn new(
        config: SandboxConfig,
        bounds: Bounds,
        mode: Mode,
        bus: B,
        mut rng: Box<dyn RandomSource + Send>,
    ) -> Self {
        let (lo, hi) = LOCAL_ID_RANGE;
        let id = format!("{LOCAL_PREFIX}{}", rng.range_u32(lo, hi));
        let local = MeshNode::new(
            id.clone(),
            LOCAL_ROLE,
            bounds.center(),
            config.local_radius,
            NodeVariant::Local,
        );
        info!(%id, %mode, width = bounds.width, height = bounds.height, "Session started");
        Self {
            publisher: StatePublisher::new(config.publish_every_frames),
            beacon: PresenceBeacon::new(config.presence_interval),
            config,
            bounds,
            store: EntityStore::new(local),
            interaction: InteractionHandler::new(mode),
            simulation: Simulation::new(),
            messages: MessageLog::new(),
            geo: GeoStatus::default(),
            bus,
            rng,
            modifiers: GlobalModifiers::default(),
            stopped: false,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> &str {
        self.store.local_id()
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn interaction(&self) -> &InteractionHandler {
        &self.interaction
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    pub fn mode(&self) -> Mode {
        self.interaction.mode()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn frame_count(&self) -> u64 {
        self.simulation.frame()
    }

    pub fn geo(&self) -> &GeoStatus {
        &self.geo
    }

    pub fn latest_snapshot(&self) -> Option<&Snapshot> {
        self.publisher.latest()
    }

    /// Fresh snapshot of the store right now.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.store, self.mode(), self.simulation.frame())
    }

    pub fn selected_node(&self) -> Option<&MeshNode> {
        self.interaction
            .selected_node()
            .and_then(|id| self.store.node(id))
    }

    // ------------------------------------------------------------------
    // Host environment
    // ------------------------------------------------------------------

    pub fn resize(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.interaction.set_mode(&mut self.store, mode);
    }

    pub fn set_geo_fix(&mut self, coord: GeoCoord) {
        self.store.local_mut().geo = Some(coord);
        self.geo = GeoStatus::Online(coord);
    }

    pub fn set_geo_unavailable(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(%reason, "Geolocation unavailable");
        self.geo = GeoStatus::Unavailable(reason);
    }

    // ------------------------------------------------------------------
    // Pointer input
    // ------------------------------------------------------------------

    pub fn pointer_down(&mut self, p: Point) -> Vec<InteractionEvent> {
        self.interaction.pointer_down(&mut self.store, &self.config, p)
    }

    pub fn pointer_move(&mut self, p: Point) {
        self.interaction.pointer_move(&mut self.store, &self.config, p);
    }

    pub fn pointer_up(&mut self, p: Point) {
        self.interaction.pointer_up(&mut self.store, &self.config, p);
    }

    pub fn pointer_leave(&mut self) {
        self.interaction.pointer_leave(&mut self.store);
    }

    pub fn select_node(&mut self, id: Option<String>) {
        self.interaction.select_node(id);
    }

    pub fn drop_item(&mut self, payload: &DropPayload, p: Point) -> Option<InteractionEvent> {
        self.interaction
            .drop_item(&mut self.store, &self.config, self.rng.as_mut(), payload, p)
    }

    pub fn remove_at(&mut self, p: Point) -> Option<InteractionEvent> {
        self.interaction.remove_at(&mut self.store, &self.config, p)
    }

    /// Achievement triggers carried by interaction events.
    pub fn achievements_for(events: &[InteractionEvent]) -> Vec<AchievementId> {
        events
            .iter()
            .filter(|e| matches!(e, InteractionEvent::StabilityReached))
            .map(|_| AchievementId::QuantumAlloy)
            .collect()
    }

    // ------------------------------------------------------------------
    // Mesh actions
    // ------------------------------------------------------------------

    fn publish(&mut self, envelope: &Envelope) {
        if self.stopped {
            return;
        }
        if let Err(e) = self.bus.publish(envelope) {
            warn!(error = %e, "Signal publish failed");
        }
    }

    /// Ping every peer. Returns the number of packets queued.
    pub fn ping_all(&mut self) -> usize {
        let from = self.store.local().pos;
        let targets: Vec<Point> = self.store.peers().iter().map(|n| n.pos).collect();
        for &to in &targets {
            self.store
                .push_packet(from, to, PacketKind::Ping, self.config.ping_speed, None);
        }
        let envelope = Envelope::Ping {
            sender_id: self.id().to_string(),
        };
        self.publish(&envelope);
        debug!(peers = targets.len(), "Ping broadcast");
        targets.len()
    }

    /// Send `text` to one peer or to `ALL`. Blank text and unknown targets
    /// are ignored; returns the log sequence number when sent.
    pub fn send_message(&mut self, target_id: &str, text: &str, timestamp_ms: u64) -> Option<u64> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let targets: Vec<Point> = if target_id == BROADCAST_TARGET {
            self.store.peers().iter().map(|n| n.pos).collect()
        } else {
            let node = self.store.peers().iter().find(|n| n.id == target_id)?;
            vec![node.pos]
        };
        if targets.is_empty() {
            return None;
        }

        let from = self.store.local().pos;
        let packets: Vec<EntityId> = targets
            .into_iter()
            .map(|to| {
                self.store.push_packet(
                    from,
                    to,
                    PacketKind::Message,
                    self.config.message_speed,
                    Some(text.to_string()),
                )
            })
            .collect();

        let sender_id = self.id().to_string();
        let envelope = Envelope::Message {
            sender_id: sender_id.clone(),
            target_id: target_id.to_string(),
            text: text.to_string(),
            timestamp: timestamp_ms,
        };
        self.publish(&envelope);
        Some(
            self.messages
                .record_sent(&sender_id, target_id, text, timestamp_ms, packets),
        )
    }

    /// Insert a simulated peer at `p` without a palette drop (scripted).
    pub fn spawn_simulated_peer(&mut self, subtype: &str, p: Point) -> Option<String> {
        let spec = peer_spec(subtype)?;
        let id = unique_node_id(&mut self.store, self.rng.as_mut(), spec.id_prefix);
        let node = MeshNode::new(
            id.clone(),
            spec.role,
            p,
            self.config.simulated_radius,
            NodeVariant::Simulated,
        );
        self.store.insert_peer(node).then_some(id)
    }

    // ------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------

    /// Advance one frame at app time `now` (seconds).
    pub fn frame(&mut self, now: f64, modifiers: GlobalModifiers) -> FrameReport {
        let mut report = FrameReport::default();
        self.modifiers = modifiers;

        // Signals delivered between frames
        if !self.stopped {
            for envelope in self.bus.drain() {
                if let Some(event) = apply_envelope(
                    &mut self.store,
                    &self.config,
                    self.rng.as_mut(),
                    self.bounds,
                    envelope,
                ) {
                    if let SignalEvent::MessageReceived { message, .. } = &event {
                        self.messages.record_received(message.clone());
                    }
                    report.signals.push(event);
                }
            }

            if self.beacon.poll(now) {
                let geo = self.store.local().geo.unwrap_or_default();
                let envelope = Envelope::Presence {
                    sender_id: self.id().to_string(),
                    lat: geo.lat,
                    lon: geo.lon,
                };
                self.publish(&envelope);
            }
        }

        report.arrivals = self.simulation.step(
            &mut self.store,
            self.interaction.mode(),
            modifiers,
            &self.config,
            self.bounds,
        );
        for arrival in &report.arrivals {
            if arrival.kind == PacketKind::Message {
                self.messages.packet_arrived(arrival.id);
            }
        }

        let frame = self.simulation.frame();
        if let Some(snap) = self.publisher.on_frame(&self.store, self.interaction.mode(), frame) {
            if snap.energy.running_on_storage() {
                report.achievements.push(AchievementId::BlackoutSurvivor);
            }
            report.snapshot = Some(snap.clone());
        }
        report
    }

    /// Draw list for the current state.
    pub fn render(&self) -> DrawList {
        render(&FrameView {
            store: &self.store,
            interaction: &self.interaction,
            simulation: &self.simulation,
            modifiers: self.modifiers,
            config: &self.config,
            bounds: self.bounds,
        })
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.bus.close();
        info!(id = %self.store.local_id(), frames = self.simulation.frame(), "Session stopped");
    }

    /// Release the signal subscription and end the session.
    pub fn stop(mut self) {
        self.shutdown();
    }
}

impl<B: SignalBus> Drop for SandboxSession<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::messages::MessageStatus;
    use crate::core::rng::SequenceRandom;
    use crate::core::signal::{LoopbackEndpoint, LoopbackHub};

    fn session(hub: &LoopbackHub, seed: f32) -> SandboxSession<LoopbackEndpoint> {
        SandboxSession::new(
            SandboxConfig::default(),
            Bounds::new(800.0, 600.0),
            Mode::Mesh,
            hub.endpoint(),
            Box::new(SequenceRandom::new([seed, 0.5, 0.5])),
        )
    }

    fn run(s: &mut SandboxSession<LoopbackEndpoint>, from: u32, frames: u32) -> Vec<FrameReport> {
        (from..from + frames)
            .map(|i| s.frame(i as f64 / 60.0, GlobalModifiers::default()))
            .collect()
    }

    #[test]
    fn local_identity_centered() {
        let hub = LoopbackHub::new();
        let s = session(&hub, 0.0);
        assert_eq!(s.id(), "PEER-100000");
        assert_eq!(s.store().local().pos, Point::new(400.0, 300.0));
        assert_eq!(s.store().local().role, LOCAL_ROLE);
    }

    #[test]
    fn sessions_discover_each_other() {
        let hub = LoopbackHub::new();
        let mut a = session(&hub, 0.0);
        let mut b = session(&hub, 0.5);
        assert_ne!(a.id(), b.id());

        // First frame of each announces presence
        run(&mut a, 0, 1);
        let reports = run(&mut b, 0, 1);
        assert_eq!(reports[0].signals, vec![SignalEvent::PeerJoined(a.id().to_string())]);
        run(&mut a, 1, 1);
        assert_eq!(a.store().node_count(), 2);
        assert_eq!(b.store().node_count(), 2);

        // Re-announcing does not duplicate
        run(&mut a, 180, 1);
        run(&mut b, 180, 1);
        assert_eq!(b.store().node_count(), 2);
    }

    #[test]
    fn message_round_trip_marks_delivered() {
        let hub = LoopbackHub::new();
        let mut a = session(&hub, 0.0);
        let mut b = session(&hub, 0.5);
        run(&mut a, 0, 1);
        run(&mut b, 0, 1);
        run(&mut a, 1, 1);

        let b_id = b.id().to_string();
        let seq = a.send_message(&b_id, "status report", 1234).unwrap();
        assert_eq!(a.messages().entries()[0].seq, seq);
        assert_eq!(a.messages().entries()[0].status, MessageStatus::Sending);

        let reports = run(&mut b, 1, 1);
        assert!(reports[0]
            .signals
            .iter()
            .any(|e| matches!(e, SignalEvent::MessageReceived { message, .. } if message.text == "status report")));
        assert_eq!(b.messages().conversation(a.id()).count(), 1);

        // 0.03 per frame: arrives within 34 frames
        run(&mut a, 2, 40);
        assert_eq!(a.messages().entries()[0].status, MessageStatus::Delivered);
        assert!(a.store().packets().is_empty());
    }

    #[test]
    fn blank_or_unknown_messages_ignored() {
        let hub = LoopbackHub::new();
        let mut a = session(&hub, 0.0);
        assert_eq!(a.send_message("ALL", "hello", 0), None);
        a.spawn_simulated_peer("relay", Point::new(100.0, 100.0)).unwrap();
        assert_eq!(a.send_message("ALL", "   ", 0), None);
        assert_eq!(a.send_message("GW-4242", "hello", 0), None);
        assert!(a.send_message("ALL", "hello", 0).is_some());
        assert_eq!(a.store().packets().len(), 1);
    }

    #[test]
    fn scripted_peer_accepts_alias() {
        let hub = LoopbackHub::new();
        let mut a = session(&hub, 0.0);
        let id = a.spawn_simulated_peer("firewall", Point::new(100.0, 100.0)).unwrap();
        assert!(id.starts_with("GW-"));
        assert_eq!(a.store().node(&id).unwrap().role, "Gateway Node");
        assert_eq!(a.spawn_simulated_peer("toaster", Point::default()), None);
    }

    #[test]
    fn local_ids_span_six_digits() {
        let hub = LoopbackHub::new();
        let low = session(&hub, 0.0);
        let high = session(&hub, 0.999_999);
        assert_eq!(low.id(), "PEER-100000");
        assert_eq!(high.id(), "PEER-999999");
        // Draws that shared a four-digit id now land apart
        let a = session(&hub, 0.500_01);
        let b = session(&hub, 0.500_02);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn ping_reaches_peers() {
        let hub = LoopbackHub::new();
        let mut a = session(&hub, 0.0);
        let mut b = session(&hub, 0.5);
        run(&mut a, 0, 1);
        run(&mut b, 0, 1);
        run(&mut a, 1, 1);
        assert_eq!(a.ping_all(), 1);
        let reports = run(&mut b, 1, 1);
        assert!(matches!(reports[0].signals[0], SignalEvent::PingReceived { .. }));
        // 0.05 per frame: arrives on the 20th frame
        let arrivals: usize = run(&mut b, 2, 25).iter().map(|r| r.arrivals.len()).sum();
        assert_eq!(arrivals, 1);
    }

    #[test]
    fn stopped_session_releases_bus() {
        let hub = LoopbackHub::new();
        let a = session(&hub, 0.0);
        let b = session(&hub, 0.5);
        assert_eq!(hub.open_endpoints(), 2);
        a.stop();
        assert_eq!(hub.open_endpoints(), 1);
        drop(b);
        assert_eq!(hub.open_endpoints(), 0);
    }

    #[test]
    fn blackout_survivor_triggers_on_snapshot() {
        let hub = LoopbackHub::new();
        let mut s = session(&hub, 0.0);
        s.set_mode(Mode::Energy);
        s.drop_item(&DropPayload::new(Mode::Energy, "battery"), Point::new(100.0, 100.0));
        s.drop_item(&DropPayload::new(Mode::Energy, "home"), Point::new(200.0, 100.0));
        let reports = run(&mut s, 0, 60);
        assert_eq!(reports[59].achievements, vec![AchievementId::BlackoutSurvivor]);
        assert!(reports[..59].iter().all(|r| r.snapshot.is_none()));
        assert_eq!(reports[59].snapshot.as_ref().unwrap().energy.total_load, 2000.0);
    }

    #[test]
    fn stability_event_maps_to_achievement() {
        let events = vec![
            InteractionEvent::BondFormed { id: EntityId(9), a: EntityId(1), b: EntityId(2) },
            InteractionEvent::StabilityReached,
        ];
        assert_eq!(
            SandboxSession::<LoopbackEndpoint>::achievements_for(&events),
            vec![AchievementId::QuantumAlloy]
        );
    }

    #[test]
    fn presence_carries_geo_fix() {
        let hub = LoopbackHub::new();
        let mut a = session(&hub, 0.0);
        let mut b = session(&hub, 0.5);
        a.set_geo_fix(GeoCoord { lat: 51.5, lon: -0.12 });
        assert_eq!(a.geo().to_string(), "GPS: 51.5000, -0.1200 ONLINE");
        run(&mut a, 0, 1);
        run(&mut b, 0, 1);
        assert_eq!(b.store().node(a.id()).unwrap().geo, Some(GeoCoord { lat: 51.5, lon: -0.12 }));
    }
}
