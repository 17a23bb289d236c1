//! Cross-session signal channel
//!
//! Sessions of the same origin share a local publish/subscribe bus. There
//! is no networking here: delivery is best-effort, unordered and at most
//! once per publish. The bus implementation is platform specific
//! (`BroadcastChannel` in the browser, a tokio broadcast channel in the
//! CLI, [`LoopbackHub`] in tests); this module owns the envelope format
//! and what a received envelope does to the store.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, trace, warn};

use super::config::SandboxConfig;
use super::entities::{EntityId, GeoCoord, MeshNode, NodeVariant, PacketKind, Point};
use super::error::SignalError;
use super::rng::RandomSource;
use super::simulation::Bounds;
use super::store::EntityStore;

/// Channel name shared by every session of the origin
pub const CHANNEL_NAME: &str = "sigmesh_p2p_channel";
/// Message target meaning "every peer"
pub const BROADCAST_TARGET: &str = "ALL";
pub const REMOTE_ROLE: &str = "Remote Peer";

// ============================================================================
// Envelope
// ============================================================================

/// One message on the bus. Older sessions used `HEARTBEAT`/`MSG` tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Envelope {
    #[serde(alias = "HEARTBEAT", rename_all = "camelCase")]
    Presence {
        sender_id: String,
        #[serde(default)]
        lat: f64,
        #[serde(default)]
        lon: f64,
    },
    #[serde(rename_all = "camelCase")]
    Ping { sender_id: String },
    #[serde(alias = "MSG", rename_all = "camelCase")]
    Message {
        sender_id: String,
        target_id: String,
        text: String,
        /// Unix milliseconds
        #[serde(default)]
        timestamp: u64,
    },
}

impl Envelope {
    pub fn sender_id(&self) -> &str {
        match self {
            Envelope::Presence { sender_id, .. }
            | Envelope::Ping { sender_id }
            | Envelope::Message { sender_id, .. } => sender_id,
        }
    }

    pub fn encode(&self) -> Result<String, SignalError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self, SignalError> {
        Ok(serde_json::from_str(raw)?)
    }
}

// ============================================================================
// Bus
// ============================================================================

/// Handle on the shared bus held by one session.
pub trait SignalBus {
    fn publish(&mut self, envelope: &Envelope) -> Result<(), SignalError>;

    /// Envelopes received since the last call, in arrival order.
    fn drain(&mut self) -> Vec<Envelope>;

    /// Release the subscription. Later publishes fail with `Closed`.
    fn close(&mut self);
}

/// In-process bus connecting any number of endpoints on one thread.
///
/// Like `BroadcastChannel`, a publish reaches every endpoint except the
/// publisher.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    inboxes: Rc<RefCell<Vec<Option<VecDeque<String>>>>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(&self) -> LoopbackEndpoint {
        let mut inboxes = self.inboxes.borrow_mut();
        inboxes.push(Some(VecDeque::new()));
        LoopbackEndpoint {
            hub: self.clone(),
            slot: inboxes.len() - 1,
        }
    }

    /// Endpoints that have not been closed
    pub fn open_endpoints(&self) -> usize {
        self.inboxes.borrow().iter().filter(|i| i.is_some()).count()
    }

    /// Inject raw text as if another session had posted it.
    pub fn inject_raw(&self, raw: &str) {
        for inbox in self.inboxes.borrow_mut().iter_mut().flatten() {
            inbox.push_back(raw.to_string());
        }
    }
}

pub struct LoopbackEndpoint {
    hub: LoopbackHub,
    slot: usize,
}

impl SignalBus for LoopbackEndpoint {
    fn publish(&mut self, envelope: &Envelope) -> Result<(), SignalError> {
        let raw = envelope.encode()?;
        let mut inboxes = self.hub.inboxes.borrow_mut();
        if inboxes[self.slot].is_none() {
            return Err(SignalError::Closed);
        }
        for (i, inbox) in inboxes.iter_mut().enumerate() {
            if i == self.slot {
                continue;
            }
            if let Some(inbox) = inbox {
                inbox.push_back(raw.clone());
            }
        }
        Ok(())
    }

    fn drain(&mut self) -> Vec<Envelope> {
        let raw: Vec<String> = match self.hub.inboxes.borrow_mut()[self.slot].as_mut() {
            Some(inbox) => inbox.drain(..).collect(),
            None => return Vec::new(),
        };
        decode_all(raw)
    }

    fn close(&mut self) {
        self.hub.inboxes.borrow_mut()[self.slot] = None;
    }
}

impl Drop for LoopbackEndpoint {
    fn drop(&mut self) {
        self.close();
    }
}

/// Decode raw bus text, dropping anything malformed.
pub fn decode_all(raw: impl IntoIterator<Item = String>) -> Vec<Envelope> {
    raw.into_iter()
        .filter_map(|r| match Envelope::decode(&r) {
            Ok(env) => Some(env),
            Err(e) => {
                warn!(error = %e, "Dropping malformed signal");
                None
            }
        })
        .collect()
}

// ============================================================================
// Receive side
// ============================================================================

/// Message delivered to this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender_id: String,
    pub target_id: String,
    pub text: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignalEvent {
    /// A previously unseen sender; a remote peer node was created
    PeerJoined(String),
    /// Known sender re-announced; coordinates updated
    PeerUpdated(String),
    PingReceived { from: String, packet: EntityId },
    MessageReceived { message: InboundMessage, packet: EntityId },
}

/// Apply one received envelope to the store.
///
/// Self-originated envelopes are ignored entirely. Pings and messages from
/// senders with no node yet are dropped.
pub fn apply_envelope(
    store: &mut EntityStore,
    config: &SandboxConfig,
    rng: &mut dyn RandomSource,
    bounds: Bounds,
    envelope: Envelope,
) -> Option<SignalEvent> {
    if envelope.sender_id() == store.local_id() {
        trace!("Ignoring self-originated signal");
        return None;
    }

    match envelope {
        Envelope::Presence { sender_id, lat, lon } => {
            let geo = GeoCoord { lat, lon };
            if let Some(node) = store.node_mut(&sender_id) {
                node.geo = Some(geo);
                return Some(SignalEvent::PeerUpdated(sender_id));
            }
            let pos = Point::new(
                (rng.next_f32() * 0.6 + 0.2) * bounds.width,
                (rng.next_f32() * 0.6 + 0.2) * bounds.height,
            );
            let mut node = MeshNode::new(
                sender_id.clone(),
                REMOTE_ROLE,
                pos,
                config.remote_radius,
                NodeVariant::Remote,
            );
            node.geo = Some(geo);
            store.insert_peer(node);
            debug!(peer = %sender_id, "Remote peer discovered");
            Some(SignalEvent::PeerJoined(sender_id))
        }
        Envelope::Ping { sender_id } => {
            let from = store.node(&sender_id)?.pos;
            let to = store.local().pos;
            let packet = store.push_packet(from, to, PacketKind::Ping, config.ping_speed, None);
            Some(SignalEvent::PingReceived {
                from: sender_id,
                packet,
            })
        }
        Envelope::Message {
            sender_id,
            target_id,
            text,
            timestamp,
        } => {
            if target_id != BROADCAST_TARGET && target_id != store.local_id() {
                return None;
            }
            let from = store.node(&sender_id)?.pos;
            let to = store.local().pos;
            let packet = store.push_packet(
                from,
                to,
                PacketKind::Message,
                config.message_speed,
                Some(text.clone()),
            );
            debug!(from = %sender_id, to = %target_id, "Message received");
            Some(SignalEvent::MessageReceived {
                message: InboundMessage {
                    sender_id,
                    target_id,
                    text,
                    timestamp,
                },
                packet,
            })
        }
    }
}

// ============================================================================
// Presence
// ============================================================================

/// Fixed-interval presence schedule, polled with the app clock.
#[derive(Debug, Clone)]
pub struct PresenceBeacon {
    interval: f64,
    next_due: Option<f64>,
}

impl PresenceBeacon {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    /// True when an announcement is due. The first poll is always due.
    pub fn poll(&mut self, now: f64) -> bool {
        match self.next_due {
            Some(due) if now < due => false,
            _ => {
                self.next_due = Some(now + self.interval);
                true
            }
        }
    }
}
