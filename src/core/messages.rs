//! Mesh message log
//!
//! Outgoing messages stay SENDING until every packet carrying them has
//! arrived; arrival is the only acknowledgement the mesh models. The log
//! keeps the latest `MESSAGE_LIMIT` entries.

use serde::Serialize;

use super::entities::EntityId;
use super::signal::InboundMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    Sending,
    Delivered,
    Received,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshMessage {
    pub seq: u64,
    pub sender_id: String,
    pub target_id: String,
    pub text: String,
    pub timestamp: u64,
    pub status: MessageStatus,
    /// Packets still in flight for this message
    #[serde(skip)]
    in_flight: Vec<EntityId>,
}

/// Entries kept before the oldest are dropped
pub const MESSAGE_LIMIT: usize = 200;

#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<MeshMessage>,
    next_seq: u64,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[MeshMessage] {
        &self.entries
    }

    fn push(&mut self, mut msg: MeshMessage) -> u64 {
        self.next_seq += 1;
        msg.seq = self.next_seq;
        if self.entries.len() >= MESSAGE_LIMIT {
            let excess = self.entries.len() + 1 - MESSAGE_LIMIT;
            self.entries.drain(..excess);
        }
        self.entries.push(msg);
        self.next_seq
    }

    /// Record an outgoing message carried by `packets`.
    pub fn record_sent(
        &mut self,
        sender_id: &str,
        target_id: &str,
        text: &str,
        timestamp: u64,
        packets: Vec<EntityId>,
    ) -> u64 {
        let status = if packets.is_empty() {
            MessageStatus::Delivered
        } else {
            MessageStatus::Sending
        };
        self.push(MeshMessage {
            seq: 0,
            sender_id: sender_id.to_string(),
            target_id: target_id.to_string(),
            text: text.to_string(),
            timestamp,
            status,
            in_flight: packets,
        })
    }

    pub fn record_received(&mut self, msg: InboundMessage) -> u64 {
        self.push(MeshMessage {
            seq: 0,
            sender_id: msg.sender_id,
            target_id: msg.target_id,
            text: msg.text,
            timestamp: msg.timestamp,
            status: MessageStatus::Received,
            in_flight: Vec::new(),
        })
    }

    /// A packet arrived; returns the seq of a message it completed.
    pub fn packet_arrived(&mut self, packet: EntityId) -> Option<u64> {
        let msg = self
            .entries
            .iter_mut()
            .find(|m| m.in_flight.contains(&packet))?;
        msg.in_flight.retain(|&p| p != packet);
        if msg.in_flight.is_empty() && msg.status == MessageStatus::Sending {
            msg.status = MessageStatus::Delivered;
            return Some(msg.seq);
        }
        None
    }

    /// Messages from or to `peer_id`
    pub fn conversation<'a>(&'a self, peer_id: &'a str) -> impl Iterator<Item = &'a MeshMessage> {
        self.entries
            .iter()
            .filter(move |m| m.sender_id == peer_id || m.target_id == peer_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivered_after_last_packet() {
        let mut log = MessageLog::new();
        let seq = log.record_sent("PEER-1", "ALL", "hi", 0, vec![EntityId(1), EntityId(2)]);
        assert_eq!(log.packet_arrived(EntityId(1)), None);
        assert_eq!(log.entries()[0].status, MessageStatus::Sending);
        assert_eq!(log.packet_arrived(EntityId(2)), Some(seq));
        assert_eq!(log.entries()[0].status, MessageStatus::Delivered);
        // Unknown or repeated arrivals are ignored
        assert_eq!(log.packet_arrived(EntityId(2)), None);
    }

    #[test]
    fn log_keeps_latest_entries() {
        let mut log = MessageLog::new();
        for i in 0..MESSAGE_LIMIT + 5 {
            log.record_sent("PEER-1", "ALL", &format!("m{i}"), 0, vec![]);
        }
        assert_eq!(log.entries().len(), MESSAGE_LIMIT);
        assert_eq!(log.entries()[0].text, "m5");
        assert_eq!(log.entries()[0].seq, 6);
        let last = &log.entries()[MESSAGE_LIMIT - 1];
        assert_eq!(last.seq, (MESSAGE_LIMIT + 5) as u64);
    }

    #[test]
    fn conversation_filter() {
        let mut log = MessageLog::new();
        log.record_sent("PEER-1", "AI-2000", "a", 0, vec![EntityId(1)]);
        log.record_sent("PEER-1", "AI-3000", "b", 0, vec![EntityId(2)]);
        log.record_received(InboundMessage {
            sender_id: "AI-2000".into(),
            target_id: "ALL".into(),
            text: "c".into(),
            timestamp: 0,
        });
        let texts: Vec<_> = log.conversation("AI-2000").map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
        assert_eq!(log.entries()[2].status, MessageStatus::Received);
        assert_eq!(log.entries()[2].seq, 3);
    }
}
