//! Native signal bus for the headless CLI
//!
//! A tokio broadcast channel stands in for the browser's
//! `BroadcastChannel`: every session in the process holds one endpoint,
//! and a publish reaches every endpoint except the one that sent it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

use crate::core::error::SignalError;
use crate::core::signal::{decode_all, Envelope, SignalBus};

/// Envelopes buffered per endpoint before slow readers start lagging
const CAPACITY: usize = 1024;

type Frame = (u64, String);

/// Process-wide channel; hand out one endpoint per session.
#[derive(Clone)]
pub struct NativeHub {
    tx: broadcast::Sender<Frame>,
    next_id: Arc<AtomicU64>,
}

impl NativeHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CAPACITY);
        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn endpoint(&self) -> NativeEndpoint {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(endpoint = id, "Bus endpoint opened");
        NativeEndpoint {
            id,
            tx: self.tx.clone(),
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Endpoints still subscribed
    pub fn open_endpoints(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for NativeHub {
    fn default() -> Self {
        Self::new()
    }
}

pub struct NativeEndpoint {
    id: u64,
    tx: broadcast::Sender<Frame>,
    rx: Option<broadcast::Receiver<Frame>>,
}

impl SignalBus for NativeEndpoint {
    fn publish(&mut self, envelope: &Envelope) -> Result<(), SignalError> {
        if self.rx.is_none() {
            return Err(SignalError::Closed);
        }
        let raw = envelope.encode()?;
        // Only fails when nobody listens, which is not an error for a broadcast
        let _ = self.tx.send((self.id, raw));
        Ok(())
    }

    fn drain(&mut self) -> Vec<Envelope> {
        let Some(rx) = self.rx.as_mut() else {
            return Vec::new();
        };
        let mut raw = Vec::new();
        loop {
            match rx.try_recv() {
                Ok((from, text)) => {
                    if from != self.id {
                        raw.push(text);
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(endpoint = self.id, skipped, "Bus reader lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        decode_all(raw)
    }

    fn close(&mut self) {
        if self.rx.take().is_some() {
            debug!(endpoint = self.id, "Bus endpoint closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping(id: &str) -> Envelope {
        Envelope::Ping {
            sender_id: id.to_string(),
        }
    }

    #[test]
    fn publish_skips_sender() {
        let hub = NativeHub::new();
        let mut a = hub.endpoint();
        let mut b = hub.endpoint();
        a.publish(&ping("PEER-1000")).unwrap();
        assert!(a.drain().is_empty());
        assert_eq!(b.drain(), vec![ping("PEER-1000")]);
        assert!(b.drain().is_empty());
    }

    #[test]
    fn closed_endpoint_unsubscribes() {
        let hub = NativeHub::new();
        let mut a = hub.endpoint();
        let _b = hub.endpoint();
        assert_eq!(hub.open_endpoints(), 2);
        a.close();
        assert_eq!(hub.open_endpoints(), 1);
        assert!(matches!(a.publish(&ping("PEER-1000")), Err(SignalError::Closed)));
        assert!(a.drain().is_empty());
    }
}
