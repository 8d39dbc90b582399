//! Transport abstraction for the event consumer.
//!
//! A transport delivers raw payloads with at-least-once semantics: a pulled
//! message stays pending until acknowledged, and unacknowledged messages are
//! redelivered on the next pull. The consumer decides when to ack.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A raw message pulled from the transport.
#[derive(Debug, Clone)]
pub struct TransportMessage {
    /// Transport-assigned delivery id, passed back to `ack`.
    pub delivery_id: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport connection error: {0}")]
    Connection(String),

    #[error("transport protocol error: {0}")]
    Protocol(String),
}

/// Source of inbound event payloads.
///
/// `pull` returns pending (previously delivered, unacknowledged) messages
/// before new ones, so a consumer that crashed mid-batch resumes where it
/// left off.
pub trait EventTransport: Send {
    fn pull(&mut self, max: usize) -> Result<Vec<TransportMessage>, TransportError>;

    fn ack(&mut self, delivery_ids: &[String]) -> Result<(), TransportError>;
}

#[derive(Default)]
struct InMemoryState {
    queue: VecDeque<(String, Vec<u8>)>,
    pending: Vec<(String, Vec<u8>)>,
    next_id: u64,
}

/// In-process transport backed by a shared queue.
///
/// Clones share the same queue, so tests can hold one handle for pushing
/// while the consumer thread pulls from another.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, payload: Vec<u8>) {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id.to_string();
        state.queue.push_back((id, payload));
    }

    /// Number of delivered-but-unacknowledged messages.
    pub fn pending_len(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }
}

impl EventTransport for InMemoryTransport {
    fn pull(&mut self, max: usize) -> Result<Vec<TransportMessage>, TransportError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let mut out = Vec::new();
        for (id, payload) in state.pending.iter().take(max) {
            out.push(TransportMessage {
                delivery_id: id.clone(),
                payload: payload.clone(),
            });
        }
        while out.len() < max {
            let Some((id, payload)) = state.queue.pop_front() else {
                break;
            };
            out.push(TransportMessage {
                delivery_id: id.clone(),
                payload: payload.clone(),
            });
            state.pending.push((id, payload));
        }
        Ok(out)
    }

    fn ack(&mut self, delivery_ids: &[String]) -> Result<(), TransportError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| TransportError::Connection(e.to_string()))?;
        state
            .pending
            .retain(|(id, _)| !delivery_ids.contains(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unacked_messages_are_redelivered() {
        let transport = InMemoryTransport::new();
        transport.push(b"a".to_vec());
        transport.push(b"b".to_vec());

        let mut puller = transport.clone();
        let first = puller.pull(10).unwrap();
        assert_eq!(first.len(), 2);

        // Nothing acked, so the same messages come back.
        let again = puller.pull(10).unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(again[0].delivery_id, first[0].delivery_id);

        puller.ack(&[first[0].delivery_id.clone()]).unwrap();
        let remaining = puller.pull(10).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].payload, b"b".to_vec());
    }

    #[test]
    fn pull_respects_max() {
        let transport = InMemoryTransport::new();
        for i in 0..5 {
            transport.push(vec![i]);
        }
        let mut puller = transport.clone();
        assert_eq!(puller.pull(2).unwrap().len(), 2);
        // Pending-first: the two unacked plus one new.
        assert_eq!(puller.pull(3).unwrap().len(), 3);
    }
}
