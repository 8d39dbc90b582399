//! Event consumption loop.
//!
//! The consumer owns a dedicated OS thread and bridges into the async stores
//! through a tokio runtime handle. Acknowledgement happens only after the
//! engine has applied (or terminally rejected) a message, so a crash or a
//! store outage leaves the message pending and the transport redelivers it.

mod redis_streams;
mod transport;

pub use redis_streams::RedisStreamsTransport;
pub use transport::{EventTransport, InMemoryTransport, TransportError, TransportMessage};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{error, info, warn};

use wareflow_events::EventEnvelope;

use crate::engine::{ApplyOutcome, ReconciliationEngine};
use crate::store::{LedgerStore, MovementStore, StoreError};

const BATCH_SIZE: usize = 16;
const IDLE_WAIT: Duration = Duration::from_millis(25);

/// Exponential backoff for transport and store failures.
struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            current: base,
        }
    }

    fn next(&mut self) -> Duration {
        let wait = self.current;
        self.current = (self.current * 2).min(self.max);
        wait
    }

    fn reset(&mut self) {
        self.current = self.base;
    }
}

pub struct Consumer<T, L, M> {
    transport: T,
    engine: Arc<ReconciliationEngine<L, M>>,
    runtime: Handle,
    stop: Arc<AtomicBool>,
}

impl<T, L, M> Consumer<T, L, M>
where
    T: EventTransport + 'static,
    L: LedgerStore + 'static,
    M: MovementStore + 'static,
{
    pub fn new(transport: T, engine: Arc<ReconciliationEngine<L, M>>, runtime: Handle) -> Self {
        Self {
            transport,
            engine,
            runtime,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the consumption loop on its own thread.
    pub fn spawn(mut self) -> ConsumerHandle {
        let stop = self.stop.clone();
        let thread = std::thread::Builder::new()
            .name("wareflow-consumer".into())
            .spawn(move || self.run())
            .expect("spawn consumer thread");
        ConsumerHandle {
            stop,
            thread: Some(thread),
        }
    }

    fn run(&mut self) {
        info!("consumer started");
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(10));

        while !self.stop.load(Ordering::Relaxed) {
            let messages = match self.transport.pull(BATCH_SIZE) {
                Ok(messages) => {
                    backoff.reset();
                    messages
                }
                Err(e) => {
                    error!(error = %e, "transport pull failed, backing off");
                    std::thread::sleep(backoff.next());
                    continue;
                }
            };

            if messages.is_empty() {
                std::thread::sleep(IDLE_WAIT);
                continue;
            }

            for message in messages {
                if self.stop.load(Ordering::Relaxed) {
                    break;
                }
                match self.handle(&message) {
                    Ok(()) => {
                        if let Err(e) = self.transport.ack(&[message.delivery_id.clone()]) {
                            // Ack failure leaves the message pending; identical
                            // redelivery is a no-op in the engine.
                            error!(
                                delivery_id = %message.delivery_id,
                                error = %e,
                                "failed to acknowledge message"
                            );
                        }
                    }
                    Err(e) => {
                        // Store fault: do not ack, let the transport redeliver
                        // after a backoff instead of losing the event.
                        error!(
                            delivery_id = %message.delivery_id,
                            error = %e,
                            "store unavailable, leaving message pending"
                        );
                        std::thread::sleep(backoff.next());
                        break;
                    }
                }
            }
        }

        info!("consumer stopped");
    }

    /// Process one message. `Ok` means the message is done with (applied,
    /// rejected, or unreadable) and must be acked; `Err` means a store fault
    /// and the message stays pending.
    fn handle(&self, message: &TransportMessage) -> Result<(), StoreError> {
        let envelope = match EventEnvelope::decode(&message.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    delivery_id = %message.delivery_id,
                    error = %e,
                    "skipping malformed message"
                );
                return Ok(());
            }
        };

        let outcome = self.runtime.block_on(self.engine.apply(envelope.data()))?;
        if let ApplyOutcome::Rejected(reason) = outcome {
            warn!(
                delivery_id = %message.delivery_id,
                movement_id = %envelope.data().movement_id,
                reason = %reason,
                "event rejected"
            );
        }
        Ok(())
    }
}

/// Handle for stopping and joining a spawned consumer.
pub struct ConsumerHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ConsumerHandle {
    /// Signal the loop to exit after the current iteration.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// Joining on drop keeps the loop from outliving the runtime it blocks on.
impl Drop for ConsumerHandle {
    fn drop(&mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_millis(500));
        assert_eq!(backoff.next(), Duration::from_millis(100));
        assert_eq!(backoff.next(), Duration::from_millis(200));
        assert_eq!(backoff.next(), Duration::from_millis(400));
        assert_eq!(backoff.next(), Duration::from_millis(500));
        assert_eq!(backoff.next(), Duration::from_millis(500));
        backoff.reset();
        assert_eq!(backoff.next(), Duration::from_millis(100));
    }
}
