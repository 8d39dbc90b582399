//! Redis Streams transport (durable, at-least-once delivery).
//!
//! Events live in a single stream; this service reads them through a consumer
//! group so each message is delivered to exactly one consumer and stays in the
//! pending entries list until XACK'd. Pending entries are re-read before new
//! ones, which gives redelivery after a crash or a store outage.

use std::collections::HashMap;

use tracing::debug;

use super::transport::{EventTransport, TransportError, TransportMessage};

/// Stream field holding the JSON-encoded envelope.
const PAYLOAD_FIELD: &str = "payload";

pub struct RedisStreamsTransport {
    client: redis::Client,
    stream_key: String,
    group: String,
    consumer_name: String,
    block_ms: u64,
}

impl RedisStreamsTransport {
    pub fn new(
        redis_url: &str,
        stream_key: String,
        group: String,
        consumer_name: String,
        block_ms: u64,
    ) -> Result<Self, TransportError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let transport = Self {
            client,
            stream_key,
            group,
            consumer_name,
            block_ms,
        };
        transport.ensure_group()?;
        Ok(transport)
    }

    /// Create the consumer group, and the stream itself if missing.
    /// BUSYGROUP errors mean the group already exists and are ignored.
    fn ensure_group(&self) -> Result<(), TransportError> {
        let mut conn = self.connect()?;
        let created: Result<String, _> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.stream_key)
            .arg(&self.group)
            .arg("0")
            .arg("MKSTREAM")
            .query(&mut conn);
        if created.is_ok() {
            debug!(
                stream_key = %self.stream_key,
                group = %self.group,
                "consumer group created"
            );
        }
        Ok(())
    }

    /// Append a payload to the stream. Used by tooling and tests; the service
    /// itself only consumes.
    pub fn publish(&self, payload: &[u8]) -> Result<String, TransportError> {
        let mut conn = self.connect()?;
        let id: String = redis::cmd("XADD")
            .arg(&self.stream_key)
            .arg("*")
            .arg(PAYLOAD_FIELD)
            .arg(payload)
            .query(&mut conn)
            .map_err(|e| TransportError::Protocol(format!("XADD failed: {e}")))?;
        Ok(id)
    }

    fn connect(&self) -> Result<redis::Connection, TransportError> {
        self.client
            .get_connection()
            .map_err(|e| TransportError::Connection(e.to_string()))
    }

    fn read(
        &self,
        conn: &mut redis::Connection,
        start_id: &str,
        max: usize,
        block_ms: Option<u64>,
    ) -> Result<Vec<TransportMessage>, TransportError> {
        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP")
            .arg(&self.group)
            .arg(&self.consumer_name)
            .arg("COUNT")
            .arg(max);
        if let Some(ms) = block_ms {
            cmd.arg("BLOCK").arg(ms);
        }
        cmd.arg("STREAMS").arg(&self.stream_key).arg(start_id);

        // A nil reply means the block timed out with no new entries.
        let reply: Option<HashMap<String, Vec<redis::Value>>> = cmd
            .query(conn)
            .map_err(|e| TransportError::Connection(format!("XREADGROUP failed: {e}")))?;

        let entries = reply
            .and_then(|mut streams| streams.remove(&self.stream_key))
            .unwrap_or_default();

        let mut messages = Vec::new();
        for entry in entries {
            messages.push(parse_entry(entry)?);
        }
        Ok(messages)
    }
}

/// Entry format: [message_id, [field1, value1, ...]].
fn parse_entry(entry: redis::Value) -> Result<TransportMessage, TransportError> {
    let redis::Value::Bulk(parts) = entry else {
        return Err(TransportError::Protocol("unexpected entry shape".into()));
    };
    let mut parts = parts.into_iter();

    let delivery_id = match parts.next() {
        Some(redis::Value::Data(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        _ => return Err(TransportError::Protocol("missing entry id".into())),
    };

    let Some(redis::Value::Bulk(fields)) = parts.next() else {
        return Err(TransportError::Protocol("missing entry fields".into()));
    };

    let mut payload = None;
    for pair in fields.chunks(2) {
        if let [redis::Value::Data(key), redis::Value::Data(value)] = pair {
            if key.as_slice() == PAYLOAD_FIELD.as_bytes() {
                payload = Some(value.clone());
            }
        }
    }

    let payload = payload.ok_or_else(|| {
        TransportError::Protocol(format!("entry {delivery_id} has no payload field"))
    })?;

    Ok(TransportMessage {
        delivery_id,
        payload,
    })
}

impl EventTransport for RedisStreamsTransport {
    fn pull(&mut self, max: usize) -> Result<Vec<TransportMessage>, TransportError> {
        let mut conn = self.connect()?;

        // Re-read this consumer's pending entries before asking for new ones.
        let pending = self.read(&mut conn, "0", max, None)?;
        if !pending.is_empty() {
            return Ok(pending);
        }

        self.read(&mut conn, ">", max, Some(self.block_ms))
    }

    fn ack(&mut self, delivery_ids: &[String]) -> Result<(), TransportError> {
        if delivery_ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.connect()?;
        let _: u64 = redis::cmd("XACK")
            .arg(&self.stream_key)
            .arg(&self.group)
            .arg(delivery_ids)
            .query(&mut conn)
            .map_err(|e| TransportError::Connection(format!("XACK failed: {e}")))?;
        Ok(())
    }
}
