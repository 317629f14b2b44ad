//! Inbound message sink
//!
//! The broker pushes messages to the callback address fire-and-forget. The
//! sink accepts them synchronously, logs them and keeps the most recent ones
//! until a client drains them.

use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::{info, warn};

use crate::models::Packet;

/// Receiver of messages pushed by the broker
pub trait MessageSink: Send + Sync {
    fn accept(&self, packet: Packet);
}

/// Bounded in-memory queue of received messages
///
/// When full the oldest message is dropped to make room.
pub struct MessageQueue {
    messages: Mutex<VecDeque<Packet>>,
    capacity: usize,
}

impl MessageQueue {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    /// Take every queued message, oldest first
    pub fn drain(&self) -> Vec<Packet> {
        self.messages.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl MessageSink for MessageQueue {
    fn accept(&self, packet: Packet) {
        info!(
            topic = %packet.topic,
            publisher_id = ?packet.pid,
            timestamp = ?packet.timestamp,
            message = %packet.message,
            "Received message"
        );

        let mut messages = self.messages.lock();
        if messages.len() >= self.capacity {
            if let Some(dropped) = messages.pop_front() {
                warn!(
                    topic = %dropped.topic,
                    capacity = self.capacity,
                    "Message queue full, dropping oldest message"
                );
            }
        }
        messages.push_back(packet);
    }
}
