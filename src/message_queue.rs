//! Background job queue seam.
//!
//! The request path only publishes; a worker task drains topics and runs the
//! jobs. The in-memory implementation is the default; a broker-backed one can
//! be slotted in behind the same trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

/// Message queue errors
#[derive(Error, Debug)]
pub enum MessageQueueError {
    #[error("Queue is full")]
    QueueFull,
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Envelope for queued jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub topic: String,
    pub payload: serde_json::Value,
    pub enqueued_at: chrono::DateTime<chrono::Utc>,
}

impl Message {
    pub fn new(topic: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            payload,
            enqueued_at: chrono::Utc::now(),
        }
    }

    /// Wraps a serializable job payload into an envelope.
    pub fn job<T: Serialize>(topic: &str, job: &T) -> Result<Self, MessageQueueError> {
        let payload = serde_json::to_value(job)
            .map_err(|e| MessageQueueError::SerializationError(e.to_string()))?;
        Ok(Self::new(topic, payload))
    }

    /// Decodes the payload back into a job type.
    pub fn decode<T: for<'de> Deserialize<'de>>(&self) -> Result<T, MessageQueueError> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| MessageQueueError::SerializationError(e.to_string()))
    }
}

/// Queue abstraction used by handlers (publish) and the worker (subscribe).
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn publish(&self, message: Message) -> Result<(), MessageQueueError>;
    async fn subscribe(&self, topic: &str) -> Result<Option<Message>, MessageQueueError>;
    async fn ack(&self, message_id: &Uuid) -> Result<(), MessageQueueError>;
    async fn nack(&self, message_id: &Uuid) -> Result<(), MessageQueueError>;
}

/// In-memory, in-process queue with bounded per-topic depth.
#[derive(Debug)]
pub struct InMemoryMessageQueue {
    queues: Arc<Mutex<HashMap<String, VecDeque<Message>>>>,
    max_size: usize,
}

impl InMemoryMessageQueue {
    pub fn new() -> Self {
        Self::with_max_size(1000)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            max_size,
        }
    }

    /// Number of undelivered messages on a topic. Used by tests.
    pub fn depth(&self, topic: &str) -> usize {
        self.queues
            .lock()
            .unwrap()
            .get(topic)
            .map(VecDeque::len)
            .unwrap_or(0)
    }
}

impl Default for InMemoryMessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageQueue for InMemoryMessageQueue {
    async fn publish(&self, message: Message) -> Result<(), MessageQueueError> {
        let mut queues = self.queues.lock().unwrap();
        let queue = queues.entry(message.topic.clone()).or_default();

        if queue.len() >= self.max_size {
            return Err(MessageQueueError::QueueFull);
        }

        queue.push_back(message);
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Option<Message>, MessageQueueError> {
        let mut queues = self.queues.lock().unwrap();
        Ok(queues.get_mut(topic).and_then(VecDeque::pop_front))
    }

    async fn ack(&self, _message_id: &Uuid) -> Result<(), MessageQueueError> {
        // Delivery in the in-memory queue is pop-based; nothing to ack.
        Ok(())
    }

    async fn nack(&self, _message_id: &Uuid) -> Result<(), MessageQueueError> {
        // At-most-once: a failed job is logged by the worker, not requeued.
        Ok(())
    }
}
