//! Event bus seam.
//!
//! The dispatcher hands `(name, payload)` pairs to an [`EventBus`]; ordering,
//! delivery and backpressure are the bus's concern. [`MemoryEventBus`]
//! records everything it receives and is used by tests and the CLI.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::BusError;

/// One event as handed to the bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedEvent {
    pub name: String,
    pub payload: Value,
}

#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish one event. Fire-and-forget from the caller's side.
    async fn publish(&self, name: &str, payload: Value) -> Result<(), BusError>;
}

/// In-process bus that keeps every published event in order.
#[derive(Debug, Default)]
pub struct MemoryEventBus {
    events: RwLock<Vec<PublishedEvent>>,
    closed: AtomicBool,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far.
    pub async fn events(&self) -> Vec<PublishedEvent> {
        self.events.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    /// Reject every later publish with [`BusError::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, name: &str, payload: Value) -> Result<(), BusError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }
        self.events.write().await.push(PublishedEvent {
            name: name.to_string(),
            payload,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn records_events_in_order() {
        let bus = MemoryEventBus::new();
        bus.publish("github.a.x", json!({"n": 1})).await.unwrap();
        bus.publish("github.b.y", Value::Null).await.unwrap();

        let events = bus.events().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "github.a.x");
        assert_eq!(events[1].payload, Value::Null);
    }

    #[tokio::test]
    async fn closed_bus_rejects_publish() {
        let bus = MemoryEventBus::new();
        bus.close();
        let err = bus.publish("github.a.x", json!({})).await.unwrap_err();
        assert!(matches!(err, BusError::Closed));
        assert!(bus.is_empty().await);
    }
}
