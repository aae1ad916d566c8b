//! In-memory event repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use ticketmint_core::{CoreError, EventId, EventRecord, EventRepository, Result};

/// In-memory [`EventRepository`] for tests.
#[derive(Clone, Default)]
pub struct InMemoryEventRepository {
    events: Arc<Mutex<HashMap<EventId, EventRecord>>>,
}

impl InMemoryEventRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn get(&self, event_id: EventId) -> Result<EventRecord> {
        self.events
            .lock()
            .map_err(|_| CoreError::Persistence("lock poisoned".to_string()))?
            .get(&event_id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Event", event_id))
    }

    async fn insert(&self, event: &EventRecord) -> Result<()> {
        let mut events = self
            .events
            .lock()
            .map_err(|_| CoreError::Persistence("lock poisoned".to_string()))?;

        if events.contains_key(&event.event_id) {
            return Err(CoreError::Conflict(format!(
                "event {} already exists",
                event.event_id
            )));
        }

        events.insert(event.event_id, event.clone());
        Ok(())
    }
}
