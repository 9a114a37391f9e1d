// src/adapters/memory.rs
use crate::transaction::check_ordering;
use crate::{EventStore, OrderingContext, Party, RecordedEvent, TrailError, TransactionRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Clone)]
struct MemoryStore {
    records: Arc<Mutex<HashMap<Uuid, TransactionRecord>>>,
    // Natural event id → every recording of it, append order.
    events: Arc<Mutex<HashMap<String, Vec<RecordedEvent>>>>,
    nonces: Arc<Mutex<HashMap<(String, Party), OrderingContext>>>,
}

impl MemoryStore {
    fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            events: Arc::new(Mutex::new(HashMap::new())),
            nonces: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

pub struct MemoryAdapter {
    store: MemoryStore,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
        }
    }

    fn all_events_sorted(&self) -> Vec<RecordedEvent> {
        let events = self.store.events.lock().unwrap();
        let mut all: Vec<RecordedEvent> = events.values().flatten().cloned().collect();
        all.sort_by_key(|e| e.recorded_at());
        all
    }
}

#[async_trait]
impl EventStore for MemoryAdapter {
    async fn record(&self, record: &TransactionRecord) -> Result<(), TrailError> {
        check_ordering(record)?;

        let mut events = self.store.events.lock().unwrap();

        // Validate the whole record before touching the store.
        let mut ids_in_record = HashSet::new();
        for event in record.events() {
            if !event.kind().is_unique() {
                continue;
            }
            let id = event.natural_id();
            if events.contains_key(&id) || !ids_in_record.insert(id.clone()) {
                return Err(TrailError::DuplicateEvent(id));
            }
        }

        for event in record.events() {
            let recorded = RecordedEvent::new(record, event.clone());
            events
                .entry(recorded.event_id().to_string())
                .or_default()
                .push(recorded);
        }

        let mut records = self.store.records.lock().unwrap();
        records.insert(record.id(), record.clone());

        Ok(())
    }

    async fn get_event(&self, event_id: &str) -> Result<RecordedEvent, TrailError> {
        let events = self.store.events.lock().unwrap();
        events
            .get(event_id)
            .and_then(|recordings| recordings.last())
            .cloned()
            .ok_or_else(|| TrailError::EventNotFound(event_id.to_string()))
    }

    async fn get_record(&self, record_id: Uuid) -> Result<TransactionRecord, TrailError> {
        let records = self.store.records.lock().unwrap();
        records
            .get(&record_id)
            .cloned()
            .ok_or(TrailError::RecordNotFound(record_id))
    }

    async fn events_for_author(&self, author: &Party) -> Result<Vec<RecordedEvent>, TrailError> {
        Ok(self
            .all_events_sorted()
            .into_iter()
            .filter(|e| e.event().author() == author)
            .collect())
    }

    async fn events_for_participant(
        &self,
        party: &Party,
    ) -> Result<Vec<RecordedEvent>, TrailError> {
        Ok(self
            .all_events_sorted()
            .into_iter()
            .filter(|e| e.event().participants().contains(&party))
            .collect())
    }

    async fn events_between(
        &self,
        timespan: &[DateTime<Utc>; 2],
    ) -> Result<Vec<RecordedEvent>, TrailError> {
        Ok(self
            .all_events_sorted()
            .into_iter()
            .filter(|e| e.recorded_at() >= timespan[0] && e.recorded_at() <= timespan[1])
            .collect())
    }

    async fn next_nonce(&self, topic: &str, author: &Party) -> Result<u64, TrailError> {
        let mut nonces = self.store.nonces.lock().unwrap();
        let ctx = nonces
            .entry((topic.to_string(), author.clone()))
            .and_modify(|c| *c = c.advanced())
            .or_insert_with(|| OrderingContext::new(topic, author.clone()));
        Ok(ctx.nonce())
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}
