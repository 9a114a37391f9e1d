// src/transaction.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TrailError;
use crate::identity::Party;
use crate::ordering::OrderingContext;
use crate::state::AssetEvent;

/// A verified transaction, frozen into the trail.
///
/// Records are immutable once built; the hosting platform persists them
/// as part of its history and distributes each one to the union of its
/// events' participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    id: Uuid,
    events: Vec<AssetEvent>,
    ordering: Vec<OrderingContext>,
    recorded_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(events: Vec<AssetEvent>, ordering: Vec<OrderingContext>) -> Self {
        Self {
            id: Uuid::now_v7(),
            events,
            ordering,
            recorded_at: Utc::now(),
        }
    }

    /// Rehydrate a record from stored parts.
    pub(crate) fn from_parts(
        id: Uuid,
        events: Vec<AssetEvent>,
        ordering: Vec<OrderingContext>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            events,
            ordering,
            recorded_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn events(&self) -> &[AssetEvent] {
        &self.events
    }

    pub fn ordering(&self) -> &[OrderingContext] {
        &self.ordering
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Identities this record is distributed to: the union of the events'
    /// participant lists, de-duplicated, first-seen order.
    pub fn participants(&self) -> Vec<&Party> {
        let mut seen = Vec::new();
        for event in &self.events {
            for party in event.participants() {
                if !seen.contains(&party) {
                    seen.push(party);
                }
            }
        }
        seen
    }
}

/// Ordering contexts in a record must advance each (topic, author) stream
/// by consecutive nonces.
pub(crate) fn check_ordering(record: &TransactionRecord) -> Result<(), TrailError> {
    use std::collections::HashMap;
    let mut last: HashMap<(&str, &Party), u64> = HashMap::new();

    for ctx in record.ordering() {
        let key = (ctx.topic(), ctx.author());
        if let Some(prev) = last.get(&key) {
            if ctx.nonce() != prev + 1 {
                return Err(TrailError::NonceGap {
                    topic: ctx.topic().to_string(),
                    expected: prev + 1,
                    found: ctx.nonce(),
                });
            }
        }
        last.insert(key, ctx.nonce());
    }

    Ok(())
}

/// The stored shape of one event: the event plus where and when it was
/// recorded. `event_id` is the event's natural identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    event_id: String,
    record_id: Uuid,
    event: AssetEvent,
    recorded_at: DateTime<Utc>,
}

impl RecordedEvent {
    pub fn new(record: &TransactionRecord, event: AssetEvent) -> Self {
        Self {
            event_id: event.natural_id(),
            record_id: record.id(),
            event,
            recorded_at: record.recorded_at(),
        }
    }

    pub(crate) fn from_parts(
        event_id: String,
        record_id: Uuid,
        event: AssetEvent,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id,
            record_id,
            event,
            recorded_at,
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn record_id(&self) -> Uuid {
        self.record_id
    }

    pub fn event(&self) -> &AssetEvent {
        &self.event
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AssetDefinitionCreated, AssetInstanceCreated};

    fn creation(instance: &str, author: &Party) -> AssetEvent {
        AssetEvent::InstanceCreated(AssetInstanceCreated::new(
            instance,
            "AD-9",
            author.clone(),
            "sha256:abcd",
        ))
    }

    #[test]
    fn test_participants_union_dedups_in_first_seen_order() {
        let alice = Party::new("Alice");
        let bob = Party::new("Bob");

        let record = TransactionRecord::new(
            vec![
                creation("AI-1", &alice),
                creation("AI-2", &bob),
                creation("AI-3", &alice),
            ],
            vec![],
        );

        assert_eq!(record.participants(), vec![&alice, &bob]);
    }

    #[test]
    fn test_record_round_trip() {
        let alice = Party::new("Alice");
        let event = AssetEvent::DefinitionCreated(AssetDefinitionCreated::new(
            "AD-9",
            alice.clone(),
            "blake3:1111",
        ));
        let ordering = vec![OrderingContext::new("AD-9", alice.clone())];

        let record = TransactionRecord::new(vec![event.clone()], ordering.clone());
        assert_eq!(record.events(), &[event.clone()]);
        assert_eq!(record.ordering(), ordering.as_slice());

        let recorded = RecordedEvent::new(&record, event.clone());
        assert_eq!(recorded.event_id(), "AD-9");
        assert_eq!(recorded.record_id(), record.id());
        assert_eq!(recorded.event(), &event);
        assert_eq!(recorded.recorded_at(), record.recorded_at());
    }

    #[test]
    fn test_check_ordering_accepts_consecutive_nonces() {
        let alice = Party::new("Alice");
        let record = TransactionRecord::new(
            vec![creation("AI-1", &alice), creation("AI-2", &alice)],
            vec![
                OrderingContext::with_nonce("AD-9", alice.clone(), 4),
                OrderingContext::with_nonce("AD-9", alice.clone(), 5),
            ],
        );

        assert!(check_ordering(&record).is_ok());
    }

    #[test]
    fn test_check_ordering_rejects_gaps() {
        let alice = Party::new("Alice");
        let record = TransactionRecord::new(
            vec![creation("AI-1", &alice), creation("AI-2", &alice)],
            vec![
                OrderingContext::with_nonce("AD-9", alice.clone(), 4),
                OrderingContext::with_nonce("AD-9", alice.clone(), 6),
            ],
        );

        assert!(matches!(
            check_ordering(&record),
            Err(TrailError::NonceGap {
                expected: 5,
                found: 6,
                ..
            })
        ));
    }

    #[test]
    fn test_check_ordering_separates_streams() {
        let alice = Party::new("Alice");
        let bob = Party::new("Bob");
        let record = TransactionRecord::new(
            vec![],
            vec![
                OrderingContext::with_nonce("AD-9", alice.clone(), 4),
                OrderingContext::with_nonce("AD-9", bob.clone(), 0),
                OrderingContext::with_nonce("AD-8", alice.clone(), 7),
            ],
        );

        assert!(check_ordering(&record).is_ok());
    }
}
